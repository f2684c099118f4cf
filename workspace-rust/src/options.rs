use std::{path::PathBuf, sync::Arc};

use crate::{
    history::{
        CloudHistory, FileStorage, HistorySynchronizer, LocalHistory, LocalStorage, MemoryStorage,
        DEFAULT_LOCAL_HISTORY_CAP,
    },
    store::DEFAULT_GALLERY_CAP,
    PersistenceError,
};

/// Construction options for a workspace session.
#[derive(Clone)]
pub struct WorkspaceOptions {
    /// Directory for file-backed local history. `None` keeps history in
    /// memory.
    pub storage_dir: Option<PathBuf>,
    /// Maximum local history items; `None` is unbounded.
    pub local_history_cap: Option<usize>,
    /// Maximum images in one session's gallery.
    pub gallery_cap: usize,
    /// Backend for signed-in history.
    pub cloud: Option<Arc<dyn CloudHistory>>,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            storage_dir: None,
            local_history_cap: Some(DEFAULT_LOCAL_HISTORY_CAP),
            gallery_cap: DEFAULT_GALLERY_CAP,
            cloud: None,
        }
    }
}

impl WorkspaceOptions {
    pub(crate) fn build_history(&self) -> Result<HistorySynchronizer, PersistenceError> {
        let storage: Arc<dyn LocalStorage> = match &self.storage_dir {
            Some(dir) => Arc::new(FileStorage::new(dir.clone())?),
            None => Arc::new(MemoryStorage::new()),
        };
        Ok(HistorySynchronizer::new(
            LocalHistory::new(storage, self.local_history_cap),
            self.cloud.clone(),
        ))
    }
}
