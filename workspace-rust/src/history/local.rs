use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex,
    },
};

use tokio::sync::watch;
use tracing::{debug, warn};

use super::HistoryItem;
use crate::PersistenceError;

/// Namespaced key under which local history is stored.
pub const LOCAL_HISTORY_KEY: &str = "visionprompt_history";

pub const DEFAULT_LOCAL_HISTORY_CAP: usize = 200;

/// Synchronous string key-value storage.
pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Stores each key as `<dir>/<key>.json`. Writes go through a temporary
/// file and a rename so a reader never sees a half-written value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let values = self
            .values
            .lock()
            .map_err(|_| PersistenceError::Local("memory storage poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| PersistenceError::Local("memory storage poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Anonymous history: a newest-first JSON array under [`LOCAL_HISTORY_KEY`].
///
/// Every successful write bumps a revision observable through
/// [`LocalHistory::revisions`].
pub struct LocalHistory {
    storage: Arc<dyn LocalStorage>,
    cap: Option<usize>,
    last_id: AtomicI64,
    write_lock: Mutex<()>,
    revision: watch::Sender<u64>,
}

impl LocalHistory {
    /// `cap` bounds the number of stored items; `None` keeps everything.
    #[must_use]
    pub fn new(storage: Arc<dyn LocalStorage>, cap: Option<usize>) -> Self {
        Self {
            storage,
            cap,
            last_id: AtomicI64::new(0),
            write_lock: Mutex::new(()),
            revision: watch::Sender::new(0),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Some(DEFAULT_LOCAL_HISTORY_CAP))
    }

    /// Read the full log, newest first. A missing key reads as empty.
    pub fn read(&self) -> Result<Vec<HistoryItem>, PersistenceError> {
        match self.storage.get(LOCAL_HISTORY_KEY)? {
            None => Ok(Vec::new()),
            Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|error| PersistenceError::Corrupt(error.to_string())),
        }
    }

    /// Prepend `item` and drop the oldest entries beyond the cap.
    ///
    /// Stored content that does not parse is never overwritten: the write
    /// fails with [`PersistenceError::Corrupt`] and the log is left as is.
    pub fn prepend(&self, item: HistoryItem) -> Result<(), PersistenceError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| PersistenceError::Local("local history lock poisoned".to_string()))?;

        let existing = self.read().inspect_err(|error| {
            if let PersistenceError::Corrupt(reason) = error {
                warn!(%reason, "local history is unreadable; not writing over it");
            }
        })?;

        let mut items = Vec::with_capacity(existing.len() + 1);
        items.push(item);
        items.extend(existing);
        if let Some(cap) = self.cap {
            if items.len() > cap {
                debug!(dropped = items.len() - cap, cap, "trimming local history");
                items.truncate(cap);
            }
        }

        let raw = serde_json::to_string(&items)
            .map_err(|error| PersistenceError::Local(error.to_string()))?;
        self.storage.set(LOCAL_HISTORY_KEY, &raw)?;
        self.revision.send_modify(|revision| *revision += 1);
        Ok(())
    }

    /// Next local id: the current time in milliseconds, bumped past the
    /// previous id so ids stay unique and increasing.
    #[must_use]
    pub fn next_id(&self, now_ms: i64) -> String {
        let mut previous = self.last_id.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(previous + 1);
            match self.last_id.compare_exchange(
                previous,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate.to_string(),
                Err(actual) => previous = actual,
            }
        }
    }

    #[must_use]
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    #[must_use]
    pub fn cap(&self) -> Option<usize> {
        self.cap
    }
}
