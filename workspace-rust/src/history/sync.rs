use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};
use tracing::{info, warn};

use super::{CloudHistory, HistoryItem, LocalHistory};
use crate::PersistenceError;

/// Which backend history is currently read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistorySource {
    Local,
    Cloud { owner: String },
}

/// Result of binding a new identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityChange {
    pub previous: Option<String>,
    pub current: Option<String>,
    /// Local items that stay local after signing in. They are never copied
    /// into the cloud collection.
    pub unmigrated_local_items: usize,
}

/// Handles for one persisted generation.
pub struct PersistReceipt {
    /// Id under which the item was written locally.
    pub local_id: String,
    /// Outcome of the local write. A failure here is also logged.
    pub local: Result<(), PersistenceError>,
    /// The best-effort cloud write, when an identity is bound. Resolves to
    /// the document id.
    pub cloud: Option<JoinHandle<Result<String, PersistenceError>>>,
}

/// Persists completed generations to the local log and, when an identity
/// is bound, to the owner's cloud collection.
pub struct HistorySynchronizer {
    local: LocalHistory,
    cloud: Option<Arc<dyn CloudHistory>>,
    identity: watch::Sender<Option<String>>,
}

impl HistorySynchronizer {
    #[must_use]
    pub fn new(local: LocalHistory, cloud: Option<Arc<dyn CloudHistory>>) -> Self {
        Self {
            local,
            cloud,
            identity: watch::Sender::new(None),
        }
    }

    #[must_use]
    pub fn local(&self) -> &LocalHistory {
        &self.local
    }

    #[must_use]
    pub fn cloud(&self) -> Option<Arc<dyn CloudHistory>> {
        self.cloud.clone()
    }

    #[must_use]
    pub fn identity(&self) -> Option<String> {
        self.identity.borrow().clone()
    }

    #[must_use]
    pub fn identity_updates(&self) -> watch::Receiver<Option<String>> {
        self.identity.subscribe()
    }

    #[must_use]
    pub fn source(&self) -> HistorySource {
        match (self.identity(), &self.cloud) {
            (Some(owner), Some(_)) => HistorySource::Cloud { owner },
            _ => HistorySource::Local,
        }
    }

    /// Bind (`Some`) or clear (`None`) the user identity. Views re-subscribe
    /// on change.
    pub fn bind_identity(&self, identity: Option<String>) -> IdentityChange {
        let identity = identity
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let previous = self.identity.send_replace(identity.clone());

        let unmigrated_local_items = if previous.is_none() && identity.is_some() {
            let count = self.local.read().map(|items| items.len()).unwrap_or_default();
            if count > 0 {
                info!(count, "local history is not migrated to the cloud collection");
            }
            count
        } else {
            0
        };

        IdentityChange {
            previous,
            current: identity,
            unmigrated_local_items,
        }
    }

    /// Write `item` to the local log synchronously and start the cloud
    /// write in the background.
    ///
    /// The item's id is replaced with a fresh local id. Neither failure
    /// is returned as an error: the local outcome is in the receipt and
    /// the cloud outcome is in its task.
    #[must_use]
    pub fn persist(&self, mut item: HistoryItem) -> PersistReceipt {
        item.id = self.local.next_id(item.created_at);
        let local_id = item.id.clone();

        let cloud = match (self.identity(), &self.cloud) {
            (Some(owner), Some(cloud)) => {
                let cloud = cloud.clone();
                let item = item.clone();
                Some(tokio::spawn(async move {
                    let result = cloud.add(&owner, item).await;
                    if let Err(error) = &result {
                        warn!(%owner, %error, "failed to save to cloud history");
                    }
                    result
                }))
            }
            _ => None,
        };

        let local = self.local.prepend(item);
        if let Err(error) = &local {
            warn!(%error, "failed to save to local history");
        }

        PersistReceipt {
            local_id,
            local,
            cloud,
        }
    }
}
