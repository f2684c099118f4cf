use std::{
    collections::HashMap,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    task::{Context, Poll},
    time::Duration,
};

use futures::{stream::BoxStream, Stream};
use tokio::sync::watch;

use super::HistoryItem;
use crate::PersistenceError;

/// Live query over one owner's cloud history. Every item is the full
/// result set, newest first. Dropping the subscription unsubscribes.
pub struct HistorySubscription(BoxStream<'static, Vec<HistoryItem>>);

impl HistorySubscription {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Vec<HistoryItem>> + Send + 'static,
    {
        Self(Box::pin(stream))
    }
}

impl Stream for HistorySubscription {
    type Item = Vec<HistoryItem>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.0.as_mut().poll_next(cx)
    }
}

/// Remote per-owner collection of history documents.
#[async_trait::async_trait]
pub trait CloudHistory: Send + Sync {
    /// Store `item` in the owner's collection and return the assigned
    /// document id.
    async fn add(&self, owner: &str, item: HistoryItem) -> Result<String, PersistenceError>;

    /// Observe the owner's collection ordered by `createdAt` descending,
    /// truncated to `limit` items when given.
    async fn subscribe(
        &self,
        owner: &str,
        limit: Option<usize>,
    ) -> Result<HistorySubscription, PersistenceError>;
}

/// In-process [`CloudHistory`] with the same ordering and notification
/// behaviour as a document store.
#[derive(Default)]
pub struct MemoryCloudHistory {
    collections: Mutex<HashMap<String, watch::Sender<Vec<HistoryItem>>>>,
    fail_writes: AtomicBool,
    write_delay: Mutex<Duration>,
}

impl MemoryCloudHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `add` calls fail with [`PersistenceError::Remote`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay applied before each `add` completes.
    pub fn set_write_delay(&self, delay: Duration) {
        if let Ok(mut slot) = self.write_delay.lock() {
            *slot = delay;
        }
    }

    /// Documents currently stored for `owner`, newest first.
    #[must_use]
    pub fn documents(&self, owner: &str) -> Vec<HistoryItem> {
        self.with_collection(owner, |sender| sender.borrow().clone())
            .unwrap_or_default()
    }

    /// Number of live subscriptions on `owner`'s collection.
    #[must_use]
    pub fn subscriber_count(&self, owner: &str) -> usize {
        self.with_collection(owner, watch::Sender::receiver_count)
            .unwrap_or_default()
    }

    fn with_collection<R>(
        &self,
        owner: &str,
        f: impl FnOnce(&watch::Sender<Vec<HistoryItem>>) -> R,
    ) -> Result<R, PersistenceError> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| PersistenceError::Remote("cloud history poisoned".to_string()))?;
        let sender = collections
            .entry(owner.to_string())
            .or_insert_with(|| watch::Sender::new(Vec::new()));
        Ok(f(sender))
    }
}

#[async_trait::async_trait]
impl CloudHistory for MemoryCloudHistory {
    async fn add(&self, owner: &str, mut item: HistoryItem) -> Result<String, PersistenceError> {
        let delay = self
            .write_delay
            .lock()
            .map(|delay| *delay)
            .unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Remote(
                "cloud history is unavailable".to_string(),
            ));
        }

        let doc_id = uuid::Uuid::new_v4().to_string();
        item.id.clone_from(&doc_id);
        self.with_collection(owner, |sender| {
            sender.send_modify(|documents| {
                documents.push(item);
                documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            });
        })?;
        Ok(doc_id)
    }

    async fn subscribe(
        &self,
        owner: &str,
        limit: Option<usize>,
    ) -> Result<HistorySubscription, PersistenceError> {
        let mut receiver = self.with_collection(owner, watch::Sender::subscribe)?;

        Ok(HistorySubscription::from_stream(async_stream::stream! {
            loop {
                let mut snapshot = receiver.borrow_and_update().clone();
                if let Some(limit) = limit {
                    snapshot.truncate(limit);
                }
                yield snapshot;
                if receiver.changed().await.is_err() {
                    break;
                }
            }
        }))
    }
}
