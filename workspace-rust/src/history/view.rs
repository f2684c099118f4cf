use std::sync::Arc;

use futures::StreamExt;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use super::{HistoryItem, HistorySource, HistorySynchronizer};

/// Items shown by the history panel.
pub const PANEL_HISTORY_LIMIT: usize = 5;

/// A live list of history items for whichever backend is current.
///
/// The view follows identity changes: it reads the local log while
/// anonymous and holds a cloud subscription while signed in, replacing the
/// whole list on every notification. Closing or dropping the view ends the
/// subscription.
pub struct HistoryView {
    items: watch::Receiver<Vec<HistoryItem>>,
    task: JoinHandle<()>,
}

impl HistoryView {
    /// Open a view showing at most `limit` items, or all of them.
    #[must_use]
    pub fn open(sync: Arc<HistorySynchronizer>, limit: Option<usize>) -> Self {
        let (sender, items) = watch::channel(Vec::new());
        let task = tokio::spawn(follow(sync, limit, sender));
        Self { items, task }
    }

    #[must_use]
    pub fn items(&self) -> Vec<HistoryItem> {
        self.items.borrow().clone()
    }

    /// Wait for the next list. Returns `false` once the view has stopped.
    pub async fn changed(&mut self) -> bool {
        self.items.changed().await.is_ok()
    }

    /// Wait until the list satisfies `predicate` and return it.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&[HistoryItem]) -> bool,
    ) -> Option<Vec<HistoryItem>> {
        self.items
            .wait_for(|items| predicate(items))
            .await
            .map(|items| items.clone())
            .ok()
    }

    pub fn close(self) {
        self.task.abort();
    }
}

impl Drop for HistoryView {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn follow(
    sync: Arc<HistorySynchronizer>,
    limit: Option<usize>,
    sender: watch::Sender<Vec<HistoryItem>>,
) {
    let mut identity = sync.identity_updates();
    loop {
        identity.mark_unchanged();
        let source = sync.source();
        debug!(?source, "history view source");

        match (source, sync.cloud()) {
            (HistorySource::Cloud { owner }, Some(cloud)) => {
                match cloud.subscribe(&owner, limit).await {
                    Ok(mut subscription) => loop {
                        tokio::select! {
                            snapshot = subscription.next() => match snapshot {
                                Some(items) => { sender.send_replace(items); }
                                None => {
                                    if identity.changed().await.is_err() {
                                        return;
                                    }
                                    break;
                                }
                            },
                            changed = identity.changed() => {
                                if changed.is_err() {
                                    return;
                                }
                                break;
                            }
                        }
                    },
                    Err(error) => {
                        warn!(%owner, %error, "failed to subscribe to cloud history");
                        if identity.changed().await.is_err() {
                            return;
                        }
                    }
                }
            }
            _ => {
                let mut revisions = sync.local().revisions();
                loop {
                    revisions.mark_unchanged();
                    match sync.local().read() {
                        Ok(mut items) => {
                            if let Some(limit) = limit {
                                items.truncate(limit);
                            }
                            sender.send_replace(items);
                        }
                        Err(error) => warn!(%error, "failed to read local history"),
                    }

                    tokio::select! {
                        changed = revisions.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                        changed = identity.changed() => {
                            if changed.is_err() {
                                return;
                            }
                            break;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{LocalHistory, MemoryCloudHistory};
    use std::time::Duration;
    use visionprompt_sdk::GenerationSettings;

    fn item(created_at: i64) -> HistoryItem {
        HistoryItem::from_generation(
            "",
            format!("idea {created_at}"),
            GenerationSettings::default(),
            "prompt",
            &[],
            created_at,
        )
    }

    #[tokio::test]
    async fn anonymous_view_tracks_local_writes_with_limit() {
        let sync = Arc::new(HistorySynchronizer::new(LocalHistory::in_memory(), None));
        let mut view = HistoryView::open(sync.clone(), Some(2));

        for n in 1..=3 {
            let _ = sync.persist(item(n));
        }
        let items = view
            .wait_for(|items| items.first().is_some_and(|i| i.created_at == 3))
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn view_switches_to_cloud_on_sign_in_and_back() {
        let cloud = Arc::new(MemoryCloudHistory::new());
        let sync = Arc::new(HistorySynchronizer::new(
            LocalHistory::in_memory(),
            Some(cloud.clone()),
        ));
        let _ = sync.persist(item(1));
        let mut view = HistoryView::open(sync.clone(), None);
        view.wait_for(|items| items.len() == 1).await.unwrap();

        sync.bind_identity(Some("user-1".to_string()));
        view.wait_for(<[HistoryItem]>::is_empty).await.unwrap();
        assert_eq!(cloud.subscriber_count("user-1"), 1);

        let receipt = sync.persist(item(2));
        receipt.cloud.unwrap().await.unwrap().unwrap();
        view.wait_for(|items| items.len() == 1 && items[0].created_at == 2)
            .await
            .unwrap();

        sync.bind_identity(None);
        view.wait_for(|items| items.len() == 2).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cloud.subscriber_count("user-1"), 0);
    }

    #[tokio::test]
    async fn dropping_view_tears_down_subscription() {
        let cloud = Arc::new(MemoryCloudHistory::new());
        let sync = Arc::new(HistorySynchronizer::new(
            LocalHistory::in_memory(),
            Some(cloud.clone()),
        ));
        sync.bind_identity(Some("user-1".to_string()));

        let view = HistoryView::open(sync, Some(PANEL_HISTORY_LIMIT));
        for _ in 0..50 {
            if cloud.subscriber_count("user-1") == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(cloud.subscriber_count("user-1"), 1);

        view.close();
        for _ in 0..50 {
            if cloud.subscriber_count("user-1") == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(cloud.subscriber_count("user-1"), 0);
    }
}
