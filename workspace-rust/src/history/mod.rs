//! Generation history: an anonymous local log, an authenticated cloud
//! collection, and the synchronizer that writes to and reads from them.

mod cloud;
mod item;
mod local;
mod sync;
mod view;

pub use cloud::{CloudHistory, HistorySubscription, MemoryCloudHistory};
pub use item::HistoryItem;
pub use local::{
    FileStorage, LocalHistory, LocalStorage, MemoryStorage, DEFAULT_LOCAL_HISTORY_CAP,
    LOCAL_HISTORY_KEY,
};
pub use sync::{HistorySource, HistorySynchronizer, IdentityChange, PersistReceipt};
pub use view::{HistoryView, PANEL_HISTORY_LIMIT};
