//! In-memory store for testing and ephemeral caches.

use crate::change_feed::{ChangeFeed, ChangeKind, ChangeReceiver, SequenceWatch};
use crate::error::StoreResult;
use crate::item::PersistedItem;
use crate::records::Records;
use crate::store::LocalStore;
use async_trait::async_trait;
use feedsync_protocol::{FeedItem, ItemId};
use parking_lot::RwLock;

/// An in-memory store.
///
/// This store keeps all records in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Caches that don't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across tasks behind an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
    feed: ChangeFeed,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with pre-existing records.
    #[must_use]
    pub fn with_items(items: Vec<PersistedItem>) -> Self {
        Self {
            records: RwLock::new(Records::from_items(items)),
            feed: ChangeFeed::new(),
        }
    }

    /// Returns a copy of all records, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PersistedItem> {
        self.records.read().all()
    }

    /// Returns the change feed.
    pub fn change_feed(&self) -> &ChangeFeed {
        &self.feed
    }

    fn announce(&self, change: Option<ChangeKind>) {
        if let Some(kind) = change {
            self.feed.emit(kind);
        }
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn visible(&self) -> StoreResult<Vec<PersistedItem>> {
        Ok(self.records.read().with_visibility(false))
    }

    async fn hidden(&self) -> StoreResult<Vec<PersistedItem>> {
        Ok(self.records.read().with_visibility(true))
    }

    async fn get(&self, id: ItemId) -> StoreResult<Option<PersistedItem>> {
        Ok(self.records.read().get(id))
    }

    async fn hidden_count(&self) -> StoreResult<usize> {
        Ok(self.records.read().hidden_count())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.records.read().len())
    }

    async fn upsert(&self, items: Vec<PersistedItem>) -> StoreResult<()> {
        let change = self.records.write().upsert(items);
        self.announce(change);
        Ok(())
    }

    async fn replace_visible(&self, items: Vec<FeedItem>) -> StoreResult<usize> {
        let (removed, change) = self.records.write().replace_visible(items);
        self.announce(change);
        Ok(removed)
    }

    async fn stage(&self, items: Vec<FeedItem>) -> StoreResult<usize> {
        let (hidden, change) = self.records.write().stage(items);
        self.announce(change);
        Ok(hidden)
    }

    async fn promote_all_hidden(&self) -> StoreResult<usize> {
        let (count, change) = self.records.write().promote_all_hidden();
        self.announce(change);
        Ok(count)
    }

    async fn delete_by_id(&self, id: ItemId) -> StoreResult<bool> {
        let change = self.records.write().delete(id);
        let existed = change.is_some();
        self.announce(change);
        Ok(existed)
    }

    fn subscribe(&self) -> ChangeReceiver {
        self.feed.subscribe()
    }

    fn watch_sequence(&self) -> SequenceWatch {
        self.feed.watch_sequence()
    }
}
