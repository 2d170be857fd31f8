//! Local store contract and the reactive visible-subset query.

use crate::change_feed::{ChangeReceiver, SequenceWatch};
use crate::error::StoreResult;
use crate::item::PersistedItem;
use async_trait::async_trait;
use feedsync_protocol::{FeedItem, ItemId};
use futures::Stream;
use std::sync::Arc;

/// A keyed, shared cache of feed items.
///
/// # Invariants
///
/// - At most one record per [`ItemId`]; writes are upserts, last writer wins
/// - `promote_all_hidden` is one-way and idempotent
/// - `stage` never hides a record that is already visible
/// - Every mutation that changed something is announced on the change feed
///   after it was applied
/// - Implementations must tolerate concurrent calls
///
/// # Implementors
///
/// - [`crate::MemoryStore`] - For testing
/// - [`crate::FileStore`] - For persistent caches
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Returns the visible records, newest first.
    async fn visible(&self) -> StoreResult<Vec<PersistedItem>>;

    /// Returns the hidden (staged) records, newest first.
    async fn hidden(&self) -> StoreResult<Vec<PersistedItem>>;

    /// Returns the record with the given identifier.
    async fn get(&self, id: ItemId) -> StoreResult<Option<PersistedItem>>;

    /// Returns the number of hidden records.
    async fn hidden_count(&self) -> StoreResult<usize>;

    /// Returns the total number of records.
    async fn count(&self) -> StoreResult<usize>;

    /// Writes records, replacing any record with the same identifier.
    async fn upsert(&self, items: Vec<PersistedItem>) -> StoreResult<()>;

    /// Writes `items` as visible and deletes every other visible record.
    ///
    /// Hidden records absent from `items` stay staged. Returns the number of
    /// visible records deleted. Applied as a single change.
    async fn replace_visible(&self, items: Vec<FeedItem>) -> StoreResult<usize>;

    /// Writes delta items as hidden.
    ///
    /// An identifier that is already visible stays visible and only takes
    /// the new fields. Returns how many of the staged identifiers are hidden
    /// afterwards.
    async fn stage(&self, items: Vec<FeedItem>) -> StoreResult<usize>;

    /// Makes every hidden record visible. Returns the number promoted.
    async fn promote_all_hidden(&self) -> StoreResult<usize>;

    /// Deletes the record with the given identifier. Returns true if it existed.
    async fn delete_by_id(&self, id: ItemId) -> StoreResult<bool>;

    /// Subscribes to change notifications.
    fn subscribe(&self) -> ChangeReceiver;

    /// Watches the sequence number of the latest change.
    fn watch_sequence(&self) -> SequenceWatch;
}

/// Observes the visible subset of a store.
///
/// Yields the current visible records immediately, then again after every
/// change that altered them. Changes made while the consumer is busy are
/// coalesced into a single re-query, so a slow consumer never builds up a
/// backlog. The stream never ends on its own; drop it to stop observing.
pub fn watch_visible<S>(store: Arc<S>) -> impl Stream<Item = StoreResult<Vec<PersistedItem>>> + Send
where
    S: LocalStore + ?Sized + 'static,
{
    async_stream::stream! {
        let mut changes = store.watch_sequence();
        let mut last: Option<Vec<PersistedItem>> = None;

        loop {
            changes.borrow_and_update();
            match store.visible().await {
                Ok(items) => {
                    if last.as_ref() != Some(&items) {
                        last = Some(items.clone());
                        yield Ok(items);
                    }
                }
                Err(e) => yield Err(e),
            }

            if changes.changed().await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use futures::StreamExt;
    use std::time::Duration;

    fn item(id: i64) -> FeedItem {
        FeedItem::draft("author", format!("item {id}")).with_id(id)
    }

    #[tokio::test]
    async fn emits_current_then_changes() {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert(vec![PersistedItem::visible(item(1))])
            .await
            .unwrap();

        let stream = watch_visible(Arc::clone(&store));
        futures::pin_mut!(stream);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        store
            .upsert(vec![PersistedItem::visible(item(2))])
            .await
            .unwrap();
        let second = stream.next().await.unwrap().unwrap();
        let ids: Vec<i64> = second.iter().map(|r| r.id().get()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn staging_does_not_reemit() {
        let store = Arc::new(MemoryStore::new());
        let stream = watch_visible(Arc::clone(&store));
        futures::pin_mut!(stream);

        assert!(stream.next().await.unwrap().unwrap().is_empty());

        store.stage(vec![item(5)]).await.unwrap();
        let pending = tokio::time::timeout(Duration::from_millis(50), stream.next()).await;
        assert!(pending.is_err(), "hidden records must not surface");

        store.promote_all_hidden().await.unwrap();
        let promoted = stream.next().await.unwrap().unwrap();
        assert_eq!(promoted.len(), 1);
        assert!(!promoted[0].hidden);
    }

    #[tokio::test]
    async fn busy_consumer_sees_one_requery() {
        let store = Arc::new(MemoryStore::new());
        let stream = watch_visible(Arc::clone(&store));
        futures::pin_mut!(stream);

        assert!(stream.next().await.unwrap().unwrap().is_empty());

        for id in 1..=50 {
            store
                .upsert(vec![PersistedItem::visible(item(id))])
                .await
                .unwrap();
        }

        let latest = stream.next().await.unwrap().unwrap();
        assert_eq!(latest.len(), 50);
        let pending = tokio::time::timeout(Duration::from_millis(50), stream.next()).await;
        assert!(pending.is_err(), "burst must collapse into one emission");
    }
}
