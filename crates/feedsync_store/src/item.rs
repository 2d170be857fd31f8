//! Persisted record shape.

use feedsync_protocol::{FeedItem, ItemId};
use serde::{Deserialize, Serialize};

/// A feed item as kept in the local store.
///
/// `hidden` records were fetched from the delta feed but are not yet part of
/// the read projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedItem {
    /// The stored item.
    pub item: FeedItem,
    /// Staged, not yet surfaced to readers.
    pub hidden: bool,
}

impl PersistedItem {
    /// Wraps an item as a visible record.
    pub fn visible(item: FeedItem) -> Self {
        Self {
            item,
            hidden: false,
        }
    }

    /// Wraps an item as a hidden (staged) record.
    pub fn hidden(item: FeedItem) -> Self {
        Self { item, hidden: true }
    }

    /// Returns the record's identifier.
    pub fn id(&self) -> ItemId {
        self.item.id
    }

    /// Drops the visibility flag, yielding the public shape.
    pub fn into_item(self) -> FeedItem {
        self.item
    }
}

impl From<PersistedItem> for FeedItem {
    fn from(record: PersistedItem) -> Self {
        record.into_item()
    }
}
