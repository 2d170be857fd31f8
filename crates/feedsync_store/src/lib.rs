//! # feedsync Store
//!
//! Local, keyed cache of feed items for feedsync.
//!
//! The store keeps at most one [`PersistedItem`] per [`ItemId`] and tags each
//! record with a visibility flag. Visible records form the read projection;
//! hidden records are staged deltas waiting for an explicit promotion.
//!
//! ## Design Principles
//!
//! - Writes are upserts keyed by identifier, last writer wins
//! - Promotion is one-way: hidden → visible
//! - Every applied mutation is announced on the [`ChangeFeed`]
//! - Stores must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and ephemeral caches
//! - [`FileStore`] - Snapshot-file backed cache that survives restarts
//!
//! ## Example
//!
//! ```rust
//! use feedsync_protocol::FeedItem;
//! use feedsync_store::{LocalStore, MemoryStore, PersistedItem};
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let store = MemoryStore::new();
//! let item = FeedItem::draft("Netology", "hello").with_id(1);
//! store.upsert(vec![PersistedItem::visible(item)]).await.unwrap();
//! assert_eq!(store.visible().await.unwrap().len(), 1);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change_feed;
mod error;
mod file;
mod item;
mod memory;
mod records;
mod store;

pub use change_feed::{ChangeEvent, ChangeFeed, ChangeKind, ChangeReceiver, SequenceWatch};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use item::PersistedItem;
pub use memory::MemoryStore;
pub use store::{watch_visible, LocalStore};
