//! Snapshot-file backed store for persistent caches.

use crate::change_feed::{ChangeFeed, ChangeKind, ChangeReceiver, SequenceWatch};
use crate::error::{StoreError, StoreResult};
use crate::item::PersistedItem;
use crate::records::Records;
use crate::store::LocalStore;
use async_trait::async_trait;
use feedsync_protocol::{FeedItem, ItemId};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Magic bytes at the start of every snapshot file.
const MAGIC: &[u8; 4] = b"FSNC";
/// Snapshot format version.
const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1;

/// A file-backed store.
///
/// Records live in memory and the full record set is written to a single
/// snapshot file after every mutation, so the cache survives restarts.
///
/// # Durability
///
/// Snapshots are written to a sibling temp file, synced, then renamed over
/// the previous snapshot. A crash leaves either the old or the new snapshot.
/// Snapshot writes are serialized; change events are emitted once the
/// snapshot is on disk.
///
/// # Example
///
/// ```no_run
/// use feedsync_store::{FileStore, LocalStore};
/// use std::path::Path;
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let store = FileStore::open(Path::new("cache/feed.bin")).unwrap();
/// let promoted = store.promote_all_hidden().await.unwrap();
/// # });
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    records: RwLock<Records>,
    write_lock: Mutex<()>,
    feed: ChangeFeed,
}

impl FileStore {
    /// Opens the snapshot at `path`, or starts empty if it does not exist.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// snapshot.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let records = if path.exists() {
            let bytes = std::fs::read(path)?;
            Records::from_items(decode_snapshot(&bytes)?)
        } else {
            Records::default()
        };
        debug!(path = %path.display(), records = records.len(), "opened file store");

        Ok(Self {
            path: path.to_path_buf(),
            records: RwLock::new(records),
            write_lock: Mutex::new(()),
            feed: ChangeFeed::new(),
        })
    }

    /// Returns the path to the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `mutate` to a copy of the records, persists the copy, then
    /// installs it and announces the change.
    ///
    /// The in-memory records are only replaced once the snapshot is on disk:
    /// a failed or cancelled write leaves the store unchanged.
    async fn mutate<T>(
        &self,
        mutate: impl FnOnce(&mut Records) -> (T, Option<ChangeKind>),
    ) -> StoreResult<T> {
        let _guard = self.write_lock.lock().await;

        let mut next = self.records.read().clone();
        let (value, change) = mutate(&mut next);

        if let Some(kind) = change {
            self.write_snapshot(&next.all()).await?;
            *self.records.write() = next;
            self.feed.emit(kind);
        }
        Ok(value)
    }

    async fn write_snapshot(&self, records: &[PersistedItem]) -> StoreResult<()> {
        let bytes = encode_snapshot(records)?;
        let tmp = temp_path(&self.path);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn encode_snapshot(records: &[PersistedItem]) -> StoreResult<Vec<u8>> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + records.len() * 64);
    bytes.extend_from_slice(MAGIC);
    bytes.push(FORMAT_VERSION);
    ciborium::into_writer(records, &mut bytes).map_err(|e| StoreError::Codec(e.to_string()))?;
    Ok(bytes)
}

fn decode_snapshot(bytes: &[u8]) -> StoreResult<Vec<PersistedItem>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(StoreError::Corrupted("missing snapshot header".into()));
    }
    let version = bytes[MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(StoreError::Corrupted(format!(
            "unsupported snapshot version {version}"
        )));
    }
    ciborium::from_reader(&bytes[HEADER_LEN..]).map_err(|e| StoreError::Codec(e.to_string()))
}

#[async_trait]
impl LocalStore for FileStore {
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
        self.mutate(|records| ((), records.upsert(items))).await
    }

    async fn replace_visible(&self, items: Vec<FeedItem>) -> StoreResult<usize> {
        self.mutate(|records| records.replace_visible(items)).await
    }

    async fn stage(&self, items: Vec<FeedItem>) -> StoreResult<usize> {
        self.mutate(|records| records.stage(items)).await
    }

    async fn promote_all_hidden(&self) -> StoreResult<usize> {
        self.mutate(|records| records.promote_all_hidden()).await
    }

    async fn delete_by_id(&self, id: ItemId) -> StoreResult<bool> {
        self.mutate(|records| {
            let change = records.delete(id);
            (change.is_some(), change)
        })
        .await
    }

    fn subscribe(&self) -> ChangeReceiver {
        self.feed.subscribe()
    }

    fn watch_sequence(&self) -> SequenceWatch {
        self.feed.watch_sequence()
    }
}
