//! The feed sync engine.

use crate::config::SyncConfig;
use crate::error::{AppError, AppResult, Fault};
use crate::remote::RemoteFeed;
use feedsync_protocol::{ApiResponse, FeedItem, ItemId};
use feedsync_store::{watch_visible, LocalStore, PersistedItem};
use futures::StreamExt;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

/// Continuously updated visible feed, newest first.
pub type FeedStream = ReceiverStream<Vec<FeedItem>>;

/// Counts of newer items, one per poll. Ends after the first error.
pub type NewerCountStream = ReceiverStream<AppResult<usize>>;

/// Statistics about engine operations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Items stored by full refreshes.
    pub items_fetched: u64,
    /// Items confirmed by `save`.
    pub items_saved: u64,
    /// Poll iterations that completed.
    pub polls_completed: u64,
    /// Delta items staged by polling.
    pub items_staged: u64,
    /// Records made visible by `show_all`.
    pub items_promoted: u64,
    /// Optimistic mutations whose remote call failed.
    pub optimistic_failures: u64,
    /// Last successful refresh.
    pub last_refresh: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Reconciles the local store with the remote feed service.
///
/// Reads are served from the store's visible records. Writes go to the
/// remote first (`save`) or mutate the store optimistically before the
/// remote call (`like`, `unlike`, `remove_by_id`). A background poll stages
/// newer items as hidden until [`SyncEngine::show_all`] is called.
///
/// Stream-returning operations spawn tokio tasks and must be called from
/// within a tokio runtime.
pub struct SyncEngine<R: RemoteFeed, S: LocalStore> {
    config: SyncConfig,
    remote: Arc<R>,
    store: Arc<S>,
    stats: Arc<RwLock<SyncStats>>,
}

impl<R, S> SyncEngine<R, S>
where
    R: RemoteFeed + 'static,
    S: LocalStore + 'static,
{
    /// Creates a new engine owning its remote and store.
    pub fn new(config: SyncConfig, remote: R, store: S) -> Self {
        Self::with_shared(config, Arc::new(remote), Arc::new(store))
    }

    /// Creates an engine over a remote and store shared with other owners.
    pub fn with_shared(config: SyncConfig, remote: Arc<R>, store: Arc<S>) -> Self {
        Self {
            config,
            remote,
            store,
            stats: Arc::new(RwLock::new(SyncStats::default())),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the remote.
    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Returns the local store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Channel capacity for the spawned streams, at least 1 even when the
    /// configuration was built by hand.
    fn channel_capacity(&self) -> usize {
        self.config.projection_buffer.max(1)
    }

    /// Observes the visible feed.
    ///
    /// Emits the current visible items right away and again whenever they
    /// change, whoever changed them. No network activity. Mapping runs on a
    /// spawned task; dropping the stream stops it.
    pub fn data(&self) -> FeedStream {
        let (tx, rx) = mpsc::channel(self.channel_capacity());
        let store = Arc::clone(&self.store);

        tokio::spawn(async move {
            let mut visible = Box::pin(watch_visible(store));
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    next = visible.next() => match next {
                        Some(Ok(records)) => {
                            let items = records.into_iter().map(PersistedItem::into_item).collect();
                            if tx.send(items).await.is_err() {
                                break;
                            }
                        }
                        Some(Err(e)) => warn!(error = %e, "visible feed query failed"),
                        None => break,
                    },
                }
            }
            debug!("read projection closed");
        });

        ReceiverStream::new(rx)
    }

    /// Replaces the local feed with the remote's full list.
    ///
    /// Every returned item is stored visible, overwriting records with the
    /// same id. With `prune_on_refresh`, visible records the remote no longer
    /// returns are deleted. Returns the number of items received.
    pub async fn get_all(&self) -> AppResult<usize> {
        match self.refresh().await {
            Ok(count) => {
                let mut stats = self.stats.write();
                stats.items_fetched += count as u64;
                stats.last_refresh = Some(Instant::now());
                Ok(count)
            }
            Err(fault) => Err(self.report(fault, "get_all")),
        }
    }

    async fn refresh(&self) -> Result<usize, Fault> {
        let items = body_of(self.remote.fetch_all().await?)?;
        let count = items.len();

        if self.config.prune_on_refresh {
            let removed = self.store.replace_visible(items).await?;
            debug!(count, removed, "refreshed feed");
        } else {
            let records = items.into_iter().map(PersistedItem::visible).collect();
            self.store.upsert(records).await?;
            debug!(count, "refreshed feed");
        }
        Ok(count)
    }

    /// Polls for items newer than `newest`.
    ///
    /// Every `poll_interval` the remote is asked for items newer than
    /// `newest`; they are staged hidden and their count is emitted. The
    /// cursor stays at `newest` for the life of the subscription. The first
    /// failure is emitted as an error and ends the stream. Dropping the
    /// stream cancels the loop, including a poll in flight.
    pub fn watch_newer_count(&self, newest: ItemId) -> NewerCountStream {
        let (tx, rx) = mpsc::channel(self.channel_capacity());
        let remote = Arc::clone(&self.remote);
        let store = Arc::clone(&self.store);
        let stats = Arc::clone(&self.stats);
        let interval = self.config.poll_interval;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                let outcome = tokio::select! {
                    _ = tx.closed() => break,
                    outcome = poll_newer(remote.as_ref(), store.as_ref(), newest) => outcome,
                };

                match outcome {
                    Ok((fetched, staged)) => {
                        {
                            let mut stats = stats.write();
                            stats.polls_completed += 1;
                            stats.items_staged += staged as u64;
                        }
                        debug!(%newest, fetched, staged, "poll completed");
                        if tx.send(Ok(fetched)).await.is_err() {
                            break;
                        }
                    }
                    Err(fault) => {
                        let err = AppError::classify(fault);
                        warn!(%newest, error = %err, "poll failed");
                        stats.write().last_error = Some(err.to_string());
                        let _ = tx.send(Err(err)).await;
                        break;
                    }
                }
            }
            debug!(%newest, "poll loop stopped");
        });

        ReceiverStream::new(rx)
    }

    /// Makes every staged item visible. Returns the number promoted.
    pub async fn show_all(&self) -> AppResult<usize> {
        match self.store.promote_all_hidden().await {
            Ok(count) => {
                self.stats.write().items_promoted += count as u64;
                info!(count, "promoted staged items");
                Ok(count)
            }
            Err(e) => Err(self.report(e.into(), "show_all")),
        }
    }

    /// Creates or updates an item remotely, then stores the remote's version.
    ///
    /// The store is only written after a successful response.
    pub async fn save(&self, item: FeedItem) -> AppResult<FeedItem> {
        match self.push_item(&item).await {
            Ok(saved) => {
                self.stats.write().items_saved += 1;
                Ok(saved)
            }
            Err(fault) => Err(self.report(fault, "save")),
        }
    }

    async fn push_item(&self, item: &FeedItem) -> Result<FeedItem, Fault> {
        let saved = body_of(self.remote.save(item).await?)?;
        self.store
            .upsert(vec![PersistedItem::visible(saved.clone())])
            .await?;
        debug!(id = %saved.id, "saved item");
        Ok(saved)
    }

    /// Likes `item`. Returns true if the remote call failed.
    ///
    /// The liked state is stored before the remote call and kept even if the
    /// call fails. A staged item stays staged; an item not cached yet is
    /// stored visible.
    pub async fn like(&self, item: &FeedItem) -> bool {
        self.set_liked(item, true).await
    }

    /// Removes the like from `item`. Returns true if the remote call failed.
    ///
    /// The unliked state is stored before the remote call and kept even if
    /// the call fails.
    pub async fn unlike(&self, item: &FeedItem) -> bool {
        self.set_liked(item, false).await
    }

    /// Likes or unlikes `item` depending on its current state.
    /// Returns true if the remote call failed.
    pub async fn toggle_like(&self, item: &FeedItem) -> bool {
        self.set_liked(item, !item.liked_by_me).await
    }

    async fn set_liked(&self, item: &FeedItem, liked: bool) -> bool {
        let outcome = self.apply_like(item, liked).await;
        self.had_error(outcome, if liked { "like" } else { "unlike" })
    }

    async fn apply_like(&self, item: &FeedItem, liked: bool) -> Result<(), Fault> {
        let hidden = self
            .store
            .get(item.id)
            .await?
            .is_some_and(|record| record.hidden);
        self.store
            .upsert(vec![PersistedItem {
                item: item.with_like(liked),
                hidden,
            }])
            .await?;

        let response = if liked {
            self.remote.like(item.id).await?
        } else {
            self.remote.unlike(item.id).await?
        };
        ensure_success(&response)
    }

    /// Deletes an item locally, then remotely. Returns true if anything failed.
    ///
    /// The local record is gone even if the remote call fails. If the local
    /// delete fails the remote is not called.
    pub async fn remove_by_id(&self, id: ItemId) -> bool {
        let outcome = self.apply_remove(id).await;
        self.had_error(outcome, "remove")
    }

    async fn apply_remove(&self, id: ItemId) -> Result<(), Fault> {
        self.store.delete_by_id(id).await?;
        let response = self.remote.delete_by_id(id).await?;
        ensure_success(&response)
    }

    /// Classifies and records a fault from an error-raising operation.
    fn report(&self, fault: Fault, operation: &str) -> AppError {
        let err = AppError::classify(fault);
        warn!(operation, error = %err, "operation failed");
        self.stats.write().last_error = Some(err.to_string());
        err
    }

    /// Collapses the outcome of an optimistic mutation into its error flag.
    fn had_error(&self, outcome: Result<(), Fault>, operation: &str) -> bool {
        match outcome {
            Ok(()) => false,
            Err(fault) => {
                warn!(operation, error = %fault, "optimistic change not confirmed by remote");
                let mut stats = self.stats.write();
                stats.optimistic_failures += 1;
                stats.last_error = Some(fault.to_string());
                true
            }
        }
    }
}

/// One poll iteration: fetch newer items and stage them.
///
/// Returns the number fetched and the number left hidden.
async fn poll_newer<R, S>(remote: &R, store: &S, newest: ItemId) -> Result<(usize, usize), Fault>
where
    R: RemoteFeed + ?Sized,
    S: LocalStore + ?Sized,
{
    let items = body_of(remote.fetch_newer_than(newest).await?)?;
    let fetched = items.len();
    let staged = store.stage(items).await?;
    Ok((fetched, staged))
}

/// Fails with [`AppError::Api`] on a non-success status.
fn ensure_success<T>(response: &ApiResponse<T>) -> Result<(), Fault> {
    if response.is_success() {
        Ok(())
    } else {
        Err(AppError::from_response(response).into())
    }
}

/// Extracts the payload of a successful response.
///
/// A non-success status, or a success without payload, fails with
/// [`AppError::Api`] carrying the response's code and message.
fn body_of<T>(response: ApiResponse<T>) -> Result<T, Fault> {
    ensure_success(&response)?;
    let ApiResponse {
        code,
        message,
        body,
    } = response;
    body.ok_or(Fault::App(AppError::Api { code, message }))
}
