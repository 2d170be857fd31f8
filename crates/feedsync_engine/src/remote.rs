//! Remote feed service abstraction.

use crate::error::Fault;
use async_trait::async_trait;
use feedsync_protocol::{ApiResponse, FeedItem, ItemId};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Result of a remote call: a decoded response, or a fault raised before one
/// could be produced.
pub type RemoteResult<T> = Result<ApiResponse<T>, Fault>;

/// The remote feed service.
///
/// This trait abstracts the network layer so the engine has no hidden global
/// client and can run against HTTP, a loopback server, or a mock.
///
/// A non-success status is returned as an [`ApiResponse`], not as a fault.
/// Connectivity failures are returned as [`Fault::Io`].
#[async_trait]
pub trait RemoteFeed: Send + Sync {
    /// Fetches every item.
    async fn fetch_all(&self) -> RemoteResult<Vec<FeedItem>>;

    /// Fetches the items newer than `id`.
    async fn fetch_newer_than(&self, id: ItemId) -> RemoteResult<Vec<FeedItem>>;

    /// Creates or updates an item and returns the stored version.
    async fn save(&self, item: &FeedItem) -> RemoteResult<FeedItem>;

    /// Deletes an item.
    async fn delete_by_id(&self, id: ItemId) -> RemoteResult<()>;

    /// Likes an item and returns the updated version.
    async fn like(&self, id: ItemId) -> RemoteResult<FeedItem>;

    /// Removes the like from an item and returns the updated version.
    async fn unlike(&self, id: ItemId) -> RemoteResult<FeedItem>;
}

/// A call received by [`MockRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// `fetch_all`.
    FetchAll,
    /// `fetch_newer_than`.
    FetchNewerThan(ItemId),
    /// `save`.
    Save(FeedItem),
    /// `delete_by_id`.
    DeleteById(ItemId),
    /// `like`.
    Like(ItemId),
    /// `unlike`.
    Unlike(ItemId),
}

/// Scripted outcome of a mock call.
#[derive(Debug, Clone)]
pub enum MockReply<T> {
    /// Answer with this response.
    Respond(ApiResponse<T>),
    /// Fail with a connectivity error.
    Disconnect,
    /// Fail with an uncategorized fault.
    Fail(String),
}

impl<T> MockReply<T> {
    /// A `200 OK` reply carrying `body`.
    pub fn ok(body: T) -> Self {
        Self::Respond(ApiResponse::ok(body))
    }

    /// A reply with the given status and no body.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::Respond(ApiResponse::status(code, message))
    }
}

#[derive(Debug)]
struct Script<T> {
    queue: VecDeque<MockReply<T>>,
    fallback: Option<MockReply<T>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            fallback: None,
        }
    }
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Option<MockReply<T>> {
        self.queue.pop_front().or_else(|| self.fallback.clone())
    }
}

/// A scripted remote for testing.
///
/// Each operation answers from its own queue of replies, then falls back to
/// a default reply. An operation with nothing scripted fails with
/// [`Fault::Other`]. Every call is recorded.
#[derive(Debug, Default)]
pub struct MockRemote {
    disconnected: AtomicBool,
    latency: Mutex<Option<Duration>>,
    fetch_all: Mutex<Script<Vec<FeedItem>>>,
    fetch_newer: Mutex<Script<Vec<FeedItem>>>,
    save: Mutex<Script<FeedItem>>,
    delete: Mutex<Script<()>>,
    like: Mutex<Script<FeedItem>>,
    unlike: Mutex<Script<FeedItem>>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl MockRemote {
    /// Creates a new mock remote with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with a connectivity error.
    pub fn set_disconnected(&self, disconnected: bool) {
        self.disconnected.store(disconnected, Ordering::SeqCst);
    }

    /// Delays every answer by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Queues a reply for `fetch_all`.
    pub fn push_fetch_all(&self, reply: MockReply<Vec<FeedItem>>) {
        self.fetch_all.lock().queue.push_back(reply);
    }

    /// Sets the default reply for `fetch_all`.
    pub fn set_fetch_all(&self, reply: MockReply<Vec<FeedItem>>) {
        self.fetch_all.lock().fallback = Some(reply);
    }

    /// Queues a reply for `fetch_newer_than`.
    pub fn push_fetch_newer(&self, reply: MockReply<Vec<FeedItem>>) {
        self.fetch_newer.lock().queue.push_back(reply);
    }

    /// Sets the default reply for `fetch_newer_than`.
    pub fn set_fetch_newer(&self, reply: MockReply<Vec<FeedItem>>) {
        self.fetch_newer.lock().fallback = Some(reply);
    }

    /// Queues a reply for `save`.
    pub fn push_save(&self, reply: MockReply<FeedItem>) {
        self.save.lock().queue.push_back(reply);
    }

    /// Sets the default reply for `delete_by_id`.
    pub fn set_delete(&self, reply: MockReply<()>) {
        self.delete.lock().fallback = Some(reply);
    }

    /// Sets the default reply for `like`.
    pub fn set_like(&self, reply: MockReply<FeedItem>) {
        self.like.lock().fallback = Some(reply);
    }

    /// Sets the default reply for `unlike`.
    pub fn set_unlike(&self, reply: MockReply<FeedItem>) {
        self.unlike.lock().fallback = Some(reply);
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    async fn answer<T: Clone>(
        &self,
        call: RemoteCall,
        script: &Mutex<Script<T>>,
    ) -> RemoteResult<T> {
        let name = format!("{call:?}");
        self.calls.lock().push(call);

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.disconnected.load(Ordering::SeqCst) {
            return Err(Fault::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "mock remote disconnected",
            )));
        }

        let reply = script.lock().next();
        match reply {
            Some(MockReply::Respond(response)) => Ok(response),
            Some(MockReply::Disconnect) => Err(Fault::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "mock connection reset",
            ))),
            Some(MockReply::Fail(message)) => Err(Fault::Other(message)),
            None => Err(Fault::Other(format!("no mock reply set for {name}"))),
        }
    }
}

#[async_trait]
impl RemoteFeed for MockRemote {
    async fn fetch_all(&self) -> RemoteResult<Vec<FeedItem>> {
        self.answer(RemoteCall::FetchAll, &self.fetch_all).await
    }

    async fn fetch_newer_than(&self, id: ItemId) -> RemoteResult<Vec<FeedItem>> {
        self.answer(RemoteCall::FetchNewerThan(id), &self.fetch_newer)
            .await
    }

    async fn save(&self, item: &FeedItem) -> RemoteResult<FeedItem> {
        self.answer(RemoteCall::Save(item.clone()), &self.save).await
    }

    async fn delete_by_id(&self, id: ItemId) -> RemoteResult<()> {
        self.answer(RemoteCall::DeleteById(id), &self.delete).await
    }

    async fn like(&self, id: ItemId) -> RemoteResult<FeedItem> {
        self.answer(RemoteCall::Like(id), &self.like).await
    }

    async fn unlike(&self, id: ItemId) -> RemoteResult<FeedItem> {
        self.answer(RemoteCall::Unlike(id), &self.unlike).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_remote_queue_then_fallback() {
        let remote = MockRemote::new();
        remote.push_fetch_all(MockReply::status(500, "Internal Server Error"));
        remote.set_fetch_all(MockReply::ok(vec![]));

        let first = remote.fetch_all().await.unwrap();
        assert_eq!(first.code, 500);

        let second = remote.fetch_all().await.unwrap();
        assert!(second.is_success());
        let third = remote.fetch_all().await.unwrap();
        assert!(third.is_success());

        assert_eq!(remote.calls().len(), 3);
    }

    #[tokio::test]
    async fn mock_remote_not_scripted() {
        let remote = MockRemote::new();
        let result = remote.like(ItemId::new(1)).await;
        assert!(matches!(result, Err(Fault::Other(_))));
    }

    #[tokio::test]
    async fn mock_remote_disconnected() {
        let remote = MockRemote::new();
        remote.set_delete(MockReply::ok(()));
        remote.set_disconnected(true);

        let result = remote.delete_by_id(ItemId::new(1)).await;
        assert!(matches!(result, Err(Fault::Io(_))));

        remote.set_disconnected(false);
        assert!(remote.delete_by_id(ItemId::new(1)).await.is_ok());
        assert_eq!(
            remote.calls(),
            vec![
                RemoteCall::DeleteById(ItemId::new(1)),
                RemoteCall::DeleteById(ItemId::new(1))
            ]
        );
    }
}
