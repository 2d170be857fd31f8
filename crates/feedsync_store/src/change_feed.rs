//! Change feed for observing applied store mutations.
//!
//! Every store emits an event after each mutation that actually changed
//! something, enabling:
//! - Diagnostics and logging, through per-event subscriptions
//! - The reactive visible-subset query ([`crate::watch_visible`]), through
//!   a coalescing sequence watch
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut changes = store.subscribe();
//! tokio::spawn(async move {
//!     while let Some(event) = changes.recv().await {
//!         println!("change: {:?}", event);
//!     }
//! });
//! ```

use feedsync_protocol::ItemId;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;

/// Receiving half of a change feed subscription.
pub type ChangeReceiver = UnboundedReceiver<ChangeEvent>;

/// Latest emitted sequence number. Holds one value however many events
/// were emitted since it was last read.
pub type SequenceWatch = watch::Receiver<u64>;

/// What a mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// Records were written by identifier.
    Upserted {
        /// Written identifiers.
        ids: Vec<ItemId>,
    },
    /// The visible subset was replaced by a full refresh.
    Refreshed {
        /// Written identifiers.
        ids: Vec<ItemId>,
        /// Visible identifiers dropped because the refresh no longer had them.
        removed: Vec<ItemId>,
    },
    /// Delta records were staged.
    Staged {
        /// Staged identifiers.
        ids: Vec<ItemId>,
    },
    /// Hidden records were made visible.
    Promoted {
        /// Number of promoted records.
        count: usize,
    },
    /// A record was deleted.
    Deleted {
        /// Deleted identifier.
        id: ItemId,
    },
}

/// A single change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Position of the mutation, strictly increasing per feed.
    pub sequence: u64,
    /// What changed.
    pub kind: ChangeKind,
}

/// Distributes applied mutations to subscribers.
///
/// The change feed:
/// - Emits only applied mutations
/// - Preserves mutation order
/// - Supports multiple subscribers
/// - Is thread-safe
#[derive(Debug)]
pub struct ChangeFeed {
    subscribers: RwLock<Vec<UnboundedSender<ChangeEvent>>>,
    sequence: AtomicU64,
    latest: watch::Sender<u64>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        let (latest, _) = watch::channel(0);
        Self {
            subscribers: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(0),
            latest,
        }
    }
}

impl ChangeFeed {
    /// Creates a new change feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to the change feed.
    ///
    /// The receiver gets every event emitted after this call.
    pub fn subscribe(&self) -> ChangeReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Watches the latest sequence number.
    ///
    /// Unlike [`ChangeFeed::subscribe`], a slow reader never accumulates a
    /// backlog: it only learns that something changed since it last looked.
    pub fn watch_sequence(&self) -> SequenceWatch {
        self.latest.subscribe()
    }

    /// Emits an event to all subscribers and returns its sequence number.
    ///
    /// Subscribers whose receiver was dropped are removed.
    pub fn emit(&self, kind: ChangeKind) -> u64 {
        let mut subscribers = self.subscribers.write();
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let event = ChangeEvent { sequence, kind };
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        self.latest.send_replace(sequence);
        sequence
    }

    /// Returns the sequence number of the last emitted event, 0 if none.
    pub fn latest_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_and_receive() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();

        let seq = feed.emit(ChangeKind::Deleted { id: ItemId::new(3) });
        assert_eq!(seq, 1);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.sequence, 1);
        assert_eq!(event.kind, ChangeKind::Deleted { id: ItemId::new(3) });
    }

    #[test]
    fn multiple_subscribers() {
        let feed = ChangeFeed::new();
        let mut rx1 = feed.subscribe();
        let mut rx2 = feed.subscribe();

        feed.emit(ChangeKind::Promoted { count: 2 });

        assert_eq!(rx1.try_recv().unwrap().kind, ChangeKind::Promoted { count: 2 });
        assert_eq!(rx2.try_recv().unwrap().kind, ChangeKind::Promoted { count: 2 });
    }

    #[test]
    fn subscriber_cleanup() {
        let feed = ChangeFeed::new();
        let rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        drop(rx);

        feed.emit(ChangeKind::Promoted { count: 1 });
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn sequence_is_monotonic() {
        let feed = ChangeFeed::new();
        assert_eq!(feed.latest_sequence(), 0);

        let mut rx = feed.subscribe();
        for i in 1..=5 {
            feed.emit(ChangeKind::Upserted {
                ids: vec![ItemId::new(i)],
            });
        }

        let mut last = 0;
        while let Ok(event) = rx.try_recv() {
            assert!(event.sequence > last);
            last = event.sequence;
        }
        assert_eq!(last, 5);
        assert_eq!(feed.latest_sequence(), 5);
    }

    #[test]
    fn sequence_watch_coalesces() {
        let feed = ChangeFeed::new();
        let mut latest = feed.watch_sequence();
        assert!(!latest.has_changed().unwrap());

        for count in 1..=100 {
            feed.emit(ChangeKind::Promoted { count });
        }

        assert!(latest.has_changed().unwrap());
        assert_eq!(*latest.borrow_and_update(), 100);
        assert!(!latest.has_changed().unwrap());
    }
}
