//! Ordered, fire-and-forget persistence of cart snapshots.
//!
//! Every committed cart is pushed onto an unbounded channel drained by a
//! single worker task. The worker writes snapshots in the order they were
//! enqueued, one at a time, so the last snapshot enqueued is the last one
//! written. A failed write is logged and counted, never retried; the
//! in-memory cart stays authoritative.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use marketplace_core::Cart;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::CartError;
use crate::storage::KeyValueStore;

/// Work item for the persist worker.
enum PersistMessage {
    /// Write this snapshot over the stored blob.
    Write { seq: u64, snapshot: Arc<Cart> },
    /// Acknowledge once everything queued before this message was attempted.
    Flush(oneshot::Sender<()>),
    /// Stop after everything queued before this message was attempted.
    Shutdown,
}

/// Diagnostic counters for the persist queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStats {
    /// Snapshots accepted onto the queue.
    pub enqueued: u64,
    /// Snapshots written to the store.
    pub written: u64,
    /// Snapshots that could not be encoded, written or enqueued.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PersistStats {
        PersistStats {
            enqueued: self.enqueued.load(Ordering::Acquire),
            written: self.written.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
        }
    }
}

/// Sending side of the persist queue.
#[derive(Debug)]
pub(crate) struct PersistQueue {
    tx: mpsc::UnboundedSender<PersistMessage>,
    counters: Arc<Counters>,
    next_seq: AtomicU64,
}

impl PersistQueue {
    /// Start the worker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub(crate) fn spawn<S: KeyValueStore>(
        store: Arc<S>,
        key: String,
        log_persist: bool,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());

        let worker = Worker {
            store,
            key,
            log_persist,
            counters: Arc::clone(&counters),
        };
        let handle = tokio::spawn(worker.run(rx));

        (
            Self {
                tx,
                counters,
                next_seq: AtomicU64::new(1),
            },
            handle,
        )
    }

    /// Queue `snapshot` for writing. Never blocks and never fails the caller.
    pub(crate) fn enqueue(&self, snapshot: Arc<Cart>) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::AcqRel);
        if self
            .tx
            .send(PersistMessage::Write { seq, snapshot })
            .is_ok()
        {
            self.counters.enqueued.fetch_add(1, Ordering::AcqRel);
        } else {
            self.counters.failed.fetch_add(1, Ordering::AcqRel);
            warn!(seq, "Persist worker stopped, dropping cart snapshot");
        }
        seq
    }

    /// Sequence number of the latest snapshot handed to [`Self::enqueue`], or 0.
    pub(crate) fn last_seq(&self) -> u64 {
        self.next_seq.load(Ordering::Acquire).saturating_sub(1)
    }

    /// Wait until every snapshot queued so far has been attempted.
    pub(crate) async fn flush(&self) -> Result<(), CartError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(PersistMessage::Flush(ack))
            .map_err(|_| CartError::WorkerStopped)?;
        done.await.map_err(|_| CartError::WorkerStopped)
    }

    /// Ask the worker to stop once the queue ahead of this call is drained.
    pub(crate) fn close(&self) {
        // nothing to stop if the worker is already gone
        let _ = self.tx.send(PersistMessage::Shutdown);
    }

    pub(crate) fn stats(&self) -> PersistStats {
        self.counters.snapshot()
    }
}

struct Worker<S> {
    store: Arc<S>,
    key: String,
    log_persist: bool,
    counters: Arc<Counters>,
}

impl<S: KeyValueStore> Worker<S> {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<PersistMessage>) {
        debug!(key = %self.key, "Persist worker started");

        while let Some(message) = rx.recv().await {
            match message {
                PersistMessage::Write { seq, snapshot } => self.write(seq, &snapshot).await,
                PersistMessage::Flush(ack) => {
                    let _ = ack.send(());
                }
                PersistMessage::Shutdown => break,
            }
        }

        let stats = self.counters.snapshot();
        debug!(
            written = stats.written,
            failed = stats.failed,
            "Persist worker stopped"
        );
    }

    async fn write(&self, seq: u64, snapshot: &Cart) {
        let result = match codec::encode(snapshot) {
            Ok(blob) => self.store.set(&self.key, blob).await.map_err(CartError::from),
            Err(e) => Err(CartError::from(e)),
        };

        match result {
            Ok(()) => {
                self.counters.written.fetch_add(1, Ordering::AcqRel);
                if self.log_persist {
                    info!(seq, items = snapshot.len(), "Persisted cart");
                } else {
                    debug!(seq, items = snapshot.len(), "Persisted cart");
                }
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::AcqRel);
                warn!(seq, error = %e, "Failed to persist cart");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_core::{Price, ProductId, ProductInput};

    use super::*;
    use crate::storage::MemoryStore;

    fn cart_with(ids: &[&str]) -> Arc<Cart> {
        let cart = ids.iter().fold(Cart::new(), |cart, id| {
            cart.with_added(ProductInput {
                id: ProductId::new(*id),
                title: (*id).to_owned(),
                image_url: String::new(),
                price: Price::ZERO,
            })
        });
        Arc::new(cart)
    }

    #[tokio::test]
    async fn test_last_enqueued_snapshot_wins() {
        let store = Arc::new(MemoryStore::new());
        let (queue, worker) = PersistQueue::spawn(Arc::clone(&store), "cart".to_owned(), false);

        queue.enqueue(cart_with(&["a"]));
        queue.enqueue(cart_with(&["a", "b"]));
        let last = cart_with(&["a", "b", "c"]);
        queue.enqueue(Arc::clone(&last));
        queue.flush().await.unwrap();

        let stored = codec::decode(&store.snapshot("cart").unwrap()).unwrap();
        assert_eq!(&stored, last.as_ref());
        assert_eq!(
            queue.stats(),
            PersistStats {
                enqueued: 3,
                written: 3,
                failed: 0
            }
        );

        queue.close();
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_enqueue_after_close_counts_failure() {
        let store = Arc::new(MemoryStore::new());
        let (queue, worker) = PersistQueue::spawn(store, "cart".to_owned(), false);

        queue.close();
        worker.await.unwrap();

        queue.enqueue(cart_with(&["a"]));
        assert_eq!(queue.stats().failed, 1);
        assert!(matches!(queue.flush().await, Err(CartError::WorkerStopped)));
    }

    #[tokio::test]
    async fn test_sequence_numbers_increase() {
        let (queue, _worker) = PersistQueue::spawn(Arc::new(MemoryStore::new()), "k".to_owned(), true);
        let first = queue.enqueue(cart_with(&[]));
        let second = queue.enqueue(cart_with(&[]));
        assert!(second > first);
    }
}
