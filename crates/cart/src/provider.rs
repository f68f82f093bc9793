//! Cart provider and the handles consumers use to reach it.
//!
//! A [`CartProvider`] is mounted once per process. It owns the cart state,
//! the persist worker, and the store. Consumers never look the cart up
//! ambiently; they are given a [`CartHandle`] explicitly, which only refers
//! to the provider weakly. Using a handle that is not bound to a live
//! provider panics with a descriptive message at the call site.

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use marketplace_core::{Cart, ProductId, ProductInput};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::codec;
use crate::config::CartConfig;
use crate::error::{CartError, OUTSIDE_PROVIDER};
use crate::persist::{PersistQueue, PersistStats};
use crate::storage::KeyValueStore;

/// State shared between the provider and its handles.
#[derive(Debug)]
struct Shared {
    state: watch::Sender<Arc<Cart>>,
    queue: PersistQueue,
    mounted: AtomicBool,
}

impl Shared {
    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Replace the cart with `transition(current)` and queue it for writing.
    ///
    /// The transition runs under the channel's write lock, so back-to-back
    /// commits always chain from the latest state and reach the persist
    /// queue in commit order. Watchers are notified once the lock is released.
    fn commit(&self, transition: impl FnOnce(&Cart) -> Cart) -> Arc<Cart> {
        let mut committed = None;
        self.state.send_modify(|current| {
            let next = Arc::new(transition(&**current));
            self.queue.enqueue(Arc::clone(&next));
            *current = Arc::clone(&next);
            committed = Some(next);
        });
        committed.unwrap_or_else(|| self.state.borrow().clone())
    }
}

/// The provider's own reference to [`Shared`].
///
/// Marks the state unmounted when dropped, so every handle and context
/// unbinds with the provider even while a context keeps `Shared` allocated.
#[derive(Debug)]
struct Mount(Arc<Shared>);

impl Deref for Mount {
    type Target = Shared;

    fn deref(&self) -> &Shared {
        &self.0
    }
}

impl Drop for Mount {
    fn drop(&mut self) {
        self.0.mounted.store(false, Ordering::Release);
    }
}

/// Owner of the cart state.
///
/// Hand [`CartHandle`]s out with [`CartProvider::handle`]. Dropping the
/// provider unbinds every handle; writes already queued still complete while
/// the runtime keeps running. Call [`CartProvider::shutdown`] to wait for them.
#[derive(Debug)]
pub struct CartProvider<S: KeyValueStore> {
    shared: Mount,
    store: Arc<S>,
    config: CartConfig,
    worker: JoinHandle<()>,
}

impl<S: KeyValueStore> CartProvider<S> {
    /// Start the persist worker and hydrate from `store`.
    ///
    /// Returns only after hydration, so no operation can observe the empty
    /// pre-hydration cart.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[instrument(skip_all, fields(key = %config.storage_key))]
    pub async fn mount(store: S, config: CartConfig) -> Self {
        let store = Arc::new(store);
        let (queue, worker) =
            PersistQueue::spawn(Arc::clone(&store), config.storage_key.clone(), config.log_persist);
        let (state, _) = watch::channel(Arc::new(Cart::new()));

        let provider = Self {
            shared: Mount(Arc::new(Shared {
                state,
                queue,
                mounted: AtomicBool::new(true),
            })),
            store,
            config,
            worker,
        };
        provider.hydrate().await;
        provider
    }

    /// Load the persisted cart into memory and notify watchers.
    ///
    /// A missing blob, an unreadable blob, or a failed read all leave an
    /// empty cart. Snapshots this provider already queued are flushed first,
    /// so the read sees its own writes. Hydration never writes.
    ///
    /// [`CartProvider::mount`] already hydrates. Calling this again is meant
    /// for re-reading a store changed by someone else. If a handle commits
    /// while the read is in flight, that commit wins and the stored blob is
    /// not loaded.
    #[instrument(skip(self), fields(key = %self.config.storage_key))]
    pub async fn hydrate(&self) {
        // a stopped worker has nothing left to flush
        let _ = self.shared.queue.flush().await;
        let seen = self.shared.queue.last_seq();

        let cart = match self.store.get(&self.config.storage_key).await {
            Ok(Some(blob)) => match codec::decode(&blob) {
                Ok(cart) => {
                    info!(items = cart.len(), "Hydrated cart");
                    cart
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable cart blob");
                    Cart::new()
                }
            },
            Ok(None) => {
                debug!("No persisted cart, starting empty");
                Cart::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted cart, starting empty");
                Cart::new()
            }
        };

        let queue = &self.shared.queue;
        self.shared.state.send_if_modified(|current| {
            // commits enqueue under this same lock
            if queue.last_seq() == seen {
                *current = Arc::new(cart);
                true
            } else {
                debug!("Cart changed during hydration, keeping in-memory cart");
                false
            }
        });
    }

    /// A handle bound to this provider.
    #[must_use]
    pub fn handle(&self) -> CartHandle {
        CartHandle {
            shared: Arc::downgrade(&self.shared.0),
        }
    }

    /// The current cart.
    #[must_use]
    pub fn products(&self) -> Arc<Cart> {
        self.shared.state.borrow().clone()
    }

    #[must_use]
    pub const fn config(&self) -> &CartConfig {
        &self.config
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist queue counters.
    #[must_use]
    pub fn persist_stats(&self) -> PersistStats {
        self.shared.queue.stats()
    }

    /// Wait until every snapshot committed so far has been attempted.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::WorkerStopped`] if the persist worker is gone.
    pub async fn flush(&self) -> Result<(), CartError> {
        self.shared.queue.flush().await
    }

    /// Unbind all handles, then drain the persist queue and stop the worker.
    ///
    /// Handles and contexts still held elsewhere report
    /// [`CartError::OutsideProvider`] from here on.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::WorkerStopped`] if the worker panicked.
    pub async fn shutdown(self) -> Result<PersistStats, CartError> {
        let Self { shared, worker, .. } = self;
        let shared = {
            let inner = Arc::clone(&shared.0);
            drop(shared);
            inner
        };

        shared.queue.close();
        worker.await.map_err(|_| CartError::WorkerStopped)?;

        let stats = shared.queue.stats();
        info!(
            written = stats.written,
            failed = stats.failed,
            "Cart provider shut down"
        );
        Ok(stats)
    }
}

/// Weak, cloneable reference to a [`CartProvider`].
///
/// `CartHandle::default()` is unbound, like a consumer rendered outside any
/// provider. Every operation on an unbound handle, or on one whose provider
/// has been dropped, panics with `"useCart must be used within a CartProvider"`.
/// Use [`CartHandle::try_cart`] to probe without panicking.
#[derive(Debug, Clone, Default)]
pub struct CartHandle {
    shared: Weak<Shared>,
}

impl CartHandle {
    /// A handle bound to nothing.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Whether the provider behind this handle is still alive.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.shared.upgrade().is_some_and(|shared| shared.is_mounted())
    }

    /// Resolve the handle into a bound [`CartContext`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutsideProvider`] if the handle is unbound.
    pub fn try_cart(&self) -> Result<CartContext, CartError> {
        self.shared
            .upgrade()
            .filter(|shared| shared.is_mounted())
            .map(|shared| CartContext { shared })
            .ok_or(CartError::OutsideProvider)
    }

    /// Resolve the handle into a bound [`CartContext`].
    ///
    /// # Panics
    ///
    /// Panics if the handle is not bound to a live provider.
    #[must_use]
    #[track_caller]
    pub fn cart(&self) -> CartContext {
        match self.try_cart() {
            Ok(context) => context,
            Err(_) => panic!("{OUTSIDE_PROVIDER}"),
        }
    }

    /// The current cart.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not bound to a live provider.
    #[must_use]
    #[track_caller]
    pub fn products(&self) -> Arc<Cart> {
        self.cart().products()
    }

    /// See [`CartContext::add_to_cart`].
    ///
    /// # Panics
    ///
    /// Panics if the handle is not bound to a live provider.
    #[track_caller]
    pub fn add_to_cart(&self, product: ProductInput) -> Arc<Cart> {
        self.cart().add_to_cart(product)
    }

    /// See [`CartContext::increment`].
    ///
    /// # Panics
    ///
    /// Panics if the handle is not bound to a live provider.
    #[track_caller]
    pub fn increment(&self, id: &ProductId) -> Arc<Cart> {
        self.cart().increment(id)
    }

    /// See [`CartContext::decrement`].
    ///
    /// # Panics
    ///
    /// Panics if the handle is not bound to a live provider.
    #[track_caller]
    pub fn decrement(&self, id: &ProductId) -> Arc<Cart> {
        self.cart().decrement(id)
    }

    /// Watch the cart for changes.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not bound to a live provider.
    #[must_use]
    #[track_caller]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Cart>> {
        self.cart().subscribe()
    }
}

/// A resolved view of the cart: `{ products, add_to_cart, increment, decrement }`.
///
/// Every mutation replaces the cart wholesale, notifies watchers, queues the
/// new cart for persistence and returns it without waiting for the write.
///
/// A context does not outlive its provider: once the provider is shut down
/// or dropped, every method panics like an unbound [`CartHandle`].
#[derive(Debug, Clone)]
pub struct CartContext {
    shared: Arc<Shared>,
}

impl CartContext {
    #[track_caller]
    fn live(&self) -> &Shared {
        if !self.shared.is_mounted() {
            panic!("{OUTSIDE_PROVIDER}");
        }
        &self.shared
    }

    /// Whether the provider is still mounted.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.shared.is_mounted()
    }

    /// The current cart.
    ///
    /// # Panics
    ///
    /// Panics if the provider has been shut down or dropped.
    #[must_use]
    #[track_caller]
    pub fn products(&self) -> Arc<Cart> {
        self.live().state.borrow().clone()
    }

    /// Add one unit of `product`, appending it if it is not in the cart yet.
    ///
    /// # Panics
    ///
    /// Panics if the provider has been shut down or dropped.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    #[track_caller]
    pub fn add_to_cart(&self, product: ProductInput) -> Arc<Cart> {
        let cart = self.live().commit(|cart| cart.with_added(product));
        debug!(items = cart.len(), "Added to cart");
        cart
    }

    /// Raise the quantity of `id` by one. Unknown IDs leave the cart unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the provider has been shut down or dropped.
    #[instrument(skip(self), fields(product_id = %id))]
    #[track_caller]
    pub fn increment(&self, id: &ProductId) -> Arc<Cart> {
        let cart = self.live().commit(|cart| cart.with_incremented(id));
        debug!(items = cart.len(), "Incremented");
        cart
    }

    /// Lower the quantity of `id` by one, removing it at zero.
    ///
    /// # Panics
    ///
    /// Panics if the provider has been shut down or dropped.
    #[instrument(skip(self), fields(product_id = %id))]
    #[track_caller]
    pub fn decrement(&self, id: &ProductId) -> Arc<Cart> {
        let cart = self.live().commit(|cart| cart.with_decremented(id));
        debug!(items = cart.len(), "Decremented");
        cart
    }

    /// Watch the cart for changes.
    ///
    /// # Panics
    ///
    /// Panics if the provider has been shut down or dropped.
    #[must_use]
    #[track_caller]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Cart>> {
        self.live().state.subscribe()
    }
}
