//! Cart commands.
//!
//! Each command mounts a provider on the configured [`FileStore`], performs
//! one operation, then shuts the provider down so the write is on disk
//! before the process exits. Commands return the rendered cart.

use std::fmt::Write as _;

use marketplace_cart::{CartConfig, CartError, CartProvider, FileStore, KeyValueStore, StorageError};
use marketplace_core::{Cart, ProductId, ProductInput};
use thiserror::Error;
use tracing::info;

/// Errors from cart commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The cart changed in memory but did not reach the store.
    #[error("{failed} cart write(s) failed, changes were not saved")]
    Unsaved { failed: u64 },
}

async fn mount(config: CartConfig) -> CartProvider<FileStore> {
    let store = FileStore::new(config.storage_dir.clone());
    info!(path = %store.path_for(&config.storage_key).display(), "Opening cart");
    CartProvider::mount(store, config).await
}

/// Mount, apply `op`, and shut down, returning the resulting cart.
async fn with_cart(
    config: CartConfig,
    op: impl FnOnce(&CartProvider<FileStore>) -> std::sync::Arc<Cart>,
) -> Result<String, CommandError> {
    let provider = mount(config).await;
    let cart = op(&provider);

    let stats = provider.shutdown().await?;
    if stats.failed > 0 {
        return Err(CommandError::Unsaved {
            failed: stats.failed,
        });
    }
    Ok(render(&cart))
}

/// Print the persisted cart.
///
/// # Errors
///
/// Returns an error if the persist worker cannot be shut down cleanly.
pub async fn show(config: CartConfig) -> Result<String, CommandError> {
    let provider = mount(config).await;
    let cart = provider.products();
    provider.shutdown().await?;
    Ok(render(&cart))
}

/// Add one unit of `product`.
///
/// # Errors
///
/// Returns an error if the change could not be written or the persist
/// worker cannot be shut down cleanly.
pub async fn add(config: CartConfig, product: ProductInput) -> Result<String, CommandError> {
    with_cart(config, |provider| provider.handle().add_to_cart(product)).await
}

/// Raise the quantity of `id` by one.
///
/// # Errors
///
/// Returns an error if the change could not be written or the persist
/// worker cannot be shut down cleanly.
pub async fn increment(config: CartConfig, id: ProductId) -> Result<String, CommandError> {
    with_cart(config, |provider| provider.handle().increment(&id)).await
}

/// Lower the quantity of `id` by one.
///
/// # Errors
///
/// Returns an error if the change could not be written or the persist
/// worker cannot be shut down cleanly.
pub async fn decrement(config: CartConfig, id: ProductId) -> Result<String, CommandError> {
    with_cart(config, |provider| provider.handle().decrement(&id)).await
}

/// Delete the persisted cart blob.
///
/// # Errors
///
/// Returns an error if the blob cannot be removed.
pub async fn clear(config: CartConfig) -> Result<String, CommandError> {
    let store = FileStore::new(config.storage_dir.clone());
    store.remove(&config.storage_key).await?;
    info!(key = %config.storage_key, "Cleared cart");
    Ok(render(&Cart::new()))
}

/// Render a cart as one line per product plus a total.
fn render(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_owned();
    }

    let mut out = String::new();
    for item in cart {
        let _ = writeln!(
            out,
            "{:>4} x {} [{}] @ {}",
            item.quantity, item.title, item.id, item.price
        );
    }
    let _ = writeln!(out, "{} item(s)", cart.total_quantity());
    out
}
