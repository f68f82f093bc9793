//! Marketplace Cart - persistent shopping-cart state.
//!
//! Holds the ordered list of cart lines in memory, hands it to consumers as
//! immutable snapshots, and keeps a single JSON blob in a key-value store in
//! step with it.
//!
//! # Architecture
//!
//! - [`CartProvider`] owns the state and is mounted once; it hydrates from the
//!   store before it is usable
//! - [`CartHandle`] is the explicitly injected, weak reference consumers use
//! - Mutations are pure transitions from [`marketplace_core::Cart`]; each
//!   commit notifies watchers synchronously and queues the new cart for an
//!   ordered, fire-and-forget write
//!
//! # Example
//!
//! ```rust
//! use marketplace_cart::{CartConfig, CartProvider, MemoryStore};
//! use marketplace_core::{Price, ProductId, ProductInput};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = CartProvider::mount(MemoryStore::new(), CartConfig::default()).await;
//! let cart = provider.handle();
//!
//! cart.add_to_cart(ProductInput {
//!     id: ProductId::new("p1"),
//!     title: "Shirt".to_owned(),
//!     image_url: "https://cdn.example.com/shirt.png".to_owned(),
//!     price: "10".parse::<Price>().unwrap(),
//! });
//! let snapshot = cart.increment(&ProductId::new("p1"));
//! assert_eq!(snapshot.total_quantity(), 2);
//!
//! provider.shutdown().await.unwrap();
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod codec;
pub mod config;
pub mod error;
pub mod persist;
pub mod provider;
pub mod storage;

pub use config::{CartConfig, ConfigError, DEFAULT_STORAGE_KEY};
pub use error::CartError;
pub use persist::PersistStats;
pub use provider::{CartContext, CartHandle, CartProvider};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
