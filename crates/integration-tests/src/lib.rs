//! Integration tests for the Go Marketplace cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - Provider behaviour end to end over in-memory storage
//! - `cart_persistence` - Hydration, write ordering and failure handling
//!
//! This crate also provides the instrumented stores the tests share.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Mutex;

use marketplace_cart::{KeyValueStore, MemoryStore, StorageError};
use marketplace_core::{Price, ProductId, ProductInput};

/// Build a product descriptor with a whole-unit price.
#[must_use]
pub fn product(id: &str, title: &str, price: i64) -> ProductInput {
    ProductInput {
        id: ProductId::new(id),
        title: title.to_owned(),
        image_url: format!("https://cdn.example.com/{id}.png"),
        price: Price::new(rust_decimal::Decimal::new(price, 0)).unwrap_or(Price::ZERO),
    }
}

/// Store that records every successful `set` in order.
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    writes: Mutex<Vec<String>>,
}

impl RecordingStore {
    /// Create a store pre-populated with one entry.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        Self {
            inner: MemoryStore::with_entry(key, value),
            writes: Mutex::default(),
        }
    }

    /// Every value written so far, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<String> {
        self.writes
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// The value currently stored under `key`.
    #[must_use]
    pub fn current(&self, key: &str) -> Option<String> {
        self.inner.snapshot(key)
    }
}

impl KeyValueStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.inner.set(key, value.clone()).await?;
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(value);
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}

/// Store whose reads or writes always fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore {
    /// Fail `get` as well as `set`.
    pub fail_reads: bool,
}

impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Backend("device storage unavailable".to_string()));
        }
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
        Err(StorageError::Backend("device storage full".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("device storage full".to_string()))
    }
}
