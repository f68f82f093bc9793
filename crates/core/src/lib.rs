//! Marketplace Core - Cart domain types.
//!
//! This crate provides the types shared by the Go Marketplace cart components:
//! - `cart` - Cart provider, persistence queue and storage backends
//! - `cli` - Command-line driver for a file-backed cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure transitions - no I/O, no async
//! runtime, no storage access. Every cart operation is a total function from
//! one [`Cart`] to the next, which keeps the stateful layer above it small.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices and quantities, plus [`Cart`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
