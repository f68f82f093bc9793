//! Core types for the Go Marketplace cart.
//!
//! This module provides type-safe wrappers for the cart's domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod quantity;

pub use cart::{Cart, CartItem, DuplicateProductError, ProductInput};
pub use id::*;
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityError};
