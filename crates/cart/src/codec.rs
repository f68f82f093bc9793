//! JSON encoding of the persisted cart blob.
//!
//! The blob is a JSON array of `{id, title, image_url, price, quantity}`
//! objects, in display order.

use marketplace_core::Cart;
use thiserror::Error;

/// Errors encoding or decoding a cart blob.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Malformed JSON, or lines that break cart invariants (zero quantity,
    /// negative price, repeated product ID).
    #[error("invalid cart blob: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize a cart to its persisted form.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn encode(cart: &Cart) -> Result<String, CodecError> {
    Ok(serde_json::to_string(cart)?)
}

/// Parse a persisted blob back into a cart.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if the blob is not a valid cart.
pub fn decode(blob: &str) -> Result<Cart, CodecError> {
    Ok(serde_json::from_str(blob)?)
}
