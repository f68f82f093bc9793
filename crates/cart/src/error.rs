//! Crate-level error type.

use thiserror::Error;

use crate::codec::CodecError;
use crate::storage::StorageError;

/// Message for a cart handle used without a live provider.
pub(crate) const OUTSIDE_PROVIDER: &str = "useCart must be used within a CartProvider";

/// Errors surfaced by the cart provider.
///
/// Cart operations themselves never fail; these cover wiring mistakes and the
/// few lifecycle calls that touch storage directly.
#[derive(Debug, Error)]
pub enum CartError {
    /// The handle was never bound to a provider, or the provider is gone.
    #[error("useCart must be used within a CartProvider")]
    OutsideProvider,

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cart blob could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The persist worker has already shut down.
    #[error("Persist worker stopped")]
    WorkerStopped,
}
