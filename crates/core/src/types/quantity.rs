//! Positive line-item quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantities start at one; a line at zero is removed instead.
    #[error("quantity must be at least 1")]
    Zero,
}

/// Number of units of a product in the cart.
///
/// Always at least one. Serialized as a bare JSON integer; `0` and negative
/// values fail to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity from a raw count.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] if `count` is zero.
    pub const fn new(count: u32) -> Result<Self, QuantityError> {
        match NonZeroU32::new(count) {
            Some(n) => Ok(Self(n)),
            None => Err(QuantityError::Zero),
        }
    }

    /// Get the raw count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// One more unit, saturating at `u32::MAX`.
    #[must_use]
    pub const fn incremented(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// One fewer unit, or `None` if that would reach zero.
    #[must_use]
    pub const fn decremented(self) -> Option<Self> {
        match NonZeroU32::new(self.0.get() - 1) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(count: u32) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero() {
        assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
        assert_eq!(Quantity::new(1).unwrap(), Quantity::ONE);
    }

    #[test]
    fn test_increment_saturates() {
        assert_eq!(Quantity::ONE.incremented().get(), 2);
        let max = Quantity::new(u32::MAX).unwrap();
        assert_eq!(max.incremented(), max);
    }

    #[test]
    fn test_decrement_to_zero_is_none() {
        assert_eq!(Quantity::ONE.decremented(), None);
        assert_eq!(Quantity::new(3).unwrap().decremented().unwrap().get(), 2);
    }

    #[test]
    fn test_deserialize_rejects_zero_and_negative() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert!(serde_json::from_str::<Quantity>("-2").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("4").unwrap().get(), 4);
    }
}
