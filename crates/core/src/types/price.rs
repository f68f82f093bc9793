//! Non-negative unit price using decimal arithmetic.
//!
//! The cart only carries prices for display; it never sums, discounts or
//! converts them. The wire format is a plain JSON number so persisted carts
//! stay compatible with blobs written by the mobile client.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The input string is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
    /// The amount would change when stored as a JSON number.
    #[error("price {0} cannot be stored exactly")]
    Unrepresentable(Decimal),
}

/// A unit price in the store's currency.
///
/// ## Examples
///
/// ```
/// use marketplace_core::Price;
/// use rust_decimal::Decimal;
///
/// assert!(Price::new(Decimal::new(1999, 2)).is_ok());
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
///
/// let price: Price = "10.50".parse().unwrap();
/// assert_eq!(price.to_string(), "10.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero, and
    /// [`PriceError::Unrepresentable`] if it does not survive the trip
    /// through an `f64` JSON number unchanged.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if through_f64(amount) != Some(amount) {
            return Err(PriceError::Unrepresentable(amount));
        }
        Ok(Self(amount))
    }

    /// The amount in the currency's standard unit (e.g., dollars, not cents).
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

/// `amount` as it reads back after serialization.
fn through_f64(amount: Decimal) -> Option<Decimal> {
    let float = amount.to_f64()?;
    Decimal::from_str(&float.to_string()).ok()
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(amount)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_zero_and_positive() {
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
        assert!(Price::new(Decimal::new(1999, 2)).is_ok());
    }

    #[test]
    fn test_new_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::new(-5, 1)),
            Err(PriceError::Negative(_))
        ));
    }

    #[test]
    fn test_new_rejects_amounts_lost_in_json() {
        assert!(matches!(
            "12345678901234567.89".parse::<Price>(),
            Err(PriceError::Unrepresentable(_))
        ));
        assert!(matches!(
            "0.1000000000000000055511151231".parse::<Price>(),
            Err(PriceError::Unrepresentable(_))
        ));

        for accepted in ["0", "0.01", "4.5", "19.99", "10", "123456789.12", "9007199254740992"] {
            let price: Price = accepted.parse().unwrap();
            let back: Price = serde_json::from_str(&serde_json::to_string(&price).unwrap()).unwrap();
            assert_eq!(back, price, "{accepted} should survive a JSON round trip");
        }
    }

    #[test]
    fn test_parse() {
        let price: Price = "19.99".parse().unwrap();
        assert_eq!(price.amount(), Decimal::new(1999, 2));
        assert!(matches!("abc".parse::<Price>(), Err(PriceError::Invalid(_))));
        assert!(matches!("-3".parse::<Price>(), Err(PriceError::Negative(_))));
    }

    #[test]
    fn test_display_two_places() {
        let price: Price = "10".parse().unwrap();
        assert_eq!(price.to_string(), "10.00");
    }

    #[test]
    fn test_serializes_as_json_number() {
        let price: Price = "19.99".parse().unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "19.99");

        let parsed: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(parsed, price);

        let whole: Price = serde_json::from_str("10").unwrap();
        assert_eq!(whole.amount(), Decimal::new(10, 0));
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Price>("-1.5").is_err());
    }
}
