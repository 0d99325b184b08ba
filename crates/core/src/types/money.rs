//! Monetary amounts backed by decimal arithmetic.
//!
//! All amounts in Orchard (product prices, order totals, payment amounts)
//! are `Money` - a thin wrapper over [`rust_decimal::Decimal`] that keeps
//! currency math exact and makes the intent of a value explicit at type
//! level. Currency is implicitly the store currency; multi-currency support
//! is out of scope.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors constructing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Negative amounts are not representable (refunds are out of scope).
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
}

/// A non-negative monetary amount in the store currency.
///
/// Serializes as a decimal string (via `rust_decimal`'s `serde-with-str`
/// feature), so `"19.99"` on the wire stays exact. Deserialization goes
/// through [`Money::new`], so a negative amount is rejected at the parse
/// boundary and the invariant holds for every constructed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Money(Decimal);

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl Money {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a `Money` value, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a `Money` value from whole currency units (e.g., dollars).
    #[must_use]
    pub fn from_units(units: u32) -> Self {
        Self(Decimal::from(units))
    }

    /// Create a `Money` value from minor units (e.g., cents).
    #[must_use]
    pub fn from_minor_units(minor: u32) -> Self {
        Self(Decimal::new(i64::from(minor), 2))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Extend this unit amount over `quantity` items.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        let result = Money::new(Decimal::new(-100, 2));
        assert!(matches!(result, Err(MoneyError::Negative(_))));
    }

    #[test]
    fn test_zero_is_ok() {
        assert_eq!(Money::new(Decimal::ZERO).expect("zero"), Money::ZERO);
    }

    #[test]
    fn test_times_quantity() {
        let unit = Money::from_minor_units(1050); // 10.50
        assert_eq!(unit.times(3), Money::from_minor_units(3150));
    }

    #[test]
    fn test_times_zero_quantity() {
        assert_eq!(Money::from_units(10).times(0), Money::ZERO);
    }

    #[test]
    fn test_sum() {
        let total: Money = [
            Money::from_units(10).times(2),
            Money::from_units(5).times(1),
        ]
        .into_iter()
        .sum();
        assert_eq!(total, Money::from_units(25));
    }

    #[test]
    fn test_display_two_decimal_places() {
        assert_eq!(Money::from_units(7).to_string(), "7.00");
        assert_eq!(Money::from_minor_units(1999).to_string(), "19.99");
    }

    #[test]
    fn test_serde_as_string() {
        let money = Money::from_minor_units(2500);
        let json = serde_json::to_string(&money).expect("serialize");
        assert_eq!(json, "\"25.00\"");
        let back: Money = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, money);
    }

    #[test]
    fn test_serde_rejects_negative() {
        assert!(serde_json::from_str::<Money>("\"-5.00\"").is_err());
        assert!(serde_json::from_str::<Money>("\"-0.01\"").is_err());
        assert!(serde_json::from_str::<Money>("\"0.00\"").is_ok());
    }

    #[test]
    fn test_from_minor_units_scale() {
        assert_eq!(Money::from_minor_units(125).to_string(), "1.25");
        assert_eq!(Money::from_minor_units(0), Money::ZERO);
    }
}
