use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// A non-negative monetary amount kept in exact decimal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> Result<Self, ServiceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ServiceError::InvalidPrice(format!(
                "price must not be negative, got {}",
                amount
            )));
        }
        Ok(Self(amount))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiplies by a line quantity, failing on overflow.
    pub fn checked_mul(&self, quantity: i64) -> Result<Self, ServiceError> {
        let amount = self
            .0
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| ServiceError::InvalidPrice(format!("{} x {} overflows", self.0, quantity)))?;
        Self::new(amount)
    }

    pub fn checked_add(&self, other: Price) -> Result<Self, ServiceError> {
        let amount = self
            .0
            .checked_add(other.0)
            .ok_or_else(|| ServiceError::InvalidPrice(format!("{} + {} overflows", self.0, other.0)))?;
        Self::new(amount)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = ServiceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Price::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
