//! Money amounts using decimal arithmetic.
//!
//! Catalog prices are stored as `NUMERIC(10, 2)`: non-negative, two decimal
//! places, at most eight integer digits.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places kept for every amount.
pub const PRICE_SCALE: u32 = 2;

/// Largest storable price: `99_999_999.99`.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, PRICE_SCALE);

/// Errors from strict price parsing.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("not a decimal number: {0:?}")]
    Invalid(String),
    #[error("price cannot be negative")]
    Negative,
    #[error("price exceeds {MAX_PRICE}")]
    TooLarge,
}

/// A non-negative catalog price quantized to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, PRICE_SCALE));

    /// Validate and quantize a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] or [`PriceError::TooLarge`] when the
    /// amount does not fit the catalog column.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let quantized = quantize(amount);
        if quantized > MAX_PRICE {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(quantized))
    }

    /// Parse a price typed by staff, falling back to `0.00`.
    ///
    /// Anything that is not a representable, non-negative amount becomes
    /// [`Price::ZERO`] instead of an error.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::ZERO)
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Line subtotal for `quantity` units, quantized to cents.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        quantize(self.0 * Decimal::from(quantity))
    }
}

/// Round to two places using half-away-from-zero rounding.
#[must_use]
pub fn quantize(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(PRICE_SCALE);
    rounded
}

/// Format an amount the way the JSON API exposes money: `"45.00"`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    quantize(amount).to_string()
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let amount = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| PriceError::Invalid(trimmed.to_owned()))?;
        Self::new(amount)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
