//! Error types for totals calculation.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur when computing document totals.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TotalsError {
    /// Discount and tax rates are percentages and must lie in [0, 100].
    #[error("Rate must be between 0 and 100, got {0}")]
    RateOutOfRange(Decimal),

    /// Line quantities must be positive.
    #[error("Line quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),

    /// Line unit prices must not be negative.
    #[error("Unit price must not be negative, got {0}")]
    NegativePrice(Decimal),
}

impl TotalsError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::RateOutOfRange(_) => "RATE_OUT_OF_RANGE",
            Self::NonPositiveQuantity(_) => "NON_POSITIVE_QUANTITY",
            Self::NegativePrice(_) => "NEGATIVE_PRICE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            TotalsError::RateOutOfRange(dec!(120)).error_code(),
            "RATE_OUT_OF_RANGE"
        );
        assert_eq!(
            TotalsError::NonPositiveQuantity(0).error_code(),
            "NON_POSITIVE_QUANTITY"
        );
        assert_eq!(
            TotalsError::NegativePrice(dec!(-1)).error_code(),
            "NEGATIVE_PRICE"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            TotalsError::RateOutOfRange(dec!(101)).to_string(),
            "Rate must be between 0 and 100, got 101"
        );
    }
}
