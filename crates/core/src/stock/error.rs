//! Stock error types for validation and invariant violations.

use thiserror::Error;

/// Errors that can occur when validating or applying stock movements.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StockError {
    /// A sale would drive the stock level negative. User-correctable.
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock {
        /// Stock currently available.
        available: i64,
        /// Quantity requested.
        requested: i64,
    },

    /// An adjustment would drive the stock level negative.
    ///
    /// Unlike `InsufficientStock` this is an integrity error: adjustments
    /// are only emitted by the system itself (reversals, corrections).
    #[error("Adjustment of {delta} would drive stock below zero (current {current})")]
    NegativeStock {
        /// Stock level before the adjustment.
        current: i64,
        /// Signed adjustment delta.
        delta: i64,
    },

    /// In/Out movements must carry a positive quantity.
    #[error("Movement quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),

    /// Adjustments must carry a non-zero quantity.
    #[error("Adjustment quantity must be non-zero")]
    ZeroAdjustment,
}

impl StockError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::NegativeStock { .. } => "NEGATIVE_STOCK",
            Self::NonPositiveQuantity(_) => "NON_POSITIVE_QUANTITY",
            Self::ZeroAdjustment => "ZERO_ADJUSTMENT",
        }
    }

    /// Returns true if this error is caused by user input rather than an
    /// internal invariant violation.
    #[must_use]
    pub const fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientStock { .. } | Self::NonPositiveQuantity(_) | Self::ZeroAdjustment
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            StockError::InsufficientStock {
                available: 7,
                requested: 10,
            }
            .error_code(),
            "INSUFFICIENT_STOCK"
        );
        assert_eq!(
            StockError::NegativeStock {
                current: 2,
                delta: -5,
            }
            .error_code(),
            "NEGATIVE_STOCK"
        );
        assert_eq!(
            StockError::NonPositiveQuantity(0).error_code(),
            "NON_POSITIVE_QUANTITY"
        );
        assert_eq!(StockError::ZeroAdjustment.error_code(), "ZERO_ADJUSTMENT");
    }

    #[test]
    fn test_user_correctable() {
        assert!(StockError::InsufficientStock {
            available: 1,
            requested: 2,
        }
        .is_user_correctable());
        assert!(StockError::NonPositiveQuantity(-1).is_user_correctable());
        assert!(!StockError::NegativeStock {
            current: 0,
            delta: -1,
        }
        .is_user_correctable());
    }

    #[test]
    fn test_error_display() {
        let err = StockError::InsufficientStock {
            available: 7,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock: available 7, requested 10"
        );

        let err = StockError::NegativeStock {
            current: 2,
            delta: -5,
        };
        assert_eq!(
            err.to_string(),
            "Adjustment of -5 would drive stock below zero (current 2)"
        );
    }
}
