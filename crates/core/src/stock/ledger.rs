//! Stock ledger for movement validation and application.
//!
//! This module provides the pure rules that keep a product's stock level
//! consistent with its movement history. Persistence and the per-product
//! serialization of concurrent updates live in the database layer; the
//! arithmetic and invariants live here.

use super::error::StockError;
use super::types::{MovementKind, StockMovement};

/// Stock ledger rules.
///
/// Pure functions with no database dependencies. The invariant enforced
/// throughout: a stock level is the fold of all movements applied to it,
/// and never goes below zero.
pub struct StockLedger;

impl StockLedger {
    /// Validates a movement before it is applied or persisted.
    ///
    /// In/Out movements must carry a positive quantity; adjustments must
    /// be non-zero (their sign is meaningful).
    ///
    /// # Errors
    ///
    /// Returns `StockError` if the movement is malformed.
    pub const fn validate(movement: StockMovement) -> Result<(), StockError> {
        match movement.kind {
            MovementKind::In | MovementKind::Out => {
                if movement.quantity <= 0 {
                    return Err(StockError::NonPositiveQuantity(movement.quantity));
                }
                Ok(())
            }
            MovementKind::Adjustment => {
                if movement.quantity == 0 {
                    return Err(StockError::ZeroAdjustment);
                }
                Ok(())
            }
        }
    }

    /// Applies a movement to a stock level, rejecting negative results.
    ///
    /// An Out movement that would go negative fails with
    /// `InsufficientStock` (user-correctable); an adjustment that would go
    /// negative fails with `NegativeStock` (integrity violation).
    ///
    /// # Errors
    ///
    /// Returns `StockError` if the movement is malformed or the resulting
    /// level would be negative.
    pub const fn apply(current: i64, movement: StockMovement) -> Result<i64, StockError> {
        if let Err(e) = Self::validate(movement) {
            return Err(e);
        }

        let next = current + movement.delta();
        if next < 0 {
            return Err(match movement.kind {
                MovementKind::Out => StockError::InsufficientStock {
                    available: current,
                    requested: movement.quantity,
                },
                _ => StockError::NegativeStock {
                    current,
                    delta: movement.delta(),
                },
            });
        }

        Ok(next)
    }

    /// Folds a movement history into a stock level, starting from zero.
    ///
    /// This is the defining equation for `Product.quantity`: the
    /// persisted level must always equal the fold of the product's audit
    /// trail.
    #[must_use]
    pub fn fold<I>(movements: I) -> i64
    where
        I: IntoIterator<Item = StockMovement>,
    {
        movements.into_iter().map(|m| m.delta()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(kind: MovementKind, quantity: i64) -> StockMovement {
        StockMovement::new(kind, quantity)
    }

    #[test]
    fn test_apply_in_increases() {
        assert_eq!(StockLedger::apply(10, movement(MovementKind::In, 5)), Ok(15));
    }

    #[test]
    fn test_apply_out_decreases() {
        assert_eq!(StockLedger::apply(10, movement(MovementKind::Out, 3)), Ok(7));
    }

    #[test]
    fn test_apply_out_to_zero() {
        assert_eq!(StockLedger::apply(3, movement(MovementKind::Out, 3)), Ok(0));
    }

    #[test]
    fn test_apply_out_insufficient() {
        let result = StockLedger::apply(7, movement(MovementKind::Out, 10));
        assert_eq!(
            result,
            Err(StockError::InsufficientStock {
                available: 7,
                requested: 10,
            })
        );
    }

    #[test]
    fn test_apply_adjustment_signed() {
        assert_eq!(
            StockLedger::apply(10, movement(MovementKind::Adjustment, -4)),
            Ok(6)
        );
        assert_eq!(
            StockLedger::apply(10, movement(MovementKind::Adjustment, 4)),
            Ok(14)
        );
    }

    #[test]
    fn test_apply_adjustment_negative_stock() {
        let result = StockLedger::apply(2, movement(MovementKind::Adjustment, -5));
        assert_eq!(
            result,
            Err(StockError::NegativeStock {
                current: 2,
                delta: -5,
            })
        );
    }

    #[test]
    fn test_validate_rejects_non_positive_in_out() {
        assert_eq!(
            StockLedger::validate(movement(MovementKind::In, 0)),
            Err(StockError::NonPositiveQuantity(0))
        );
        assert_eq!(
            StockLedger::validate(movement(MovementKind::Out, -2)),
            Err(StockError::NonPositiveQuantity(-2))
        );
    }

    #[test]
    fn test_validate_rejects_zero_adjustment() {
        assert_eq!(
            StockLedger::validate(movement(MovementKind::Adjustment, 0)),
            Err(StockError::ZeroAdjustment)
        );
    }

    #[test]
    fn test_fold_matches_history() {
        let history = vec![
            movement(MovementKind::In, 10),
            movement(MovementKind::Out, 3),
            movement(MovementKind::Adjustment, -2),
            movement(MovementKind::In, 5),
        ];
        assert_eq!(StockLedger::fold(history), 10);
    }

    #[test]
    fn test_fold_empty_is_zero() {
        assert_eq!(StockLedger::fold(Vec::new()), 0);
    }
}
