//! Property-based tests for the stock ledger rules.

use proptest::prelude::*;

use super::error::StockError;
use super::ledger::StockLedger;
use super::types::{MovementKind, StockMovement};

/// Strategy for positive movement quantities.
fn quantity_strategy() -> impl Strategy<Value = i64> {
    1i64..10_000
}

/// Strategy for arbitrary (possibly malformed) movements.
fn movement_strategy() -> impl Strategy<Value = StockMovement> {
    (
        prop_oneof![
            Just(MovementKind::In),
            Just(MovementKind::Out),
            Just(MovementKind::Adjustment),
        ],
        -10_000i64..10_000,
    )
        .prop_map(|(kind, quantity)| StockMovement::new(kind, quantity))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Stock in always increases the level by exactly the quantity.
    #[test]
    fn prop_in_increases_by_quantity(
        current in 0i64..1_000_000,
        quantity in quantity_strategy(),
    ) {
        let next = StockLedger::apply(current, StockMovement::new(MovementKind::In, quantity));
        prop_assert_eq!(next, Ok(current + quantity));
    }

    /// Stock out succeeds exactly when enough stock is available, and the
    /// failure carries the available/requested pair.
    #[test]
    fn prop_out_requires_sufficient_stock(
        current in 0i64..10_000,
        quantity in quantity_strategy(),
    ) {
        let result = StockLedger::apply(current, StockMovement::new(MovementKind::Out, quantity));
        if quantity <= current {
            prop_assert_eq!(result, Ok(current - quantity));
        } else {
            prop_assert_eq!(
                result,
                Err(StockError::InsufficientStock {
                    available: current,
                    requested: quantity,
                })
            );
        }
    }

    /// No sequence of applied movements can be observed below zero, and
    /// the final level equals the fold of the accepted movements.
    #[test]
    fn prop_level_never_negative_and_matches_fold(
        movements in prop::collection::vec(movement_strategy(), 0..50),
    ) {
        let mut level = 0i64;
        let mut accepted = Vec::new();

        for movement in movements {
            if let Ok(next) = StockLedger::apply(level, movement) {
                prop_assert!(next >= 0, "level went negative");
                level = next;
                accepted.push(movement);
            }
        }

        prop_assert_eq!(level, StockLedger::fold(accepted));
        prop_assert!(level >= 0);
    }

    /// Selling a quantity and reversing it returns the level to its
    /// pre-sale value (the delete-with-reversal round trip).
    #[test]
    fn prop_out_then_in_round_trip(
        current in 0i64..1_000_000,
        quantity in quantity_strategy(),
    ) {
        prop_assume!(quantity <= current);

        let after_out = StockLedger::apply(
            current,
            StockMovement::new(MovementKind::Out, quantity),
        ).unwrap();
        let after_reversal = StockLedger::apply(
            after_out,
            StockMovement::new(MovementKind::In, quantity),
        ).unwrap();

        prop_assert_eq!(after_reversal, current);
    }

    /// N sequential unit sales against stock S succeed exactly min(N, S)
    /// times; the remainder fail with insufficient stock.
    #[test]
    fn prop_unit_sales_bounded_by_stock(
        stock in 0i64..100,
        attempts in 0usize..200,
    ) {
        let mut level = stock;
        let mut successes = 0i64;
        let mut failures = 0i64;

        for _ in 0..attempts {
            match StockLedger::apply(level, StockMovement::new(MovementKind::Out, 1)) {
                Ok(next) => {
                    level = next;
                    successes += 1;
                }
                Err(StockError::InsufficientStock { .. }) => failures += 1,
                Err(e) => prop_assert!(false, "unexpected error: {e}"),
            }
        }

        #[allow(clippy::cast_possible_wrap)]
        let attempts = attempts as i64;
        prop_assert_eq!(successes, stock.min(attempts));
        prop_assert_eq!(failures, attempts - stock.min(attempts));
        prop_assert_eq!(level, stock - successes);
    }

    /// A validated movement applied to a sufficiently large level always
    /// succeeds; a malformed movement never does.
    #[test]
    fn prop_validate_agrees_with_apply(movement in movement_strategy()) {
        let valid = StockLedger::validate(movement).is_ok();
        // Large enough that non-negativity is never the reason to fail.
        let result = StockLedger::apply(1_000_000, movement);
        prop_assert_eq!(valid, result.is_ok());
    }
}
