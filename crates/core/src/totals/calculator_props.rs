//! Property-based tests for totals calculation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::calculator::TotalsCalculator;
use super::types::{InvoiceTotals, LineAmount};

/// Strategy for well-formed line items: positive quantity, non-negative
/// price with at most two decimal places (cents).
fn line_strategy() -> impl Strategy<Value = LineAmount> {
    (1i64..1_000, 0i64..1_000_000)
        .prop_map(|(quantity, cents)| LineAmount::new(quantity, Decimal::new(cents, 2)))
}

fn lines_strategy() -> impl Strategy<Value = Vec<LineAmount>> {
    prop::collection::vec(line_strategy(), 0..20)
}

/// Strategy for percentage rates in [0, 100] with two decimal places.
fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|basis_points| Decimal::new(basis_points, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Recomputing totals from the same lines yields identical values.
    #[test]
    fn prop_totals_deterministic(
        lines in lines_strategy(),
        discount in rate_strategy(),
        tax in rate_strategy(),
    ) {
        let first = TotalsCalculator::invoice_totals(&lines, discount, tax).unwrap();
        let second = TotalsCalculator::invoice_totals(&lines, discount, tax).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Line order does not affect totals.
    #[test]
    fn prop_totals_order_independent(
        mut lines in lines_strategy(),
        discount in rate_strategy(),
        tax in rate_strategy(),
    ) {
        let forward = TotalsCalculator::invoice_totals(&lines, discount, tax).unwrap();
        lines.reverse();
        let backward = TotalsCalculator::invoice_totals(&lines, discount, tax).unwrap();
        prop_assert_eq!(forward, backward);
    }

    /// The final amount always reconciles with its parts.
    #[test]
    fn prop_total_reconciles(
        lines in lines_strategy(),
        discount in rate_strategy(),
        tax in rate_strategy(),
    ) {
        let totals = TotalsCalculator::invoice_totals(&lines, discount, tax).unwrap();
        prop_assert_eq!(
            totals.total_amount,
            totals.sub_total - totals.discount_amount + totals.tax_amount
        );
    }

    /// With no discount or tax the total equals the sub-total, and the
    /// sub-total equals the receipt-style sum of the same lines.
    #[test]
    fn prop_zero_rates_pass_through(lines in lines_strategy()) {
        let totals = TotalsCalculator::invoice_totals(
            &lines,
            Decimal::ZERO,
            Decimal::ZERO,
        ).unwrap();

        prop_assert_eq!(totals.discount_amount, Decimal::ZERO);
        prop_assert_eq!(totals.tax_amount, Decimal::ZERO);
        prop_assert_eq!(totals.total_amount, totals.sub_total);
        prop_assert_eq!(totals.sub_total, TotalsCalculator::receipt_total(&lines));
    }

    /// The discount never exceeds the sub-total, and all derived fields
    /// stay non-negative for well-formed lines and rates.
    #[test]
    fn prop_derived_fields_bounded(
        lines in lines_strategy(),
        discount in rate_strategy(),
        tax in rate_strategy(),
    ) {
        let totals = TotalsCalculator::invoice_totals(&lines, discount, tax).unwrap();
        prop_assert!(totals.sub_total >= Decimal::ZERO);
        prop_assert!(totals.discount_amount >= Decimal::ZERO);
        prop_assert!(totals.discount_amount <= totals.sub_total);
        prop_assert!(totals.tax_amount >= Decimal::ZERO);
        prop_assert!(totals.total_amount >= Decimal::ZERO);
    }

    /// No items means all-zero totals regardless of rates.
    #[test]
    fn prop_empty_lines_zero_totals(
        discount in rate_strategy(),
        tax in rate_strategy(),
    ) {
        let totals = TotalsCalculator::invoice_totals(&[], discount, tax).unwrap();
        prop_assert_eq!(totals, InvoiceTotals::zero());
    }
}
