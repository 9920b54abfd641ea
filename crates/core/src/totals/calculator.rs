//! Totals calculator for receipts and invoices.
//!
//! Pure arithmetic over `Decimal`; the database layer persists the
//! results inside the same transaction as the item change that
//! triggered the recalculation.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::TotalsError;
use super::types::{InvoiceTotals, LineAmount};

/// Money is stored with two decimal places.
const MONEY_SCALE: u32 = 2;

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Totals calculator.
///
/// All derived money fields are rounded to two decimal places using
/// banker's rounding, so recomputing from the same lines always yields
/// identical values.
pub struct TotalsCalculator;

impl TotalsCalculator {
    /// Rounds a monetary amount to storage precision.
    #[must_use]
    pub fn round_money(amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
    }

    /// Validates a line before it participates in totals.
    ///
    /// # Errors
    ///
    /// Returns `TotalsError` for non-positive quantities or negative
    /// prices.
    pub fn validate_line(line: LineAmount) -> Result<(), TotalsError> {
        if line.quantity <= 0 {
            return Err(TotalsError::NonPositiveQuantity(line.quantity));
        }
        if line.unit_price < Decimal::ZERO {
            return Err(TotalsError::NegativePrice(line.unit_price));
        }
        Ok(())
    }

    /// Validates a percentage rate input.
    ///
    /// # Errors
    ///
    /// Returns `TotalsError::RateOutOfRange` for rates outside [0, 100].
    pub fn validate_rate(rate: Decimal) -> Result<(), TotalsError> {
        if rate < Decimal::ZERO || rate > HUNDRED {
            return Err(TotalsError::RateOutOfRange(rate));
        }
        Ok(())
    }

    /// Computes a receipt's total amount from its line items.
    ///
    /// `total = sum(quantity x unit_price)`, zero for no items.
    #[must_use]
    pub fn receipt_total(lines: &[LineAmount]) -> Decimal {
        let total: Decimal = lines.iter().map(LineAmount::extended).sum();
        Self::round_money(total)
    }

    /// Computes an invoice's derived totals from its line items and rate
    /// inputs.
    ///
    /// 1. `sub_total = sum(quantity x unit_price)`
    /// 2. `discount_amount = sub_total x discount_rate / 100`
    /// 3. `tax_amount = (sub_total - discount_amount) x tax_rate / 100`
    /// 4. `total_amount = sub_total - discount_amount + tax_amount`
    ///
    /// # Errors
    ///
    /// Returns `TotalsError::RateOutOfRange` if either rate lies outside
    /// [0, 100].
    pub fn invoice_totals(
        lines: &[LineAmount],
        discount_rate: Decimal,
        tax_rate: Decimal,
    ) -> Result<InvoiceTotals, TotalsError> {
        Self::validate_rate(discount_rate)?;
        Self::validate_rate(tax_rate)?;

        let sub_total: Decimal = lines.iter().map(LineAmount::extended).sum();
        let sub_total = Self::round_money(sub_total);

        let discount_amount = Self::round_money(sub_total * discount_rate / HUNDRED);
        let after_discount = sub_total - discount_amount;
        let tax_amount = Self::round_money(after_discount * tax_rate / HUNDRED);
        let total_amount = after_discount + tax_amount;

        Ok(InvoiceTotals {
            sub_total,
            discount_amount,
            tax_amount,
            total_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_receipt_total_two_items() {
        // 5 x 2.00 + 3 x 4.00 = 22.00
        let lines = vec![
            LineAmount::new(5, dec!(2.00)),
            LineAmount::new(3, dec!(4.00)),
        ];
        assert_eq!(TotalsCalculator::receipt_total(&lines), dec!(22.00));
    }

    #[test]
    fn test_receipt_total_empty_is_zero() {
        assert_eq!(TotalsCalculator::receipt_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_invoice_totals_discount_and_tax() {
        // One item 2 x 100.00, discount 10%, tax 5%:
        // sub_total 200.00, discount 20.00, tax (200-20)*0.05 = 9.00,
        // total 189.00.
        let lines = vec![LineAmount::new(2, dec!(100.00))];
        let totals =
            TotalsCalculator::invoice_totals(&lines, dec!(10), dec!(5)).unwrap();

        assert_eq!(totals.sub_total, dec!(200.00));
        assert_eq!(totals.discount_amount, dec!(20.00));
        assert_eq!(totals.tax_amount, dec!(9.00));
        assert_eq!(totals.total_amount, dec!(189.00));
    }

    #[test]
    fn test_invoice_totals_zero_rates() {
        let lines = vec![LineAmount::new(3, dec!(20.00))];
        let totals =
            TotalsCalculator::invoice_totals(&lines, Decimal::ZERO, Decimal::ZERO).unwrap();

        assert_eq!(totals.sub_total, dec!(60.00));
        assert_eq!(totals.discount_amount, Decimal::ZERO);
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.total_amount, dec!(60.00));
    }

    #[test]
    fn test_invoice_totals_no_items() {
        let totals =
            TotalsCalculator::invoice_totals(&[], dec!(10), dec!(5)).unwrap();
        assert_eq!(totals, InvoiceTotals::zero());
    }

    #[test]
    fn test_invoice_totals_rejects_bad_rates() {
        assert_eq!(
            TotalsCalculator::invoice_totals(&[], dec!(-1), Decimal::ZERO),
            Err(TotalsError::RateOutOfRange(dec!(-1)))
        );
        assert_eq!(
            TotalsCalculator::invoice_totals(&[], Decimal::ZERO, dec!(100.01)),
            Err(TotalsError::RateOutOfRange(dec!(100.01)))
        );
    }

    #[rstest::rstest]
    #[case(dec!(2.345), dec!(2.34))]
    #[case(dec!(2.355), dec!(2.36))]
    #[case(dec!(2.344), dec!(2.34))]
    #[case(dec!(2.346), dec!(2.35))]
    #[case(dec!(-2.345), dec!(-2.34))]
    fn test_rounding_is_bankers(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(TotalsCalculator::round_money(input), expected);
    }

    #[test]
    fn test_validate_line() {
        assert!(TotalsCalculator::validate_line(LineAmount::new(1, dec!(0.50))).is_ok());
        assert_eq!(
            TotalsCalculator::validate_line(LineAmount::new(0, dec!(1))),
            Err(TotalsError::NonPositiveQuantity(0))
        );
        assert_eq!(
            TotalsCalculator::validate_line(LineAmount::new(1, dec!(-0.01))),
            Err(TotalsError::NegativePrice(dec!(-0.01)))
        );
    }
}
