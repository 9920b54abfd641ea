//! Domain types for document totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A line item reduced to the two fields that matter for totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmount {
    /// Line quantity (positive).
    pub quantity: i64,
    /// Unit price for this line.
    pub unit_price: Decimal,
}

impl LineAmount {
    /// Creates a new line amount.
    #[must_use]
    pub const fn new(quantity: i64, unit_price: Decimal) -> Self {
        Self {
            quantity,
            unit_price,
        }
    }

    /// The extended amount for this line (quantity x unit price).
    #[must_use]
    pub fn extended(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

/// Derived totals for a sales invoice.
///
/// All fields are computed; the discount and tax rates that produced
/// them are inputs held on the invoice itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Sum of extended line amounts.
    pub sub_total: Decimal,
    /// Discount applied to the sub-total.
    pub discount_amount: Decimal,
    /// Tax applied after the discount.
    pub tax_amount: Decimal,
    /// Final amount: `sub_total - discount_amount + tax_amount`.
    pub total_amount: Decimal,
}

impl InvoiceTotals {
    /// Totals for an invoice with no items.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            sub_total: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_extended_amount() {
        let line = LineAmount::new(3, dec!(20.00));
        assert_eq!(line.extended(), dec!(60.00));
    }

    #[test]
    fn test_zero_totals() {
        let totals = InvoiceTotals::zero();
        assert_eq!(totals.sub_total, Decimal::ZERO);
        assert_eq!(totals.total_amount, Decimal::ZERO);
    }
}
