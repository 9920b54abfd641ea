//! Derived monetary totals for purchase receipts and sales invoices.
//!
//! Documents never store hand-entered totals: every monetary field other
//! than the discount/tax rate inputs is recomputed from the current line
//! items whenever those items change.

pub mod calculator;
pub mod error;
pub mod types;

#[cfg(test)]
mod calculator_props;

pub use calculator::TotalsCalculator;
pub use error::TotalsError;
pub use types::{InvoiceTotals, LineAmount};
