//! Stock ledger rules.
//!
//! This module implements the core stock-keeping logic:
//! - Movement kinds (stock in, stock out, adjustment)
//! - Signed quantity deltas per movement
//! - Non-negativity enforcement when applying movements
//! - Folding a movement history into a current stock level
//! - Error types for stock operations

pub mod error;
pub mod ledger;
pub mod types;

#[cfg(test)]
mod ledger_props;

pub use error::StockError;
pub use ledger::StockLedger;
pub use types::{MovementKind, StockMovement};
