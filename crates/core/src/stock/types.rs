//! Stock movement domain types.
//!
//! A movement is the unit of change against a product's stock level.
//! Every stock change in the system is expressed as one of these before
//! it is persisted to the audit trail.

use serde::{Deserialize, Serialize};

/// Kind of stock movement.
///
/// Stock in and stock out always carry positive quantities; adjustments
/// carry a signed quantity that is applied as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock received (purchases, returns from customers).
    In,
    /// Stock leaving (sales).
    Out,
    /// Manual correction or reversal; quantity is signed.
    Adjustment,
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::In => write!(f, "IN"),
            Self::Out => write!(f, "OUT"),
            Self::Adjustment => write!(f, "ADJ"),
        }
    }
}

impl std::str::FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            "ADJ" | "ADJUSTMENT" => Ok(Self::Adjustment),
            _ => Err(format!("Unknown movement kind: {s}")),
        }
    }
}

/// A single stock movement against one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockMovement {
    /// The movement kind.
    pub kind: MovementKind,
    /// The movement quantity. Positive for In/Out; signed for Adjustment.
    pub quantity: i64,
}

impl StockMovement {
    /// Creates a new stock movement.
    #[must_use]
    pub const fn new(kind: MovementKind, quantity: i64) -> Self {
        Self { kind, quantity }
    }

    /// Returns the signed change this movement applies to a stock level.
    ///
    /// In adds, Out subtracts, Adjustment applies its quantity as given
    /// (sign included).
    #[must_use]
    pub const fn delta(&self) -> i64 {
        match self.kind {
            MovementKind::In => self.quantity,
            MovementKind::Out => -self.quantity,
            MovementKind::Adjustment => self.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_movement_kind_display() {
        assert_eq!(MovementKind::In.to_string(), "IN");
        assert_eq!(MovementKind::Out.to_string(), "OUT");
        assert_eq!(MovementKind::Adjustment.to_string(), "ADJ");
    }

    #[test]
    fn test_movement_kind_from_str() {
        assert_eq!(MovementKind::from_str("IN").unwrap(), MovementKind::In);
        assert_eq!(MovementKind::from_str("in").unwrap(), MovementKind::In);
        assert_eq!(MovementKind::from_str("OUT").unwrap(), MovementKind::Out);
        assert_eq!(
            MovementKind::from_str("ADJ").unwrap(),
            MovementKind::Adjustment
        );
        assert_eq!(
            MovementKind::from_str("adjustment").unwrap(),
            MovementKind::Adjustment
        );
        assert!(MovementKind::from_str("SIDEWAYS").is_err());
    }

    #[test]
    fn test_in_delta_is_positive() {
        assert_eq!(StockMovement::new(MovementKind::In, 5).delta(), 5);
    }

    #[test]
    fn test_out_delta_is_negative() {
        assert_eq!(StockMovement::new(MovementKind::Out, 5).delta(), -5);
    }

    #[test]
    fn test_adjustment_delta_keeps_sign() {
        assert_eq!(StockMovement::new(MovementKind::Adjustment, 3).delta(), 3);
        assert_eq!(
            StockMovement::new(MovementKind::Adjustment, -3).delta(),
            -3
        );
    }
}
