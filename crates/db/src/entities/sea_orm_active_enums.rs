//! Active enums backing Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of a stock transaction row.
///
/// `In` and `Out` rows always carry positive quantities; `Adjustment`
/// rows carry a signed quantity that is applied as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "stock_movement_kind")]
#[serde(rename_all = "lowercase")]
pub enum StockMovementKind {
    /// Stock received (purchase receipt line or manual stock-in).
    #[sea_orm(string_value = "in")]
    In,
    /// Stock sold (invoice line or manual stock-out).
    #[sea_orm(string_value = "out")]
    Out,
    /// Signed correction, including compensating reversals.
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

impl From<stockroom_core::stock::MovementKind> for StockMovementKind {
    fn from(kind: stockroom_core::stock::MovementKind) -> Self {
        match kind {
            stockroom_core::stock::MovementKind::In => Self::In,
            stockroom_core::stock::MovementKind::Out => Self::Out,
            stockroom_core::stock::MovementKind::Adjustment => Self::Adjustment,
        }
    }
}
