//! API route definitions.

use axum::Router;
use serde::{Deserialize, Deserializer};

use crate::AppState;

pub mod categories;
pub mod dashboard;
pub mod health;
pub mod invoices;
pub mod products;
pub mod receipts;
pub mod reports;
pub mod suppliers;
pub mod transactions;

/// Deserializes a nullable PATCH field: an absent field leaves the value
/// unchanged, an explicit `null` clears it.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(categories::routes())
        .merge(suppliers::routes())
        .merge(products::routes())
        .merge(transactions::routes())
        .merge(receipts::routes())
        .merge(invoices::routes())
        .merge(reports::routes())
        .merge(dashboard::routes())
}
