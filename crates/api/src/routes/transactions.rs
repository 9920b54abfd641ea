//! Stock transaction routes.
//!
//! Listing the audit trail plus the manual adjustment path; document
//! flows record their movements through the receipt/invoice lifecycles.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use stockroom_core::stock::{MovementKind, StockMovement};
use stockroom_db::entities::sea_orm_active_enums::StockMovementKind;
use stockroom_db::repositories::stock::{
    MovementFilter, RecordMovementInput, StockLedgerError, StockRepository,
};

/// Creates the stock transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/transactions", get(list_transactions).post(create_transaction))
}

/// Query parameters for listing stock transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Filter by product.
    pub product: Option<Uuid>,
    /// Filter by kind (`in`, `out`, `adj`).
    pub kind: Option<String>,
    /// Movements at or after this instant (RFC 3339).
    pub from: Option<DateTime<Utc>>,
    /// Movements at or before this instant (RFC 3339).
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of rows (default 100).
    pub limit: Option<u64>,
}

/// Request body for recording a manual stock movement.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Product whose level changes.
    pub product_id: Uuid,
    /// Movement kind (`in`, `out`, `adj`).
    pub kind: String,
    /// Quantity: positive for `in`/`out`, signed for `adj`.
    pub quantity: i64,
    /// Optional notes.
    pub notes: Option<String>,
    /// Acting user.
    pub actor_id: Option<Uuid>,
}

/// GET `/transactions` - List stock transactions with filters.
async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListTransactionsQuery>,
) -> impl IntoResponse {
    let kind = match query.kind.as_deref() {
        None => None,
        Some(raw) => match MovementKind::from_str(raw) {
            Ok(kind) => Some(StockMovementKind::from(kind)),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_kind",
                        "message": format!("Unknown movement kind: {raw}"),
                    })),
                )
                    .into_response();
            }
        },
    };

    let repo = StockRepository::new((*state.db).clone());
    let filter = MovementFilter {
        product_id: query.product,
        kind,
        occurred_from: query.from,
        occurred_to: query.to,
        limit: Some(query.limit.unwrap_or(100)),
    };

    match repo.list(filter).await {
        Ok(transactions) => {
            (StatusCode::OK, Json(json!({ "transactions": transactions }))).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST `/transactions` - Record a manual stock movement.
async fn create_transaction(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> impl IntoResponse {
    let Ok(kind) = MovementKind::from_str(&payload.kind) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_kind",
                "message": format!("Unknown movement kind: {}", payload.kind),
            })),
        )
            .into_response();
    };

    let repo = StockRepository::new((*state.db).clone());
    let input = RecordMovementInput {
        product_id: payload.product_id,
        movement: StockMovement::new(kind, payload.quantity),
        notes: payload.notes,
        created_by: payload.actor_id,
    };

    match repo.record(input).await {
        Ok(transaction) => {
            (StatusCode::CREATED, Json(json!({ "transaction": transaction }))).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// Maps stock ledger errors to HTTP responses.
pub(crate) fn error_response(e: &StockLedgerError) -> (StatusCode, Json<serde_json::Value>) {
    match e {
        StockLedgerError::ProductNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "product_not_found", "message": e.to_string() })),
        ),
        StockLedgerError::InsufficientStock { .. } => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "insufficient_stock", "message": e.to_string() })),
        ),
        StockLedgerError::NegativeStock { .. } => {
            // Integrity violation: log the detail, return a generic failure.
            error!(error = %e, "Stock level would go negative");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
        }
        StockLedgerError::InvalidMovement(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_movement", "message": e.to_string() })),
        ),
        StockLedgerError::Database(err) => {
            error!(error = %err, "Stock operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_stock_surfaces_as_generic_failure() {
        let e = StockLedgerError::NegativeStock {
            product: "Widget".to_string(),
            current: 3,
            delta: -5,
        };

        let (status, Json(body)) = error_response(&e);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "An error occurred");
    }

    #[test]
    fn test_insufficient_stock_keeps_its_context() {
        let e = StockLedgerError::InsufficientStock {
            product: "Widget".to_string(),
            available: 7,
            requested: 10,
        };

        let (status, Json(body)) = error_response(&e);
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "insufficient_stock");
    }
}
