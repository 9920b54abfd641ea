//! Purchase receipt routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use stockroom_db::repositories::receipt::{
    AddReceiptItemInput, CreateReceiptInput, ReceiptError, ReceiptFilter, ReceiptRepository,
    ReceiptWithItems, UpdateReceiptInput, UpdateReceiptItemInput,
};
use stockroom_db::repositories::stock::StockLedgerError;
use stockroom_db::entities::{receipt_items, receipts};

/// Creates the receipt routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/receipts", get(list_receipts).post(create_receipt))
        .route(
            "/receipts/{id}",
            get(get_receipt).patch(update_receipt).delete(delete_receipt),
        )
        .route("/receipts/{id}/items", axum::routing::post(add_item))
        .route(
            "/receipts/{id}/items/{item_id}",
            axum::routing::patch(update_item).delete(remove_item),
        )
}

/// Query parameters for listing receipts.
#[derive(Debug, Deserialize)]
pub struct ListReceiptsQuery {
    /// Filter by supplier.
    pub supplier: Option<Uuid>,
    /// Purchases on or after this date (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Purchases on or before this date (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
}

/// Request body for creating a receipt.
#[derive(Debug, Deserialize)]
pub struct CreateReceiptRequest {
    /// Unique receipt number.
    pub receipt_number: String,
    /// Optional supplier reference.
    pub supplier_id: Option<Uuid>,
    /// Purchase date (YYYY-MM-DD).
    pub purchase_date: NaiveDate,
    /// Optional notes.
    pub notes: Option<String>,
    /// Acting user.
    pub actor_id: Option<Uuid>,
}

/// Request body for updating receipt header fields.
///
/// Omitting a nullable field leaves it unchanged; sending `null` clears
/// it.
#[derive(Debug, Deserialize)]
pub struct UpdateReceiptRequest {
    /// New supplier reference.
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub supplier_id: Option<Option<Uuid>>,
    /// New purchase date.
    pub purchase_date: Option<NaiveDate>,
    /// New notes.
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub notes: Option<Option<String>>,
}

/// Request body for adding a receipt line item.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Product received.
    pub product_id: Uuid,
    /// Units received (positive).
    pub quantity: i64,
    /// Purchase price per unit, as a decimal string.
    pub unit_price: String,
    /// Acting user.
    pub actor_id: Option<Uuid>,
}

/// Request body for updating a receipt line item.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    /// New quantity.
    pub quantity: Option<i64>,
    /// New purchase price, as a decimal string.
    pub unit_price: Option<String>,
    /// Acting user.
    pub actor_id: Option<Uuid>,
}

/// Query parameters carrying the acting user for deletions.
#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    /// Acting user.
    pub actor_id: Option<Uuid>,
}

/// Response for a receipt header.
#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    /// Receipt ID.
    pub id: Uuid,
    /// Receipt number.
    pub receipt_number: String,
    /// Supplier reference.
    pub supplier_id: Option<Uuid>,
    /// Purchase date.
    pub purchase_date: String,
    /// Derived total.
    pub total_amount: String,
    /// Notes.
    pub notes: Option<String>,
    /// Acting user who created the receipt.
    pub created_by: Option<Uuid>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<receipts::Model> for ReceiptResponse {
    fn from(receipt: receipts::Model) -> Self {
        Self {
            id: receipt.id,
            receipt_number: receipt.receipt_number,
            supplier_id: receipt.supplier_id,
            purchase_date: receipt.purchase_date.to_string(),
            total_amount: receipt.total_amount.to_string(),
            notes: receipt.notes,
            created_by: receipt.created_by,
            created_at: receipt.created_at.to_rfc3339(),
            updated_at: receipt.updated_at.to_rfc3339(),
        }
    }
}

/// Response for a receipt line item.
#[derive(Debug, Serialize)]
pub struct ReceiptItemResponse {
    /// Item ID.
    pub id: Uuid,
    /// Product received.
    pub product_id: Uuid,
    /// Units received.
    pub quantity: i64,
    /// Purchase price per unit.
    pub unit_price: String,
}

impl From<receipt_items::Model> for ReceiptItemResponse {
    fn from(item: receipt_items::Model) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price.to_string(),
        }
    }
}

/// Serializes a receipt with its items.
fn with_items_json(with_items: ReceiptWithItems) -> serde_json::Value {
    let items: Vec<ReceiptItemResponse> = with_items
        .items
        .into_iter()
        .map(ReceiptItemResponse::from)
        .collect();
    json!({
        "receipt": ReceiptResponse::from(with_items.receipt),
        "items": items,
    })
}

/// GET `/receipts` - List receipts with filters.
async fn list_receipts(
    State(state): State<AppState>,
    Query(query): Query<ListReceiptsQuery>,
) -> impl IntoResponse {
    let repo = ReceiptRepository::new((*state.db).clone());

    let filter = ReceiptFilter {
        supplier_id: query.supplier,
        date_from: query.from,
        date_to: query.to,
    };

    match repo.list(filter).await {
        Ok(list) => {
            let items: Vec<ReceiptResponse> = list.into_iter().map(ReceiptResponse::from).collect();
            (StatusCode::OK, Json(json!({ "receipts": items }))).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST `/receipts` - Create an empty receipt.
async fn create_receipt(
    State(state): State<AppState>,
    Json(payload): Json<CreateReceiptRequest>,
) -> impl IntoResponse {
    let repo = ReceiptRepository::new((*state.db).clone());

    let input = CreateReceiptInput {
        receipt_number: payload.receipt_number,
        supplier_id: payload.supplier_id,
        purchase_date: payload.purchase_date,
        notes: payload.notes,
        created_by: payload.actor_id,
    };

    match repo.create(input).await {
        Ok(receipt) => (
            StatusCode::CREATED,
            Json(json!({ "receipt": ReceiptResponse::from(receipt) })),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET `/receipts/{id}` - Get a receipt with its items.
async fn get_receipt(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = ReceiptRepository::new((*state.db).clone());

    match repo.get(id).await {
        Ok(with_items) => (StatusCode::OK, Json(with_items_json(with_items))).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// PATCH `/receipts/{id}` - Update receipt header fields.
async fn update_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReceiptRequest>,
) -> impl IntoResponse {
    let repo = ReceiptRepository::new((*state.db).clone());

    let input = UpdateReceiptInput {
        supplier_id: payload.supplier_id,
        purchase_date: payload.purchase_date,
        notes: payload.notes,
    };

    match repo.update(id, input).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(json!({ "receipt": ReceiptResponse::from(receipt) })),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// DELETE `/receipts/{id}` - Delete a receipt, reversing its stock effect.
async fn delete_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActorQuery>,
) -> impl IntoResponse {
    let repo = ReceiptRepository::new((*state.db).clone());

    match repo.delete(id, query.actor_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST `/receipts/{id}/items` - Add a line item (stock-increasing).
async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddItemRequest>,
) -> impl IntoResponse {
    let Ok(unit_price) = Decimal::from_str(&payload.unit_price) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_price",
                "message": format!("Not a valid decimal amount: {}", payload.unit_price),
            })),
        )
            .into_response();
    };

    let repo = ReceiptRepository::new((*state.db).clone());
    let input = AddReceiptItemInput {
        product_id: payload.product_id,
        quantity: payload.quantity,
        unit_price,
        created_by: payload.actor_id,
    };

    match repo.add_item(id, input).await {
        Ok(item) => (
            StatusCode::CREATED,
            Json(json!({ "item": ReceiptItemResponse::from(item) })),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// PATCH `/receipts/{id}/items/{item_id}` - Update a line item.
async fn update_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateItemRequest>,
) -> impl IntoResponse {
    let unit_price = match payload.unit_price.as_deref() {
        None => None,
        Some(raw) => match Decimal::from_str(raw) {
            Ok(price) => Some(price),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_price",
                        "message": format!("Not a valid decimal amount: {raw}"),
                    })),
                )
                    .into_response();
            }
        },
    };

    let repo = ReceiptRepository::new((*state.db).clone());
    let input = UpdateReceiptItemInput {
        quantity: payload.quantity,
        unit_price,
        created_by: payload.actor_id,
    };

    match repo.update_item(id, item_id, input).await {
        Ok(item) => (
            StatusCode::OK,
            Json(json!({ "item": ReceiptItemResponse::from(item) })),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// DELETE `/receipts/{id}/items/{item_id}` - Remove a line item.
async fn remove_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ActorQuery>,
) -> impl IntoResponse {
    let repo = ReceiptRepository::new((*state.db).clone());

    match repo.remove_item(id, item_id, query.actor_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Maps receipt errors to HTTP responses.
fn error_response(e: &ReceiptError) -> (StatusCode, Json<serde_json::Value>) {
    match e {
        ReceiptError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "receipt_not_found", "message": e.to_string() })),
        ),
        ReceiptError::ItemNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "receipt_item_not_found", "message": e.to_string() })),
        ),
        ReceiptError::SupplierNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "supplier_not_found", "message": e.to_string() })),
        ),
        ReceiptError::NumberTaken(_) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "number_taken", "message": e.to_string() })),
        ),
        ReceiptError::Line(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "validation_failed", "message": e.to_string() })),
        ),
        ReceiptError::Stock(stock) => super::transactions::error_response(stock),
        ReceiptError::Reversal(StockLedgerError::Database(err)) => {
            error!(error = %err, "Receipt reversal failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
        }
        ReceiptError::Reversal(_) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "reversal_failed", "message": e.to_string() })),
        ),
        ReceiptError::Database(err) => {
            error!(error = %err, "Receipt operation failed");
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
    fn test_update_request_distinguishes_null_from_absent() {
        let patch: UpdateReceiptRequest =
            serde_json::from_str(r#"{"notes": null}"#).expect("valid patch");
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.supplier_id, None);

        let patch: UpdateReceiptRequest =
            serde_json::from_str(r#"{"notes": "restock", "supplier_id": null}"#)
                .expect("valid patch");
        assert_eq!(patch.notes, Some(Some("restock".to_string())));
        assert_eq!(patch.supplier_id, Some(None));

        let patch: UpdateReceiptRequest = serde_json::from_str("{}").expect("valid patch");
        assert_eq!(patch.notes, None);
        assert_eq!(patch.supplier_id, None);
    }
}
