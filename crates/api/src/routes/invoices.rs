//! Sales invoice routes.

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
use stockroom_db::entities::{invoice_items, invoices};
use stockroom_db::repositories::invoice::{
    AddInvoiceItemInput, CreateInvoiceInput, InvoiceError, InvoiceFilter, InvoiceRepository,
    InvoiceWithItems, UpdateInvoiceInput, UpdateInvoiceItemInput,
};
use stockroom_db::repositories::stock::StockLedgerError;

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route(
            "/invoices/{id}",
            get(get_invoice).patch(update_invoice).delete(delete_invoice),
        )
        .route("/invoices/{id}/items", axum::routing::post(add_item))
        .route(
            "/invoices/{id}/items/{item_id}",
            axum::routing::patch(update_item).delete(remove_item),
        )
}

/// Query parameters for listing invoices.
#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    /// Match customer name (substring).
    pub customer: Option<String>,
    /// Match invoice number exactly.
    pub number: Option<String>,
    /// Sales on or after this date (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Sales on or before this date (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
}

/// Request body for creating an invoice.
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    /// Unique invoice number.
    pub invoice_number: String,
    /// Customer name.
    pub customer_name: Option<String>,
    /// Sale date (YYYY-MM-DD).
    pub sale_date: NaiveDate,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Discount rate in percent, as a decimal string (default 0).
    pub discount_rate: Option<String>,
    /// Tax rate in percent, as a decimal string (default 0).
    pub tax_rate: Option<String>,
    /// Optional notes.
    pub notes: Option<String>,
    /// Acting user.
    pub actor_id: Option<Uuid>,
}

/// Request body for updating invoice header fields.
///
/// Omitting a nullable field leaves it unchanged; sending `null` clears
/// it.
#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceRequest {
    /// New customer name.
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub customer_name: Option<Option<String>>,
    /// New sale date.
    pub sale_date: Option<NaiveDate>,
    /// New due date.
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    /// New discount rate, as a decimal string.
    pub discount_rate: Option<String>,
    /// New tax rate, as a decimal string.
    pub tax_rate: Option<String>,
    /// New notes.
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub notes: Option<Option<String>>,
}

/// Request body for adding an invoice line item.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Product sold.
    pub product_id: Uuid,
    /// Units sold (positive).
    pub quantity: i64,
    /// Sale price per unit, as a decimal string.
    pub unit_price: String,
    /// Acting user.
    pub actor_id: Option<Uuid>,
}

/// Request body for updating an invoice line item.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    /// New quantity.
    pub quantity: Option<i64>,
    /// New sale price, as a decimal string.
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

/// Response for an invoice header.
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    /// Invoice ID.
    pub id: Uuid,
    /// Invoice number.
    pub invoice_number: String,
    /// Customer name.
    pub customer_name: Option<String>,
    /// Sale date.
    pub sale_date: String,
    /// Due date.
    pub due_date: Option<String>,
    /// Sum of line amounts.
    pub sub_total: String,
    /// Discount rate in percent.
    pub discount_rate: String,
    /// Derived discount amount.
    pub discount_amount: String,
    /// Tax rate in percent.
    pub tax_rate: String,
    /// Derived tax amount.
    pub tax_amount: String,
    /// Grand total.
    pub total_amount: String,
    /// Notes.
    pub notes: Option<String>,
    /// Acting user who created the invoice.
    pub created_by: Option<Uuid>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<invoices::Model> for InvoiceResponse {
    fn from(invoice: invoices::Model) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            customer_name: invoice.customer_name,
            sale_date: invoice.sale_date.to_string(),
            due_date: invoice.due_date.map(|d| d.to_string()),
            sub_total: invoice.sub_total.to_string(),
            discount_rate: invoice.discount_rate.to_string(),
            discount_amount: invoice.discount_amount.to_string(),
            tax_rate: invoice.tax_rate.to_string(),
            tax_amount: invoice.tax_amount.to_string(),
            total_amount: invoice.total_amount.to_string(),
            notes: invoice.notes,
            created_by: invoice.created_by,
            created_at: invoice.created_at.to_rfc3339(),
            updated_at: invoice.updated_at.to_rfc3339(),
        }
    }
}

/// Response for an invoice line item.
#[derive(Debug, Serialize)]
pub struct InvoiceItemResponse {
    /// Item ID.
    pub id: Uuid,
    /// Product sold.
    pub product_id: Uuid,
    /// Units sold.
    pub quantity: i64,
    /// Sale price per unit.
    pub unit_price: String,
}

impl From<invoice_items::Model> for InvoiceItemResponse {
    fn from(item: invoice_items::Model) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price.to_string(),
        }
    }
}

/// Serializes an invoice with its items.
fn with_items_json(with_items: InvoiceWithItems) -> serde_json::Value {
    let items: Vec<InvoiceItemResponse> = with_items
        .items
        .into_iter()
        .map(InvoiceItemResponse::from)
        .collect();
    json!({
        "invoice": InvoiceResponse::from(with_items.invoice),
        "items": items,
    })
}

/// Response for an unparseable rate field.
fn invalid_rate(value: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_rate",
            "message": format!("Not a valid decimal rate: {value}"),
        })),
    )
}

/// Parses an optional decimal-string rate.
fn parse_optional_rate(
    value: Option<&str>,
) -> Result<Option<Decimal>, (StatusCode, Json<serde_json::Value>)> {
    match value {
        None => Ok(None),
        Some(raw) => Decimal::from_str(raw)
            .map(Some)
            .map_err(|_| invalid_rate(raw)),
    }
}

/// GET `/invoices` - List invoices with filters.
async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListInvoicesQuery>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    let filter = InvoiceFilter {
        customer: query.customer,
        number: query.number,
        date_from: query.from,
        date_to: query.to,
    };

    match repo.list(filter).await {
        Ok(list) => {
            let items: Vec<InvoiceResponse> = list.into_iter().map(InvoiceResponse::from).collect();
            (StatusCode::OK, Json(json!({ "invoices": items }))).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST `/invoices` - Create an empty invoice.
async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> impl IntoResponse {
    let discount_rate = match parse_optional_rate(payload.discount_rate.as_deref()) {
        Ok(rate) => rate.unwrap_or(Decimal::ZERO),
        Err(response) => return response.into_response(),
    };
    let tax_rate = match parse_optional_rate(payload.tax_rate.as_deref()) {
        Ok(rate) => rate.unwrap_or(Decimal::ZERO),
        Err(response) => return response.into_response(),
    };

    let repo = InvoiceRepository::new((*state.db).clone());
    let input = CreateInvoiceInput {
        invoice_number: payload.invoice_number,
        customer_name: payload.customer_name,
        sale_date: payload.sale_date,
        due_date: payload.due_date,
        discount_rate,
        tax_rate,
        notes: payload.notes,
        created_by: payload.actor_id,
    };

    match repo.create(input).await {
        Ok(invoice) => (
            StatusCode::CREATED,
            Json(json!({ "invoice": InvoiceResponse::from(invoice) })),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET `/invoices/{id}` - Get an invoice with its items.
async fn get_invoice(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    match repo.get(id).await {
        Ok(with_items) => (StatusCode::OK, Json(with_items_json(with_items))).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// PATCH `/invoices/{id}` - Update invoice header fields. Rate changes
/// recompute the derived totals.
async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> impl IntoResponse {
    let discount_rate = match parse_optional_rate(payload.discount_rate.as_deref()) {
        Ok(rate) => rate,
        Err(response) => return response.into_response(),
    };
    let tax_rate = match parse_optional_rate(payload.tax_rate.as_deref()) {
        Ok(rate) => rate,
        Err(response) => return response.into_response(),
    };

    let repo = InvoiceRepository::new((*state.db).clone());
    let input = UpdateInvoiceInput {
        customer_name: payload.customer_name,
        sale_date: payload.sale_date,
        due_date: payload.due_date,
        discount_rate,
        tax_rate,
        notes: payload.notes,
    };

    match repo.update(id, input).await {
        Ok(invoice) => (
            StatusCode::OK,
            Json(json!({ "invoice": InvoiceResponse::from(invoice) })),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// DELETE `/invoices/{id}` - Delete an invoice, returning its units to
/// stock.
async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActorQuery>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    match repo.delete(id, query.actor_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST `/invoices/{id}/items` - Add a line item (stock-decreasing).
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

    let repo = InvoiceRepository::new((*state.db).clone());
    let input = AddInvoiceItemInput {
        product_id: payload.product_id,
        quantity: payload.quantity,
        unit_price,
        created_by: payload.actor_id,
    };

    match repo.add_item(id, input).await {
        Ok(item) => (
            StatusCode::CREATED,
            Json(json!({ "item": InvoiceItemResponse::from(item) })),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// PATCH `/invoices/{id}/items/{item_id}` - Update a line item.
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

    let repo = InvoiceRepository::new((*state.db).clone());
    let input = UpdateInvoiceItemInput {
        quantity: payload.quantity,
        unit_price,
        created_by: payload.actor_id,
    };

    match repo.update_item(id, item_id, input).await {
        Ok(item) => (
            StatusCode::OK,
            Json(json!({ "item": InvoiceItemResponse::from(item) })),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// DELETE `/invoices/{id}/items/{item_id}` - Remove a line item.
async fn remove_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ActorQuery>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    match repo.remove_item(id, item_id, query.actor_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Maps invoice errors to HTTP responses.
fn error_response(e: &InvoiceError) -> (StatusCode, Json<serde_json::Value>) {
    match e {
        InvoiceError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "invoice_not_found", "message": e.to_string() })),
        ),
        InvoiceError::ItemNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "invoice_item_not_found", "message": e.to_string() })),
        ),
        InvoiceError::NumberTaken(_) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "number_taken", "message": e.to_string() })),
        ),
        InvoiceError::Validation(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "validation_failed", "message": e.to_string() })),
        ),
        InvoiceError::Stock(stock) => super::transactions::error_response(stock),
        InvoiceError::Reversal(StockLedgerError::Database(err)) => {
            error!(error = %err, "Invoice reversal failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
        }
        InvoiceError::Reversal(_) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "reversal_failed", "message": e.to_string() })),
        ),
        InvoiceError::Database(err) => {
            error!(error = %err, "Invoice operation failed");
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
        let patch: UpdateInvoiceRequest =
            serde_json::from_str(r#"{"due_date": null, "customer_name": "Acme"}"#)
                .expect("valid patch");
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.customer_name, Some(Some("Acme".to_string())));
        assert_eq!(patch.notes, None);

        let patch: UpdateInvoiceRequest = serde_json::from_str("{}").expect("valid patch");
        assert_eq!(patch.due_date, None);
        assert_eq!(patch.customer_name, None);
        assert_eq!(patch.notes, None);
    }
}
