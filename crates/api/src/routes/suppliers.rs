//! Supplier management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use stockroom_db::repositories::supplier::{
    CreateSupplierInput, SupplierError, SupplierRepository, UpdateSupplierInput,
};

/// Creates the supplier routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/suppliers/{id}",
            get(get_supplier).patch(update_supplier).delete(delete_supplier),
        )
}

/// Request body for creating a supplier.
#[derive(Debug, Deserialize)]
pub struct CreateSupplierRequest {
    /// Supplier name.
    pub name: String,
    /// Contact person.
    pub contact_person: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// Request body for updating a supplier.
#[derive(Debug, Deserialize)]
pub struct UpdateSupplierRequest {
    /// New name.
    pub name: Option<String>,
    /// New contact person.
    pub contact_person: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New phone.
    pub phone: Option<String>,
    /// New address.
    pub address: Option<String>,
}

/// GET `/suppliers` - List all suppliers.
async fn list_suppliers(State(state): State<AppState>) -> impl IntoResponse {
    let repo = SupplierRepository::new((*state.db).clone());

    match repo.list().await {
        Ok(suppliers) => (StatusCode::OK, Json(json!({ "suppliers": suppliers }))).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST `/suppliers` - Create a supplier.
async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplierRequest>,
) -> impl IntoResponse {
    let repo = SupplierRepository::new((*state.db).clone());

    let input = CreateSupplierInput {
        name: payload.name,
        contact_person: payload.contact_person,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
    };

    match repo.create(input).await {
        Ok(supplier) => (StatusCode::CREATED, Json(json!({ "supplier": supplier }))).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET `/suppliers/{id}` - Get a supplier.
async fn get_supplier(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = SupplierRepository::new((*state.db).clone());

    match repo.find_by_id(id).await {
        Ok(Some(supplier)) => (StatusCode::OK, Json(json!({ "supplier": supplier }))).into_response(),
        Ok(None) => error_response(&SupplierError::NotFound(id)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// PATCH `/suppliers/{id}` - Update a supplier.
async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSupplierRequest>,
) -> impl IntoResponse {
    let repo = SupplierRepository::new((*state.db).clone());

    let input = UpdateSupplierInput {
        name: payload.name,
        contact_person: payload.contact_person,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
    };

    match repo.update(id, input).await {
        Ok(supplier) => (StatusCode::OK, Json(json!({ "supplier": supplier }))).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// DELETE `/suppliers/{id}` - Delete a supplier.
async fn delete_supplier(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = SupplierRepository::new((*state.db).clone());

    match repo.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Maps supplier errors to HTTP responses.
fn error_response(e: &SupplierError) -> (StatusCode, Json<serde_json::Value>) {
    match e {
        SupplierError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "supplier_not_found", "message": e.to_string() })),
        ),
        SupplierError::NameTaken(_) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "name_taken", "message": e.to_string() })),
        ),
        SupplierError::InUse { .. } => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "supplier_in_use", "message": e.to_string() })),
        ),
        SupplierError::Database(err) => {
            error!(error = %err, "Supplier operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
        }
    }
}
