//! Product management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use stockroom_db::entities::products;
use stockroom_db::repositories::product::{
    CreateProductInput, ProductError, ProductFilter, ProductRepository, UpdateProductInput,
};
use stockroom_db::repositories::stock::{MovementFilter, StockRepository};

/// Creates the product routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/products/{id}/stock", get(get_stock))
        .route("/products/{id}/transactions", get(list_product_transactions))
}

/// Query parameters for listing products.
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    /// Match name or SKU (substring).
    pub search: Option<String>,
    /// Filter by category.
    pub category: Option<Uuid>,
    /// Filter by supplier.
    pub supplier: Option<Uuid>,
    /// Only products at or below their reorder level.
    #[serde(default)]
    pub below_reorder: bool,
}

/// Request body for creating a product.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    /// Product name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional SKU.
    pub sku: Option<String>,
    /// Optional category reference.
    pub category_id: Option<Uuid>,
    /// Optional supplier reference.
    pub supplier_id: Option<Uuid>,
    /// Purchase cost per unit, as a decimal string.
    pub unit_price: String,
    /// Sale price per unit, as a decimal string.
    pub selling_price: String,
    /// Reorder threshold (default 10).
    pub reorder_level: Option<i64>,
}

/// Request body for updating a product.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New SKU.
    pub sku: Option<String>,
    /// New category reference.
    pub category_id: Option<Uuid>,
    /// New supplier reference.
    pub supplier_id: Option<Uuid>,
    /// New purchase cost, as a decimal string.
    pub unit_price: Option<String>,
    /// New sale price, as a decimal string.
    pub selling_price: Option<String>,
    /// New reorder threshold.
    pub reorder_level: Option<i64>,
}

/// Response for a product.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    /// Product ID.
    pub id: Uuid,
    /// Product name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// SKU.
    pub sku: Option<String>,
    /// Category reference.
    pub category_id: Option<Uuid>,
    /// Supplier reference.
    pub supplier_id: Option<Uuid>,
    /// Purchase cost per unit.
    pub unit_price: String,
    /// Sale price per unit.
    pub selling_price: String,
    /// Current stock level.
    pub quantity: i64,
    /// Reorder threshold.
    pub reorder_level: i64,
    /// Whether the product is at or below its reorder level.
    pub below_reorder_level: bool,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<products::Model> for ProductResponse {
    fn from(product: products::Model) -> Self {
        let below = product.is_below_reorder_level();
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            sku: product.sku,
            category_id: product.category_id,
            supplier_id: product.supplier_id,
            unit_price: product.unit_price.to_string(),
            selling_price: product.selling_price.to_string(),
            quantity: product.quantity,
            reorder_level: product.reorder_level,
            below_reorder_level: below,
            created_at: product.created_at.to_rfc3339(),
            updated_at: product.updated_at.to_rfc3339(),
        }
    }
}

/// GET `/products` - List products with filters.
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> impl IntoResponse {
    let repo = ProductRepository::new((*state.db).clone());

    let filter = ProductFilter {
        search: query.search,
        category_id: query.category,
        supplier_id: query.supplier,
        below_reorder: query.below_reorder,
    };

    match repo.list(filter).await {
        Ok(products) => {
            let items: Vec<ProductResponse> =
                products.into_iter().map(ProductResponse::from).collect();
            (StatusCode::OK, Json(json!({ "products": items }))).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST `/products` - Create a product with zero stock.
async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> impl IntoResponse {
    let repo = ProductRepository::new((*state.db).clone());

    let Ok(unit_price) = Decimal::from_str(&payload.unit_price) else {
        return invalid_price(&payload.unit_price).into_response();
    };
    let Ok(selling_price) = Decimal::from_str(&payload.selling_price) else {
        return invalid_price(&payload.selling_price).into_response();
    };

    let input = CreateProductInput {
        name: payload.name,
        description: payload.description,
        sku: payload.sku,
        category_id: payload.category_id,
        supplier_id: payload.supplier_id,
        unit_price,
        selling_price,
        reorder_level: payload.reorder_level.unwrap_or(10),
    };

    match repo.create(input).await {
        Ok(product) => (
            StatusCode::CREATED,
            Json(json!({ "product": ProductResponse::from(product) })),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET `/products/{id}` - Get a product.
async fn get_product(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = ProductRepository::new((*state.db).clone());

    match repo.find_by_id(id).await {
        Ok(Some(product)) => (
            StatusCode::OK,
            Json(json!({ "product": ProductResponse::from(product) })),
        )
            .into_response(),
        Ok(None) => error_response(&ProductError::NotFound(id)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// PATCH `/products/{id}` - Update a product.
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> impl IntoResponse {
    let repo = ProductRepository::new((*state.db).clone());

    let unit_price = match parse_optional_price(payload.unit_price.as_deref()) {
        Ok(price) => price,
        Err(response) => return response.into_response(),
    };
    let selling_price = match parse_optional_price(payload.selling_price.as_deref()) {
        Ok(price) => price,
        Err(response) => return response.into_response(),
    };

    let input = UpdateProductInput {
        name: payload.name,
        description: payload.description,
        sku: payload.sku,
        category_id: payload.category_id,
        supplier_id: payload.supplier_id,
        unit_price,
        selling_price,
        reorder_level: payload.reorder_level,
    };

    match repo.update(id, input).await {
        Ok(product) => (
            StatusCode::OK,
            Json(json!({ "product": ProductResponse::from(product) })),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// DELETE `/products/{id}` - Delete a product.
async fn delete_product(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = ProductRepository::new((*state.db).clone());

    match repo.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET `/products/{id}/stock` - Authoritative stock level.
async fn get_stock(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = ProductRepository::new((*state.db).clone());

    match repo.find_by_id(id).await {
        Ok(Some(product)) => (
            StatusCode::OK,
            Json(json!({
                "product_id": product.id,
                "quantity": product.quantity,
                "reorder_level": product.reorder_level,
                "below_reorder_level": product.is_below_reorder_level(),
            })),
        )
            .into_response(),
        Ok(None) => error_response(&ProductError::NotFound(id)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Query parameters for a product's transaction history.
#[derive(Debug, Deserialize)]
pub struct ProductTransactionsQuery {
    /// Maximum number of rows (default 50).
    pub limit: Option<u64>,
}

/// GET `/products/{id}/transactions` - Recent stock movements.
async fn list_product_transactions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ProductTransactionsQuery>,
) -> impl IntoResponse {
    let products = ProductRepository::new((*state.db).clone());
    match products.find_by_id(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(&ProductError::NotFound(id)).into_response(),
        Err(e) => return error_response(&e).into_response(),
    }

    let stock = StockRepository::new((*state.db).clone());
    let filter = MovementFilter {
        product_id: Some(id),
        limit: Some(query.limit.unwrap_or(50)),
        ..MovementFilter::default()
    };

    match stock.list(filter).await {
        Ok(transactions) => {
            (StatusCode::OK, Json(json!({ "transactions": transactions }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list product transactions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
                .into_response()
        }
    }
}

/// Response for an unparseable price field.
fn invalid_price(value: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_price",
            "message": format!("Not a valid decimal amount: {value}"),
        })),
    )
}

/// Parses an optional decimal-string price.
fn parse_optional_price(
    value: Option<&str>,
) -> Result<Option<Decimal>, (StatusCode, Json<serde_json::Value>)> {
    match value {
        None => Ok(None),
        Some(raw) => Decimal::from_str(raw)
            .map(Some)
            .map_err(|_| invalid_price(raw)),
    }
}

/// Maps product errors to HTTP responses.
fn error_response(e: &ProductError) -> (StatusCode, Json<serde_json::Value>) {
    match e {
        ProductError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "product_not_found", "message": e.to_string() })),
        ),
        ProductError::CategoryNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "category_not_found", "message": e.to_string() })),
        ),
        ProductError::SupplierNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "supplier_not_found", "message": e.to_string() })),
        ),
        ProductError::SkuTaken(_) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "sku_taken", "message": e.to_string() })),
        ),
        ProductError::NegativePrice(_) | ProductError::NegativeReorderLevel(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "validation_failed", "message": e.to_string() })),
        ),
        ProductError::InUse { .. } => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "product_in_use", "message": e.to_string() })),
        ),
        ProductError::Database(err) => {
            error!(error = %err, "Product operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
        }
    }
}
