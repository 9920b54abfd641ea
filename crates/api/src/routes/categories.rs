//! Category management routes.

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
use stockroom_db::repositories::category::{
    CategoryError, CategoryRepository, CreateCategoryInput, UpdateCategoryInput,
};

/// Creates the category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category).patch(update_category).delete(delete_category),
        )
}

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Category name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Request body for updating a category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// GET `/categories` - List all categories.
async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo.list().await {
        Ok(categories) => {
            (StatusCode::OK, Json(json!({ "categories": categories }))).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST `/categories` - Create a category.
async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    let input = CreateCategoryInput {
        name: payload.name,
        description: payload.description,
    };

    match repo.create(input).await {
        Ok(category) => (StatusCode::CREATED, Json(json!({ "category": category }))).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET `/categories/{id}` - Get a category.
async fn get_category(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo.find_by_id(id).await {
        Ok(Some(category)) => (StatusCode::OK, Json(json!({ "category": category }))).into_response(),
        Ok(None) => error_response(&CategoryError::NotFound(id)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// PATCH `/categories/{id}` - Update a category.
async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    let input = UpdateCategoryInput {
        name: payload.name,
        description: payload.description,
    };

    match repo.update(id, input).await {
        Ok(category) => (StatusCode::OK, Json(json!({ "category": category }))).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// DELETE `/categories/{id}` - Delete a category.
async fn delete_category(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Maps category errors to HTTP responses.
fn error_response(e: &CategoryError) -> (StatusCode, Json<serde_json::Value>) {
    match e {
        CategoryError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "category_not_found", "message": e.to_string() })),
        ),
        CategoryError::NameTaken(_) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "name_taken", "message": e.to_string() })),
        ),
        CategoryError::InUse { .. } => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "category_in_use", "message": e.to_string() })),
        ),
        CategoryError::Database(err) => {
            error!(error = %err, "Category operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
        }
    }
}
