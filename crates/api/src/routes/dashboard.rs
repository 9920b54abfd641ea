//! Dashboard routes.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde_json::json;
use tracing::error;

use crate::AppState;
use stockroom_db::repositories::report::ReportRepository;

/// Creates the dashboard routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(get_dashboard))
}

/// GET `/dashboard` - Snapshot of the inventory and today's sales.
async fn get_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let repo = ReportRepository::new((*state.db).clone());

    match repo.dashboard().await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "product_count": summary.product_count,
                "supplier_count": summary.supplier_count,
                "category_count": summary.category_count,
                "low_stock_count": summary.low_stock_count,
                "todays_sales_total": summary.todays_sales_total.to_string(),
                "todays_invoice_count": summary.todays_invoice_count,
                "recent_transactions": summary.recent_transactions,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Dashboard query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
                .into_response()
        }
    }
}
