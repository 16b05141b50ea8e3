use axum::{
    routing::get,
    Json,
    Router,
};
use serde_json::json;
use std::sync::Arc;

use super::handlers::{self, AppState};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async {
            Json(json!({
                "message": "Marketplace API is running"
            }))
        }))
        .route("/api/health", get(handlers::get_health))
        .route("/api/listings", get(handlers::get_listings))
        .route("/api/assets", get(handlers::get_assets))
        .route("/api/assets/:mint", get(handlers::get_asset))
        .with_state(state)
}
