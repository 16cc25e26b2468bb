//! API banner and health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api", get(banner))
        .route("/api/health", get(health))
}

/// GET /api - name, version and endpoint map
async fn banner() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "RxPOS Pharmacy POS API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "products": "/api/products",
            "sales": "/api/sales",
            "customers": "/api/customers",
            "health": "/api/health",
        }
    }))
}

/// GET /api/health - 503 when the database does not answer
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let timestamp = Utc::now().to_rfc3339();

    if state.db.health_check().await {
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "RxPOS server is running",
                "timestamp": timestamp,
            })),
        )
    } else {
        tracing::warn!("Health check failed: database unavailable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "Database unavailable",
                "timestamp": timestamp,
            })),
        )
    }
}
