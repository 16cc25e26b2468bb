//! # rxpos-server: HTTP API for RxPOS
//!
//! REST endpoints used by the React point-of-sale front end.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  POST /api/sales { items, payment_method, ... }                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TraceLayer ─► CorsLayer ─► routes::sales::create                       │
//! │                                   │                                     │
//! │                                   │  SaleRequest::try_from(body)?       │
//! │                                   │  state.db.recorder().record_sale()  │
//! │                                   ▼                                     │
//! │                           201 { success, data: Sale }                   │
//! │                           4xx/5xx { success: false, error }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use rxpos_db::Database;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResponse, ApiResult, Pagination};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete application: routes, fallback and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_origin());

    routes::router()
        .fallback(routes::fallback)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Some(Err(_)) => {
            // Rejected at config load; only reachable with a hand-built config.
            tracing::warn!("Ignoring unparsable CORS origin, allowing any origin");
            CorsLayer::permissive()
        }
        None => CorsLayer::permissive(),
    }
}
