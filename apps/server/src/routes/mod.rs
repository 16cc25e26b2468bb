//! HTTP routes.
//!
//! Each module exposes a `router()` that is merged here:
//!
//! ```text
//! /api                 health::router
//! /api/health
//! /api/sales/...       sales::router
//! /api/products/...    products::router
//! /api/customers/...   customers::router
//! ```

pub mod customers;
pub mod health;
pub mod products;
pub mod sales;

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use rxpos_core::ValidationError;
use serde::Deserialize;

use crate::error::ApiResponse;
use crate::AppState;

/// Largest accepted `limit`.
pub const MAX_PAGE_SIZE: i64 = 100;

/// `limit` when none is given.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// `(page, limit)` with defaults applied and bounds checked.
    pub fn resolve(&self) -> Result<(i64, i64), ValidationError> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(ValidationError::OutOfRange {
                field: "page".to_string(),
                min: 1,
                max: i64::MAX,
            });
        }

        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(ValidationError::OutOfRange {
                field: "limit".to_string(),
                min: 1,
                max: MAX_PAGE_SIZE,
            });
        }

        Ok((page, limit))
    }
}

/// All API routes, without state or middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::temporary("/api") }))
        .merge(health::router())
        .merge(sales::router())
        .merge(products::router())
        .merge(customers::router())
}

/// Unknown `/api/*` paths get a 404 envelope; anything else goes to `/api`.
pub async fn fallback(uri: Uri) -> Response {
    if uri.path().starts_with("/api/") {
        (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::failure(format!(
                "API endpoint not found: {}",
                uri.path()
            ))),
        )
            .into_response()
    } else {
        Redirect::temporary("/api").into_response()
    }
}
