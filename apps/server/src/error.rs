//! # API Error Type
//!
//! Unified error type for HTTP handlers, and the JSON envelope every
//! response is wrapped in.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in RxPOS                                  │
//! │                                                                         │
//! │  Handler                                                                │
//! │  Result<Json<ApiResponse<T>>, ApiError>                                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  CoreError ── ProductNotFound / SaleNotFound ────────────► 404         │
//! │           └── InvalidRequest / Validation / Stock ───────► 400         │
//! │                                                                         │
//! │  DbError ──── NotFound ──────────────────────────────────► 404         │
//! │          ├─── UniqueViolation / ForeignKeyViolation ─────► 409         │
//! │          └─── anything else (logged, generic message) ───► 500         │
//! │                                                                         │
//! │  Body rejected (bad JSON / query string) ────────────────► 400         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Envelope
//! ```json
//! { "success": false, "error": "Product not found: 3f2a..." }
//! { "success": true, "data": [...], "pagination": { "page": 1, "limit": 50, "total": 3, "totalPages": 1 } }
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rxpos_core::{CoreError, ValidationError};
use rxpos_db::{DbError, SaleError};
use serde::Serialize;

// =============================================================================
// Response Envelope
// =============================================================================

/// The JSON envelope around every response body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
            error: None,
            pagination: None,
        }
    }

    /// A successful page of a list.
    pub fn page(data: T, pagination: Pagination) -> Self {
        ApiResponse {
            pagination: Some(pagination),
            ..ApiResponse::ok(data)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// A successful response with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
            pagination: None,
        }
    }

    /// A failed response.
    pub fn failure(error: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
            pagination: None,
        }
    }
}

/// Page metadata for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

// =============================================================================
// API Error
// =============================================================================

/// Error returned from HTTP handlers.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, format!("{} not found: {}", resource, id))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::CONFLICT, message)
    }

    /// Internal failure. The message is what the client sees, so keep
    /// details in the logs.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::failure(self.message))).into_response()
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::SaleNotFound(id) => ApiError::not_found("Sale", &id),
            e @ (CoreError::InsufficientStock { .. }
            | CoreError::InvalidRequest(_)
            | CoreError::Validation(_)) => ApiError::bad_request(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::conflict("Resource is referenced by existing records")
            }
            DbError::CheckViolation(message) => {
                tracing::warn!("Constraint violation: {}", message);
                ApiError::bad_request("Value violates a data constraint")
            }
            DbError::InsufficientStock {
                product_id,
                requested,
            } => ApiError::bad_request(format!(
                "Insufficient stock for {}: requested {}",
                product_id, requested
            )),
            other => {
                // Log the actual error but return a generic message
                tracing::error!(error = %other, "Database operation failed");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        match err {
            SaleError::Domain(e) => e.into(),
            SaleError::Storage(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(format!("Invalid query string: {}", rejection.body_text()))
    }
}
