//! Catalog endpoints.
//!
//! ```text
//! GET    /api/products[?page&limit][&category]    all products by name
//! POST   /api/products                             create (201)
//! GET    /api/products/search?q[&limit]            name / category / barcode
//! GET    /api/products/low-stock[?threshold]       stock <= threshold
//! GET    /api/products/with-margin                 products + sell-buy margin
//! GET    /api/products/categories                  distinct categories
//! GET    /api/products/barcode/{barcode}           scanner lookup
//! GET    /api/products/{id}
//! PUT    /api/products/{id}                        partial update
//! DELETE /api/products/{id}                        409 once sold
//! PATCH  /api/products/{id}/stock                  absolute stock level
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use rxpos_core::validation::{validate_search_query, validate_stock};
use rxpos_core::{
    CoreError, NewProduct, Product, ProductUpdate, ValidationError, DEFAULT_LOW_STOCK_THRESHOLD,
};
use serde::{Deserialize, Serialize};

use super::{PageParams, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::{ApiError, ApiResponse, ApiResult, Pagination};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/search", get(search))
        .route("/low-stock", get(low_stock))
        .route("/with-margin", get(with_margin))
        .route("/categories", get(categories))
        .route("/barcode/{barcode}", get(get_by_barcode))
        .route("/{id}", get(get_by_id).put(update).delete(delete))
        .route("/{id}/stock", patch(update_stock))
}

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LowStockParams {
    pub threshold: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StockUpdate {
    pub stock: i64,
}

/// A product with its per-unit margin (`sell - buy`) for the dashboard.
#[derive(Debug, Serialize)]
pub struct ProductWithMargin {
    #[serde(flatten)]
    pub product: Product,
    pub margin_cents: i64,
}

impl From<Product> for ProductWithMargin {
    fn from(product: Product) -> Self {
        let margin_cents = product.margin().cents();
        ProductWithMargin {
            product,
            margin_cents,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/products - the catalog ordered by name
///
/// Without `page`/`limit` the whole catalog is returned; with either, one
/// page plus pagination metadata.
async fn list(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<Product>>>> {
    let Query(params) = params?;
    let repo = state.db.products();

    if let Some(category) = params.category.as_deref().map(str::trim) {
        if !category.is_empty() {
            return Ok(Json(ApiResponse::ok(repo.by_category(category).await?)));
        }
    }

    if params.page.is_none() && params.limit.is_none() {
        // SQLite treats a negative LIMIT as unbounded.
        return Ok(Json(ApiResponse::ok(repo.list(-1, 0).await?)));
    }

    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve()?;
    let offset = (page - 1).saturating_mul(limit);

    let products = repo.list(limit, offset).await?;
    let total = repo.count().await?;

    Ok(Json(ApiResponse::page(
        products,
        Pagination::new(page, limit, total),
    )))
}

/// POST /api/products - create a product
async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let Json(input) = payload?;
    let input = input.validate()?;

    let product = state.db.products().insert(&input).await?;
    tracing::info!(id = %product.id, name = %product.name, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(product).with_message("Product created successfully")),
    ))
}

/// GET /api/products/search - substring search
async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<Product>>>> {
    let Query(params) = params?;
    let term = params
        .q
        .as_deref()
        .map(validate_search_query)
        .transpose()?
        .ok_or_else(|| ApiError::bad_request("Search query is required"))?;

    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE,
        }
        .into());
    }

    let products = state.db.products().search(&term, limit).await?;
    Ok(Json(ApiResponse::ok(products)))
}

/// GET /api/products/low-stock - products at or below the threshold
async fn low_stock(
    State(state): State<AppState>,
    params: Result<Query<LowStockParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<Product>>>> {
    let Query(params) = params?;
    let threshold = params.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    if threshold < 0 {
        return Err(ValidationError::Negative {
            field: "threshold".to_string(),
        }
        .into());
    }

    let products = state.db.products().low_stock(threshold).await?;
    Ok(Json(ApiResponse::ok(products)))
}

/// GET /api/products/with-margin - catalog with margins
async fn with_margin(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<ProductWithMargin>>>> {
    let products = state.db.products().list(-1, 0).await?;
    Ok(Json(ApiResponse::ok(
        products.into_iter().map(ProductWithMargin::from).collect(),
    )))
}

/// GET /api/products/categories - distinct category names
async fn categories(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let categories = state.db.products().categories().await?;
    Ok(Json(ApiResponse::ok(categories)))
}

/// GET /api/products/barcode/{barcode} - scanner lookup
async fn get_by_barcode(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> ApiResult<Json<ApiResponse<Product>>> {
    let product = state
        .db
        .products()
        .get_by_barcode(&barcode)
        .await?
        .ok_or_else(|| ApiError::not_found("Product with barcode", &barcode))?;

    Ok(Json(ApiResponse::ok(product)))
}

/// GET /api/products/{id}
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Product>>> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(id.clone()))?;

    Ok(Json(ApiResponse::ok(product)))
}

/// PUT /api/products/{id} - partial update, validated as a whole
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductUpdate>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Product>>> {
    let Json(changes) = payload?;
    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let repo = state.db.products();
    let current = repo
        .get_by_id(&id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(id.clone()))?;

    let next = changes.apply_to(&current)?;
    let product = repo.update(&next).await?;

    Ok(Json(
        ApiResponse::ok(product).with_message("Product updated successfully"),
    ))
}

/// DELETE /api/products/{id}
async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.db.products().delete(&id).await?;
    tracing::info!(id = %id, "Product deleted");

    Ok(Json(ApiResponse::message("Product deleted successfully")))
}

/// PATCH /api/products/{id}/stock - set the absolute stock level
async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StockUpdate>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let Json(StockUpdate { stock }) = payload?;
    validate_stock(stock)?;

    state.db.products().set_stock(&id, stock).await?;
    tracing::info!(id = %id, stock, "Stock level set");

    Ok(Json(ApiResponse::message("Stock updated successfully")))
}
