//! Sale endpoints.
//!
//! ```text
//! POST /api/sales                                   record a sale (201)
//! GET  /api/sales?page&limit                        newest first, paginated
//! GET  /api/sales/today                             today's sales + summary
//! GET  /api/sales/range?start_date&end_date         inclusive local days
//! GET  /api/sales/{id}                              one sale with items
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use rxpos_core::{CoreError, DateRange, NewSaleInput, Sale, SaleRequest, SalesReport};
use serde::Deserialize;

use super::PageParams;
use crate::error::{ApiResponse, ApiResult, Pagination};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/sales", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/today", get(today))
        .route("/range", get(range))
        .route("/{id}", get(get_by_id))
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// POST /api/sales - record a sale atomically
async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewSaleInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Sale>>)> {
    let Json(input) = payload?;
    let request = SaleRequest::try_from(input)?;

    let sale = state.db.recorder().record_sale(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(sale).with_message("Sale recorded successfully")),
    ))
}

/// GET /api/sales - paginated history, newest first
async fn list(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<Sale>>>> {
    let Query(params) = params?;
    let (page, limit) = params.resolve()?;

    let result = state.db.sales().list_page(page, limit).await?;

    Ok(Json(ApiResponse::page(
        result.sales,
        Pagination::new(page, limit, result.total),
    )))
}

/// GET /api/sales/today - today's sales and summary
async fn today(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<SalesReport>>> {
    let report = state.db.sales().today().await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/sales/range - sales between two local calendar days, inclusive
async fn range(
    State(state): State<AppState>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<SalesReport>>> {
    let Query(params) = params?;
    let range = DateRange::parse(
        params.start_date.as_deref().unwrap_or_default(),
        params.end_date.as_deref().unwrap_or_default(),
    )?;

    let report = state.db.sales().by_date_range(&range).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/sales/{id} - a single sale with its lines
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Sale>>> {
    let sale = state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(id.clone()))?;

    Ok(Json(ApiResponse::ok(sale)))
}
