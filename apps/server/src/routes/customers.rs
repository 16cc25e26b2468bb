//! Customer endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use rxpos_core::{Customer, NewCustomer};

use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/customers", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/phone/{phone}", get(get_by_phone))
}

/// GET /api/customers
async fn list(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<Customer>>>> {
    let customers = state.db.customers().list().await?;
    Ok(Json(ApiResponse::ok(customers)))
}

/// POST /api/customers - 409 when the phone is already registered
async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewCustomer>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Customer>>)> {
    let Json(input) = payload?;
    let input = input.validate()?;

    let customer = state.db.customers().insert(&input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(customer).with_message("Customer created successfully")),
    ))
}

/// GET /api/customers/phone/{phone}
async fn get_by_phone(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> ApiResult<Json<ApiResponse<Customer>>> {
    let customer = state
        .db
        .customers()
        .get_by_phone(&phone)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", &phone))?;

    Ok(Json(ApiResponse::ok(customer)))
}
