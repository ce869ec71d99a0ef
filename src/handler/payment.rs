// handler/payment.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{paymentdtos::*, workdtos::ApiResponse},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn payment_handler() -> Router {
    Router::new()
        .route("/charge", post(charge))
        .route("/withdraw", post(withdraw))
        .route("/history/:user_id", get(get_history))
}

/// A declined charge is still a 200; the body carries `success: false`.
pub async fn charge(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<ChargeRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state.payment_service.charge(&auth.user, body).await?;

    Ok(Json(result))
}

pub async fn withdraw(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<WithdrawRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state.payment_service.withdraw(&auth.user, body).await?;

    Ok(Json(result))
}

pub async fn get_history(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<HistoryQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let history = app_state
        .payment_service
        .history(&auth.user, user_id, query)
        .await?;

    Ok(Json(ApiResponse::success("Payment history retrieved successfully", history)))
}
