// handler/admin.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::workdtos::*,
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn admin_handler() -> Router {
    Router::new()
        .route("/work/:work_id/status", put(update_work_status))
        .route("/wallets/:user_id/reconcile", get(reconcile_wallet))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Admin])
        }))
}

/// Escalates active work to DISPUTED, or resolves a dispute.
pub async fn update_work_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(work_id): Path<Uuid>,
    Json(body): Json<UpdateWorkStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let result = app_state
        .work_service
        .change_status(&auth.user, work_id, body.status, true)
        .await?;

    Ok(Json(ApiResponse::success("Work status updated successfully", result)))
}

pub async fn reconcile_wallet(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let report = app_state.payment_service.reconcile(user_id).await?;

    Ok(Json(ApiResponse::success("Wallet reconciled", report)))
}
