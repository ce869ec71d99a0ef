// handler/freelancer.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::workdtos::*,
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn freelancer_handler() -> Router {
    Router::new()
        .route(
            "/work",
            post(create_offer).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Freelancer])
            })),
        )
        .route("/work/:work_id/status", put(update_work_status))
        .route("/work/:work_id", delete(delete_work))
        .route("/work/:work_id/history", get(get_work_history))
        .route("/hires", get(get_hires))
        .route(
            "/me",
            get(get_me)
                .put(upsert_profile)
                .layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Freelancer])
                })),
        )
        .route(
            "/:freelancer_id/reviews",
            get(get_reviews).post(create_review),
        )
}

pub async fn create_offer(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateOfferDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let work = app_state.work_service.create_offer(&auth.user, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Offer created successfully", work)),
    ))
}

pub async fn update_work_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(work_id): Path<Uuid>,
    Json(body): Json<UpdateWorkStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let result = app_state
        .work_service
        .change_status(&auth.user, work_id, body.status, false)
        .await?;

    Ok(Json(ApiResponse::success("Work status updated successfully", result)))
}

pub async fn delete_work(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(work_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.work_service.delete_work(&auth.user, work_id).await?;

    Ok(Json(ApiResponse::success("Work deleted successfully", work_id)))
}

pub async fn get_work_history(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(work_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let history = app_state.work_service.history(&auth.user, work_id).await?;

    Ok(Json(ApiResponse::success("Work history retrieved successfully", history)))
}

pub async fn get_hires(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let hires = app_state.work_service.hires(&auth.user).await?;

    Ok(Json(ApiResponse::success("Hires retrieved successfully", hires)))
}

pub async fn get_me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let overview = app_state.work_service.freelancer_overview(&auth.user).await?;

    Ok(Json(ApiResponse::success("Freelancer profile retrieved successfully", overview)))
}

pub async fn upsert_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpsertProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let profile = app_state.work_service.upsert_profile(&auth.user, body).await?;

    Ok(Json(ApiResponse::success("Freelancer profile saved successfully", profile)))
}

pub async fn create_review(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(freelancer_id): Path<Uuid>,
    Json(body): Json<CreateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let review = app_state
        .work_service
        .submit_review(&auth.user, freelancer_id, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Review submitted successfully", review)),
    ))
}

pub async fn get_reviews(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(freelancer_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state.work_service.freelancer_reviews(freelancer_id).await?;

    Ok(Json(ApiResponse::success("Reviews retrieved successfully", reviews)))
}
