// routes.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    handler::{
        admin::admin_handler, freelancer::freelancer_handler, payment::payment_handler,
        upload::upload_handler,
    },
    middleware::auth,
    service::upload_service::PUBLIC_PREFIX,
    AppState,
};

// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest(
            "/freelancers",
            freelancer_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/payment",
            payment_handler().layer(middleware::from_fn(auth)),
        )
        // `auth` is layered last so it runs before the admin role check.
        .nest("/admin", admin_handler().layer(middleware::from_fn(auth)))
        .nest(
            "/uploads",
            upload_handler(app_state.env.upload_max_bytes).layer(middleware::from_fn(auth)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state.clone()));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
        .nest_service(
            PUBLIC_PREFIX,
            ServeDir::new(app_state.upload_service.dir()),
        )
}
