// handler/upload.rs
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};

use crate::{
    dtos::workdtos::ApiResponse,
    error::HttpError,
    service::{error::ServiceError, upload_service::IncomingFile},
    AppState,
};

pub const MAX_FILES_PER_REQUEST: usize = 10;

/// `max_file_bytes` caps each file; the request body as a whole may carry
/// up to `MAX_FILES_PER_REQUEST` of them plus form overhead.
pub fn upload_handler(max_file_bytes: usize) -> Router {
    let body_limit = max_file_bytes
        .saturating_mul(MAX_FILES_PER_REQUEST)
        .saturating_add(1024 * 1024);

    Router::new()
        .route("/", post(upload_files))
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Reads every file part first; nothing is written unless all parts pass.
pub async fn upload_files(
    Extension(app_state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let uploads = &app_state.upload_service;
    let mut incoming = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::new(e.body_text(), e.status()))?
    {
        // Plain text fields carry no file name and are skipped.
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let fieldname = field.name().unwrap_or("file").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        uploads.check(&mime_type, &original_name, 0)?;

        if incoming.len() >= MAX_FILES_PER_REQUEST {
            return Err(HttpError::bad_request(format!(
                "At most {} files can be uploaded at once",
                MAX_FILES_PER_REQUEST
            )));
        }

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| HttpError::new(e.body_text(), e.status()))?
        {
            if data.len() + chunk.len() > uploads.max_bytes() {
                return Err(ServiceError::FileTooLarge {
                    name: original_name,
                    limit: uploads.max_bytes(),
                }
                .into());
            }
            data.extend_from_slice(&chunk);
        }

        incoming.push(IncomingFile {
            fieldname,
            original_name,
            mime_type,
            data,
        });
    }

    if incoming.is_empty() {
        return Err(HttpError::bad_request("No files were uploaded"));
    }

    let files = uploads.store_all(incoming).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Files uploaded successfully", files)),
    ))
}
