use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::HttpError,
    models::workmodel::{TransitionError, WorkStatus},
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Work {0} not found")]
    WorkNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Freelancer profile not found for user {0}")]
    FreelancerProfileNotFound(Uuid),

    #[error("{0}")]
    InvalidTransition(#[from] TransitionError),

    #[error("Work {0} changed while it was being updated, please refresh and try again")]
    ConcurrentUpdate(Uuid),

    #[error("Work {0} can only be deleted while it is OFFER_PENDING or CANCELLED (currently {1})")]
    NotDeletable(Uuid, WorkStatus),

    #[error("Work {0} must be COMPLETED before it can be reviewed (currently {1})")]
    NotReviewable(Uuid, WorkStatus),

    #[error("Work {0} has already been reviewed")]
    ReviewExists(Uuid),

    #[error("User {0} is not allowed to perform this action on work {1}")]
    UnauthorizedWorkAccess(Uuid, Uuid),

    #[error("{0}")]
    Forbidden(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: String, available: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported file type {0}, only JPEG, PNG and PDF files are accepted")]
    UnsupportedMediaType(String),

    #[error("File {name} exceeds the {limit} byte upload limit")]
    FileTooLarge { name: String, limit: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::WorkNotFound(_)
            | ServiceError::UserNotFound(_)
            | ServiceError::FreelancerProfileNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidTransition(TransitionError::WrongParty { .. })
            | ServiceError::UnauthorizedWorkAccess(_, _)
            | ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,

            ServiceError::InvalidTransition(TransitionError::NotAllowed { .. })
            | ServiceError::NotDeletable(_, _)
            | ServiceError::NotReviewable(_, _)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::ConcurrentUpdate(_) | ServiceError::ReviewExists(_) => StatusCode::CONFLICT,

            ServiceError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,

            ServiceError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,

            ServiceError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,

            ServiceError::Database(_) | ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        if status.is_server_error() {
            tracing::error!("{}", error);
            // Internals stay in the logs.
            return HttpError::server_error("Something went wrong, please try again later");
        }
        let message = error.to_string();
        match status {
            StatusCode::BAD_REQUEST => HttpError::bad_request(message),
            StatusCode::FORBIDDEN => HttpError::forbidden(message),
            StatusCode::NOT_FOUND => HttpError::not_found(message),
            StatusCode::CONFLICT => HttpError::conflict(message),
            StatusCode::PAYMENT_REQUIRED => HttpError::payment_required(message),
            StatusCode::PAYLOAD_TOO_LARGE => HttpError::payload_too_large(message),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => HttpError::unsupported_media_type(message),
            _ => HttpError::new(message, status),
        }
    }
}
