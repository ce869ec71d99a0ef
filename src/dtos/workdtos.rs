use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{freelancermodel::FreelancerProfile, workmodel::*};

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

//Offer DTOs
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferDto {
    pub job_seeker_id: Uuid,

    #[validate(
        custom(function = "validate_not_blank", message = "Job title is required"),
        length(max = 200, message = "Job title must be at most 200 characters")
    )]
    pub job_title: String,

    #[validate(range(min = 0.01, max = 9999999999.99, message = "Price must be between 0.01 and 9,999,999,999.99"))]
    pub price: f64,

    #[validate(range(min = 1, max = 3650, message = "Duration must be between 1 and 3650 days"))]
    pub duration: i32,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateWorkStatusDto {
    pub status: WorkStatus,
}

//Review DTOs
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewDto {
    pub work_id: Uuid,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(
        custom(function = "validate_not_blank", message = "Comment is required"),
        length(max = 2000, message = "Comment must be at most 2000 characters")
    )]
    pub comment: String,
}

//Profile DTOs
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProfileDto {
    #[validate(
        custom(function = "validate_not_blank", message = "Display name is required"),
        length(max = 100, message = "Display name must be at most 100 characters")
    )]
    pub display_name: String,

    #[validate(length(min = 1, max = 200, message = "Headline must be between 1 and 200 characters"))]
    pub headline: String,

    #[validate(length(max = 5000, message = "Bio must be at most 5000 characters"))]
    pub bio: Option<String>,

    #[validate(length(max = 30, message = "At most 30 skills are allowed"))]
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorkWithReviewDto {
    #[serde(flatten)]
    pub work: Work,
    pub review: Option<Review>,
    pub can_review: bool,
    pub can_delete: bool,
}

impl WorkWithReviewDto {
    pub fn new(work: Work, review: Option<Review>) -> Self {
        let can_review = work.status.accepts_review() && review.is_none();
        let can_delete = work.status.is_deletable();
        Self {
            work,
            review,
            can_review,
            can_delete,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreelancerOverviewDto {
    pub profile: FreelancerProfile,
    pub works: Vec<WorkWithReviewDto>,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeResultDto {
    pub work: Work,
    pub action: WorkAction,
    pub previous_status: WorkStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}
