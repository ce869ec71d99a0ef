use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FreelancerProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub headline: String,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub rating: f32,
    pub review_count: i32,
    pub completed_works: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
