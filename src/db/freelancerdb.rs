use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::freelancermodel::FreelancerProfile;

const PROFILE_COLUMNS: &str = "id, user_id, display_name, headline, bio, skills, rating, \
    review_count, completed_works, created_at, updated_at";

#[async_trait]
pub trait FreelancerExt {
    async fn get_freelancer_profile(&self, user_id: Uuid) -> Result<Option<FreelancerProfile>, Error>;

    async fn upsert_freelancer_profile(
        &self,
        user_id: Uuid,
        display_name: String,
        headline: String,
        bio: Option<String>,
        skills: Vec<String>,
    ) -> Result<FreelancerProfile, Error>;
}

#[async_trait]
impl FreelancerExt for DBClient {
    async fn get_freelancer_profile(&self, user_id: Uuid) -> Result<Option<FreelancerProfile>, Error> {
        sqlx::query_as::<_, FreelancerProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM freelancer_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn upsert_freelancer_profile(
        &self,
        user_id: Uuid,
        display_name: String,
        headline: String,
        bio: Option<String>,
        skills: Vec<String>,
    ) -> Result<FreelancerProfile, Error> {
        // Counters are owned by the work and review flows and survive edits.
        sqlx::query_as::<_, FreelancerProfile>(&format!(
            r#"
            INSERT INTO freelancer_profiles (user_id, display_name, headline, bio, skills)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET display_name = EXCLUDED.display_name,
                headline = EXCLUDED.headline,
                bio = EXCLUDED.bio,
                skills = EXCLUDED.skills,
                updated_at = NOW()
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(display_name)
        .bind(headline)
        .bind(bio)
        .bind(skills)
        .fetch_one(&self.pool)
        .await
    }
}
