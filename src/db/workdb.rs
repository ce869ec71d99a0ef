// db/workdb.rs
use async_trait::async_trait;
use sqlx::{types::BigDecimal, Error};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::workmodel::*;

const WORK_COLUMNS: &str = "id, job_title, description, price, duration, status, \
    job_seeker_id, freelancer_id, created_at, updated_at, completed_at";

const REVIEW_COLUMNS: &str = "id, work_id, freelancer_id, reviewer_id, rating, comment, created_at";

#[async_trait]
pub trait WorkExt {
    async fn create_work(
        &self,
        freelancer_id: Uuid,
        job_seeker_id: Uuid,
        job_title: String,
        description: Option<String>,
        price: BigDecimal,
        duration: i32,
    ) -> Result<Work, Error>;

    async fn get_work(&self, work_id: Uuid) -> Result<Option<Work>, Error>;

    // Compare-and-set on the current status; `None` means the row moved on
    // (or vanished) since it was read.
    async fn update_work_status(
        &self,
        work_id: Uuid,
        expected: WorkStatus,
        next: WorkStatus,
        changed_by: Uuid,
    ) -> Result<Option<Work>, Error>;

    async fn delete_work(&self, work_id: Uuid, freelancer_id: Uuid) -> Result<bool, Error>;

    async fn get_works_for_job_seeker(&self, job_seeker_id: Uuid) -> Result<Vec<Work>, Error>;

    async fn get_works_for_freelancer(&self, freelancer_id: Uuid) -> Result<Vec<Work>, Error>;

    async fn get_work_history(&self, work_id: Uuid) -> Result<Vec<WorkStatusChange>, Error>;

    //Reviews
    async fn create_review(
        &self,
        work_id: Uuid,
        freelancer_id: Uuid,
        reviewer_id: Uuid,
        rating: i32,
        comment: String,
    ) -> Result<Review, Error>;

    async fn get_review_by_work(&self, work_id: Uuid) -> Result<Option<Review>, Error>;

    async fn get_reviews_for_works(&self, work_ids: &[Uuid]) -> Result<Vec<Review>, Error>;

    async fn get_freelancer_reviews(&self, freelancer_id: Uuid) -> Result<Vec<Review>, Error>;
}

#[async_trait]
impl WorkExt for DBClient {
    async fn create_work(
        &self,
        freelancer_id: Uuid,
        job_seeker_id: Uuid,
        job_title: String,
        description: Option<String>,
        price: BigDecimal,
        duration: i32,
    ) -> Result<Work, Error> {
        let mut tx = self.pool.begin().await?;

        let work = sqlx::query_as::<_, Work>(&format!(
            r#"
            INSERT INTO works (job_title, description, price, duration, status, job_seeker_id, freelancer_id)
            VALUES ($1, $2, $3, $4, 'offer_pending'::work_status, $5, $6)
            RETURNING {WORK_COLUMNS}
            "#
        ))
        .bind(job_title)
        .bind(description)
        .bind(price)
        .bind(duration)
        .bind(job_seeker_id)
        .bind(freelancer_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO work_status_changes (work_id, from_status, to_status, changed_by)
            VALUES ($1, NULL, $2, $3)
            "#,
        )
        .bind(work.id)
        .bind(work.status)
        .bind(freelancer_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(work)
    }

    async fn get_work(&self, work_id: Uuid) -> Result<Option<Work>, Error> {
        sqlx::query_as::<_, Work>(&format!("SELECT {WORK_COLUMNS} FROM works WHERE id = $1"))
            .bind(work_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_work_status(
        &self,
        work_id: Uuid,
        expected: WorkStatus,
        next: WorkStatus,
        changed_by: Uuid,
    ) -> Result<Option<Work>, Error> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Work>(&format!(
            r#"
            UPDATE works
            SET status = $3,
                updated_at = NOW(),
                completed_at = CASE
                    WHEN $3 = 'completed'::work_status THEN COALESCE(completed_at, NOW())
                    ELSE completed_at
                END
            WHERE id = $1 AND status = $2
            RETURNING {WORK_COLUMNS}
            "#
        ))
        .bind(work_id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(work) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO work_status_changes (work_id, from_status, to_status, changed_by)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(work_id)
        .bind(expected)
        .bind(next)
        .bind(changed_by)
        .execute(&mut *tx)
        .await?;

        if next == WorkStatus::Completed {
            sqlx::query(
                r#"
                UPDATE freelancer_profiles
                SET completed_works = completed_works + 1, updated_at = NOW()
                WHERE user_id = $1
                "#,
            )
            .bind(work.freelancer_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(work))
    }

    async fn delete_work(&self, work_id: Uuid, freelancer_id: Uuid) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM works
            WHERE id = $1
              AND freelancer_id = $2
              AND status IN ('offer_pending'::work_status, 'cancelled'::work_status)
            "#,
        )
        .bind(work_id)
        .bind(freelancer_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_works_for_job_seeker(&self, job_seeker_id: Uuid) -> Result<Vec<Work>, Error> {
        sqlx::query_as::<_, Work>(&format!(
            "SELECT {WORK_COLUMNS} FROM works WHERE job_seeker_id = $1 ORDER BY created_at DESC"
        ))
        .bind(job_seeker_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_works_for_freelancer(&self, freelancer_id: Uuid) -> Result<Vec<Work>, Error> {
        sqlx::query_as::<_, Work>(&format!(
            "SELECT {WORK_COLUMNS} FROM works WHERE freelancer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(freelancer_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_work_history(&self, work_id: Uuid) -> Result<Vec<WorkStatusChange>, Error> {
        sqlx::query_as::<_, WorkStatusChange>(
            r#"
            SELECT id, work_id, from_status, to_status, changed_by, created_at
            FROM work_status_changes
            WHERE work_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(work_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_review(
        &self,
        work_id: Uuid,
        freelancer_id: Uuid,
        reviewer_id: Uuid,
        rating: i32,
        comment: String,
    ) -> Result<Review, Error> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews (work_id, freelancer_id, reviewer_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(work_id)
        .bind(freelancer_id)
        .bind(reviewer_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE freelancer_profiles
            SET rating = COALESCE((SELECT AVG(rating)::REAL FROM reviews WHERE freelancer_id = $1), 0),
                review_count = (SELECT COUNT(*) FROM reviews WHERE freelancer_id = $1),
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(freelancer_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(review)
    }

    async fn get_review_by_work(&self, work_id: Uuid) -> Result<Option<Review>, Error> {
        sqlx::query_as::<_, Review>(&format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE work_id = $1"))
            .bind(work_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_reviews_for_works(&self, work_ids: &[Uuid]) -> Result<Vec<Review>, Error> {
        if work_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE work_id = ANY($1)"
        ))
        .bind(work_ids)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_freelancer_reviews(&self, freelancer_id: Uuid) -> Result<Vec<Review>, Error> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE freelancer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(freelancer_id)
        .fetch_all(&self.pool)
        .await
    }
}
