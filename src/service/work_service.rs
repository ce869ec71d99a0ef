// service/work_service.rs
use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{db::is_unique_violation, db::DBClient, freelancerdb::FreelancerExt, userdb::UserExt, workdb::WorkExt},
    dtos::workdtos::*,
    models::{
        freelancermodel::FreelancerProfile,
        usermodel::{User, UserRole},
        workmodel::*,
    },
    service::error::ServiceError,
    utils::money::to_positive_money,
};

#[derive(Debug, Clone)]
pub struct WorkService {
    db_client: Arc<DBClient>,
}

impl WorkService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn create_offer(&self, freelancer: &User, body: CreateOfferDto) -> Result<Work, ServiceError> {
        if freelancer.role != UserRole::Freelancer {
            return Err(ServiceError::Forbidden("Only freelancers can create offers".to_string()));
        }

        if body.job_seeker_id == freelancer.id {
            return Err(ServiceError::Validation("You cannot send an offer to yourself".to_string()));
        }

        let price = to_positive_money(body.price).map_err(ServiceError::Validation)?;

        self.db_client
            .get_user(body.job_seeker_id)
            .await?
            .ok_or(ServiceError::UserNotFound(body.job_seeker_id))?;

        let description = body
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let work = self
            .db_client
            .create_work(
                freelancer.id,
                body.job_seeker_id,
                body.job_title.trim().to_string(),
                description,
                price,
                body.duration,
            )
            .await?;

        tracing::info!(
            work_id = %work.id,
            freelancer_id = %freelancer.id,
            job_seeker_id = %work.job_seeker_id,
            "offer created"
        );

        Ok(work)
    }

    /// Moves a work to `target` on behalf of one of its parties, or of an
    /// admin when `as_admin` is set.
    pub async fn change_status(
        &self,
        user: &User,
        work_id: Uuid,
        target: WorkStatus,
        as_admin: bool,
    ) -> Result<StatusChangeResultDto, ServiceError> {
        let work = self
            .db_client
            .get_work(work_id)
            .await?
            .ok_or(ServiceError::WorkNotFound(work_id))?;

        let party = work
            .party_of(user.id, as_admin && user.is_admin())
            .ok_or(ServiceError::UnauthorizedWorkAccess(user.id, work_id))?;

        let action = work.status.transition(target, party).map_err(|e| {
            tracing::warn!(work_id = %work_id, user_id = %user.id, "rejected transition: {}", e);
            e
        })?;

        let updated = self
            .db_client
            .update_work_status(work_id, work.status, target, user.id)
            .await?
            .ok_or(ServiceError::ConcurrentUpdate(work_id))?;

        tracing::info!(
            work_id = %work_id,
            user_id = %user.id,
            from = %work.status,
            to = %updated.status,
            "work status changed via {:?}",
            action
        );

        Ok(StatusChangeResultDto {
            changed_at: updated.updated_at,
            work: updated,
            action,
            previous_status: work.status,
        })
    }

    pub async fn delete_work(&self, user: &User, work_id: Uuid) -> Result<(), ServiceError> {
        let work = self
            .db_client
            .get_work(work_id)
            .await?
            .ok_or(ServiceError::WorkNotFound(work_id))?;

        if work.freelancer_id != user.id {
            return Err(ServiceError::UnauthorizedWorkAccess(user.id, work_id));
        }

        if !work.status.is_deletable() {
            return Err(ServiceError::NotDeletable(work_id, work.status));
        }

        let deleted = self.db_client.delete_work(work_id, user.id).await?;
        if !deleted {
            return Err(ServiceError::ConcurrentUpdate(work_id));
        }

        tracing::info!(work_id = %work_id, user_id = %user.id, "work deleted");
        Ok(())
    }

    pub async fn submit_review(
        &self,
        user: &User,
        freelancer_id: Uuid,
        body: CreateReviewDto,
    ) -> Result<Review, ServiceError> {
        let work = self
            .db_client
            .get_work(body.work_id)
            .await?
            .ok_or(ServiceError::WorkNotFound(body.work_id))?;

        if work.job_seeker_id != user.id {
            return Err(ServiceError::UnauthorizedWorkAccess(user.id, work.id));
        }

        if work.freelancer_id != freelancer_id {
            return Err(ServiceError::Validation(format!(
                "Work {} does not belong to freelancer {}",
                work.id, freelancer_id
            )));
        }

        if !work.status.accepts_review() {
            return Err(ServiceError::NotReviewable(work.id, work.status));
        }

        if self.db_client.get_review_by_work(work.id).await?.is_some() {
            return Err(ServiceError::ReviewExists(work.id));
        }

        let review = self
            .db_client
            .create_review(
                work.id,
                freelancer_id,
                user.id,
                body.rating,
                body.comment.trim().to_string(),
            )
            .await
            .map_err(|e| {
                // Lost a race against a concurrent submit for the same work.
                if is_unique_violation(&e) {
                    ServiceError::ReviewExists(work.id)
                } else {
                    ServiceError::Database(e)
                }
            })?;

        tracing::info!(work_id = %work.id, freelancer_id = %freelancer_id, rating = review.rating, "review created");
        Ok(review)
    }

    pub async fn hires(&self, user: &User) -> Result<Vec<WorkWithReviewDto>, ServiceError> {
        let works = self.db_client.get_works_for_job_seeker(user.id).await?;
        self.with_reviews(works).await
    }

    pub async fn freelancer_overview(&self, user: &User) -> Result<FreelancerOverviewDto, ServiceError> {
        let profile = self
            .db_client
            .get_freelancer_profile(user.id)
            .await?
            .ok_or(ServiceError::FreelancerProfileNotFound(user.id))?;

        let works = self.db_client.get_works_for_freelancer(user.id).await?;
        let works = self.with_reviews(works).await?;
        let reviews = self.db_client.get_freelancer_reviews(user.id).await?;

        Ok(FreelancerOverviewDto {
            profile,
            works,
            reviews,
        })
    }

    pub async fn upsert_profile(
        &self,
        user: &User,
        body: UpsertProfileDto,
    ) -> Result<FreelancerProfile, ServiceError> {
        if user.role != UserRole::Freelancer {
            return Err(ServiceError::Forbidden(
                "Only freelancers can maintain a freelancer profile".to_string(),
            ));
        }

        let skills = normalize_skills(body.skills);
        let bio = body.bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());

        let profile = self
            .db_client
            .upsert_freelancer_profile(
                user.id,
                body.display_name.trim().to_string(),
                body.headline.trim().to_string(),
                bio,
                skills,
            )
            .await?;

        tracing::info!(user_id = %user.id, "freelancer profile saved");
        Ok(profile)
    }

    pub async fn freelancer_reviews(&self, freelancer_id: Uuid) -> Result<Vec<Review>, ServiceError> {
        Ok(self.db_client.get_freelancer_reviews(freelancer_id).await?)
    }

    pub async fn history(&self, user: &User, work_id: Uuid) -> Result<Vec<WorkStatusChange>, ServiceError> {
        let work = self
            .db_client
            .get_work(work_id)
            .await?
            .ok_or(ServiceError::WorkNotFound(work_id))?;

        if !work.involves(user.id) && !user.is_admin() {
            return Err(ServiceError::UnauthorizedWorkAccess(user.id, work_id));
        }

        Ok(self.db_client.get_work_history(work_id).await?)
    }

    async fn with_reviews(&self, works: Vec<Work>) -> Result<Vec<WorkWithReviewDto>, ServiceError> {
        let ids: Vec<Uuid> = works.iter().map(|w| w.id).collect();
        let reviews = self.db_client.get_reviews_for_works(&ids).await?;
        Ok(attach_reviews(works, reviews))
    }
}

/// Pairs each work with its review, keeping the order of `works`.
pub fn attach_reviews(works: Vec<Work>, reviews: Vec<Review>) -> Vec<WorkWithReviewDto> {
    let mut by_work: HashMap<Uuid, Review> = reviews.into_iter().map(|r| (r.work_id, r)).collect();
    works
        .into_iter()
        .map(|work| {
            let review = by_work.remove(&work.id);
            WorkWithReviewDto::new(work, review)
        })
        .collect()
}

/// Trims, drops empties and de-duplicates case-insensitively.
pub fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testutils::insert_user;
    use chrono::Utc;
    use sqlx::{types::BigDecimal, PgPool};

    fn work(status: WorkStatus) -> Work {
        Work {
            id: Uuid::new_v4(),
            job_title: "Logo Design".to_string(),
            description: None,
            price: BigDecimal::from(500),
            duration: 3,
            status,
            job_seeker_id: Uuid::new_v4(),
            freelancer_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    fn review_for(work: &Work) -> Review {
        Review {
            id: Uuid::new_v4(),
            work_id: work.id,
            freelancer_id: work.freelancer_id,
            reviewer_id: work.job_seeker_id,
            rating: 5,
            comment: "Great".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn completed_work_without_review_can_be_reviewed() {
        let completed = work(WorkStatus::Completed);
        let reviewed = work(WorkStatus::Completed);
        let running = work(WorkStatus::InProgress);
        let review = review_for(&reviewed);

        let rows = attach_reviews(
            vec![completed.clone(), reviewed.clone(), running.clone()],
            vec![review],
        );

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].work.id, completed.id);
        assert!(rows[0].can_review);
        assert!(rows[1].review.is_some());
        assert!(!rows[1].can_review);
        assert!(!rows[2].can_review);
    }

    #[test]
    fn delete_flag_follows_status() {
        let rows = attach_reviews(
            vec![work(WorkStatus::OfferPending), work(WorkStatus::Cancelled), work(WorkStatus::Submitted)],
            vec![],
        );
        let flags: Vec<bool> = rows.iter().map(|r| r.can_delete).collect();
        assert_eq!(flags, vec![true, true, false]);
    }

    #[test]
    fn work_rows_serialize_flat_with_review() {
        let w = work(WorkStatus::Completed);
        let row = WorkWithReviewDto::new(w.clone(), Some(review_for(&w)));
        let json = serde_json::to_value(&row).unwrap();

        assert_eq!(json["jobTitle"], "Logo Design");
        assert_eq!(json["status"], "COMPLETED");
        assert_eq!(json["review"]["rating"], 5);
        assert_eq!(json["canReview"], false);
    }

    #[test]
    fn skills_are_normalized() {
        let skills = normalize_skills(vec![
            " Figma ".to_string(),
            "figma".to_string(),
            "".to_string(),
            "Illustrator".to_string(),
        ]);
        assert_eq!(skills, vec!["Figma".to_string(), "Illustrator".to_string()]);
    }

    struct Parties {
        service: WorkService,
        db: Arc<DBClient>,
        freelancer: User,
        seeker: User,
        admin: User,
    }

    async fn parties(pool: PgPool) -> Parties {
        let freelancer = insert_user(&pool, "Freelancer", UserRole::Freelancer).await;
        let seeker = insert_user(&pool, "Seeker", UserRole::JobSeeker).await;
        let admin = insert_user(&pool, "Admin", UserRole::Admin).await;
        let db = Arc::new(DBClient::new(pool));

        Parties {
            service: WorkService::new(db.clone()),
            db,
            freelancer,
            seeker,
            admin,
        }
    }

    fn logo_offer(job_seeker_id: Uuid) -> CreateOfferDto {
        CreateOfferDto {
            job_seeker_id,
            job_title: "  Logo Design ".to_string(),
            price: 500.0,
            duration: 3,
            description: None,
        }
    }

    async fn offer(p: &Parties) -> Work {
        p.service
            .create_offer(&p.freelancer, logo_offer(p.seeker.id))
            .await
            .unwrap()
    }

    async fn step(p: &Parties, user: &User, work_id: Uuid, target: WorkStatus) -> Work {
        p.service
            .change_status(user, work_id, target, false)
            .await
            .unwrap()
            .work
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn logo_design_walks_the_full_lifecycle(pool: PgPool) {
        let p = parties(pool).await;
        p.service
            .upsert_profile(
                &p.freelancer,
                UpsertProfileDto {
                    display_name: "Fran".to_string(),
                    headline: "Brand designer".to_string(),
                    bio: None,
                    skills: vec!["Figma".to_string()],
                },
            )
            .await
            .unwrap();

        let work = offer(&p).await;
        assert_eq!(work.status, WorkStatus::OfferPending);
        assert_eq!(work.job_title, "Logo Design");
        assert_eq!(work.price, BigDecimal::from(500));

        let (fl, js) = (&p.freelancer, &p.seeker);
        assert_eq!(step(&p, js, work.id, WorkStatus::InProgress).await.status, WorkStatus::InProgress);
        assert_eq!(step(&p, fl, work.id, WorkStatus::Submitted).await.status, WorkStatus::Submitted);
        assert_eq!(
            step(&p, js, work.id, WorkStatus::RevisionRequested).await.status,
            WorkStatus::RevisionRequested
        );
        assert_eq!(step(&p, fl, work.id, WorkStatus::Submitted).await.status, WorkStatus::Submitted);

        let completed = step(&p, js, work.id, WorkStatus::Completed).await;
        assert_eq!(completed.status, WorkStatus::Completed);
        assert!(completed.completed_at.is_some());

        let review = p
            .service
            .submit_review(
                js,
                fl.id,
                CreateReviewDto {
                    work_id: work.id,
                    rating: 5,
                    comment: "Great".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(review.rating, 5);

        let again = p
            .service
            .submit_review(
                js,
                fl.id,
                CreateReviewDto {
                    work_id: work.id,
                    rating: 4,
                    comment: "Again".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(again, ServiceError::ReviewExists(_)));
        assert_eq!(again.status_code(), axum::http::StatusCode::CONFLICT);

        let hires = p.service.hires(js).await.unwrap();
        assert_eq!(hires.len(), 1);
        assert_eq!(hires[0].review.as_ref().map(|r| r.id), Some(review.id));
        assert!(!hires[0].can_review);

        let overview = p.service.freelancer_overview(fl).await.unwrap();
        assert_eq!(overview.profile.review_count, 1);
        assert_eq!(overview.profile.completed_works, 1);
        assert!((overview.profile.rating - 5.0).abs() < f32::EPSILON);
        assert_eq!(overview.reviews.len(), 1);

        let history = p.service.history(js, work.id).await.unwrap();
        assert_eq!(history.len(), 6);
        assert_eq!(history.iter().filter(|c| c.from_status.is_none()).count(), 1);
        assert!(history.iter().any(|c| c.from_status == Some(WorkStatus::Submitted)
            && c.to_status == WorkStatus::Completed));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn parties_cannot_take_each_others_actions(pool: PgPool) {
        let p = parties(pool).await;
        let work = offer(&p).await;

        let err = p
            .service
            .change_status(&p.freelancer, work.id, WorkStatus::InProgress, false)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);

        let err = p
            .service
            .change_status(&p.seeker, work.id, WorkStatus::Completed, false)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let stranger = insert_user(&p.db.pool, "Stranger", UserRole::JobSeeker).await;
        let err = p
            .service
            .change_status(&stranger, work.id, WorkStatus::InProgress, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnauthorizedWorkAccess(_, _)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn stale_status_update_loses_the_race(pool: PgPool) {
        let p = parties(pool).await;
        let work = offer(&p).await;

        let first = p
            .db
            .update_work_status(work.id, WorkStatus::OfferPending, WorkStatus::InProgress, p.seeker.id)
            .await
            .unwrap();
        assert!(first.is_some());

        // A second writer that still believes the offer is pending.
        let second = p
            .db
            .update_work_status(work.id, WorkStatus::OfferPending, WorkStatus::Cancelled, p.freelancer.id)
            .await
            .unwrap();
        assert!(second.is_none());

        let current = p.db.get_work(work.id).await.unwrap().unwrap();
        assert_eq!(current.status, WorkStatus::InProgress);
        assert_eq!(ServiceError::ConcurrentUpdate(work.id).status_code(), axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn only_pending_or_cancelled_work_can_be_deleted(pool: PgPool) {
        let p = parties(pool).await;

        let running = offer(&p).await;
        step(&p, &p.seeker, running.id, WorkStatus::InProgress).await;
        let err = p.service.delete_work(&p.freelancer, running.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotDeletable(_, WorkStatus::InProgress)));

        let pending = offer(&p).await;
        let err = p.service.delete_work(&p.seeker, pending.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::UnauthorizedWorkAccess(_, _)));

        p.service.delete_work(&p.freelancer, pending.id).await.unwrap();
        assert!(p.db.get_work(pending.id).await.unwrap().is_none());

        let withdrawn = offer(&p).await;
        step(&p, &p.freelancer, withdrawn.id, WorkStatus::Cancelled).await;
        p.service.delete_work(&p.freelancer, withdrawn.id).await.unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn disputes_are_admin_only(pool: PgPool) {
        let p = parties(pool).await;
        let work = offer(&p).await;
        step(&p, &p.seeker, work.id, WorkStatus::InProgress).await;

        let err = p
            .service
            .change_status(&p.seeker, work.id, WorkStatus::Disputed, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));

        // Admin rights only apply on the admin route.
        assert!(p
            .service
            .change_status(&p.admin, work.id, WorkStatus::Disputed, false)
            .await
            .is_err());

        let disputed = p
            .service
            .change_status(&p.admin, work.id, WorkStatus::Disputed, true)
            .await
            .unwrap();
        assert_eq!(disputed.previous_status, WorkStatus::InProgress);
        assert_eq!(disputed.work.status, WorkStatus::Disputed);

        let resolved = p
            .service
            .change_status(&p.admin, work.id, WorkStatus::Completed, true)
            .await
            .unwrap();
        assert_eq!(resolved.work.status, WorkStatus::Completed);
        assert!(resolved.work.completed_at.is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn review_requires_completed_work(pool: PgPool) {
        let p = parties(pool).await;
        let work = offer(&p).await;

        let err = p
            .service
            .submit_review(
                &p.seeker,
                p.freelancer.id,
                CreateReviewDto {
                    work_id: work.id,
                    rating: 5,
                    comment: "Too early".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotReviewable(_, WorkStatus::OfferPending)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn offers_need_a_real_counterparty(pool: PgPool) {
        let p = parties(pool).await;

        let err = p
            .service
            .create_offer(&p.freelancer, logo_offer(p.freelancer.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = p
            .service
            .create_offer(&p.freelancer, logo_offer(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound(_)));

        let err = p
            .service
            .create_offer(&p.seeker, logo_offer(p.freelancer.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }
}
