use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "work_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkStatus {
    OfferPending,
    InProgress,
    Submitted,
    RevisionRequested,
    Completed,
    Disputed,
    Cancelled,
}

impl WorkStatus {
    pub fn to_str(&self) -> &str {
        match self {
            WorkStatus::OfferPending => "OFFER_PENDING",
            WorkStatus::InProgress => "IN_PROGRESS",
            WorkStatus::Submitted => "SUBMITTED",
            WorkStatus::RevisionRequested => "REVISION_REQUESTED",
            WorkStatus::Completed => "COMPLETED",
            WorkStatus::Disputed => "DISPUTED",
            WorkStatus::Cancelled => "CANCELLED",
        }
    }

    /// Works may only be removed before anything was delivered.
    pub fn is_deletable(&self) -> bool {
        matches!(self, WorkStatus::OfferPending | WorkStatus::Cancelled)
    }

    pub fn accepts_review(&self) -> bool {
        *self == WorkStatus::Completed
    }

    /// Resolves the action that moves a work from `self` to `target`.
    pub fn action_to(&self, target: WorkStatus) -> Option<WorkAction> {
        WorkAction::ALL
            .iter()
            .copied()
            .find(|action| action.sources().contains(self) && action.target() == target)
    }

    /// Validates a transition requested by `party` and returns the resulting status.
    pub fn transition(
        &self,
        target: WorkStatus,
        party: WorkParty,
    ) -> Result<WorkAction, TransitionError> {
        // OFFER_PENDING -> CANCELLED is both Decline and Withdraw.
        if let Some(action) = WorkAction::ALL.iter().copied().find(|action| {
            action.sources().contains(self) && action.target() == target && action.actor() == party
        }) {
            return Ok(action);
        }

        let action = self.action_to(target).ok_or(TransitionError::NotAllowed {
            from: *self,
            to: target,
        })?;

        Err(TransitionError::WrongParty {
            action,
            expected: action.actor(),
            actual: party,
        })
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// The role a user plays relative to one specific work.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkParty {
    JobSeeker,
    Freelancer,
    Admin,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkAction {
    Accept,
    Decline,
    Withdraw,
    Submit,
    Approve,
    RequestRevision,
    Resubmit,
    Escalate,
    ResolveForFreelancer,
    ResolveForJobSeeker,
}

impl WorkAction {
    pub const ALL: [WorkAction; 10] = [
        WorkAction::Accept,
        WorkAction::Decline,
        WorkAction::Withdraw,
        WorkAction::Submit,
        WorkAction::Approve,
        WorkAction::RequestRevision,
        WorkAction::Resubmit,
        WorkAction::Escalate,
        WorkAction::ResolveForFreelancer,
        WorkAction::ResolveForJobSeeker,
    ];

    pub fn sources(&self) -> &'static [WorkStatus] {
        match self {
            WorkAction::Accept | WorkAction::Decline | WorkAction::Withdraw => {
                &[WorkStatus::OfferPending]
            }
            WorkAction::Submit => &[WorkStatus::InProgress],
            WorkAction::Approve | WorkAction::RequestRevision => &[WorkStatus::Submitted],
            WorkAction::Resubmit => &[WorkStatus::RevisionRequested],
            WorkAction::Escalate => &[
                WorkStatus::InProgress,
                WorkStatus::Submitted,
                WorkStatus::RevisionRequested,
            ],
            WorkAction::ResolveForFreelancer | WorkAction::ResolveForJobSeeker => {
                &[WorkStatus::Disputed]
            }
        }
    }

    pub fn target(&self) -> WorkStatus {
        match self {
            WorkAction::Accept => WorkStatus::InProgress,
            WorkAction::Decline | WorkAction::Withdraw => WorkStatus::Cancelled,
            WorkAction::Submit | WorkAction::Resubmit => WorkStatus::Submitted,
            WorkAction::Approve => WorkStatus::Completed,
            WorkAction::RequestRevision => WorkStatus::RevisionRequested,
            WorkAction::Escalate => WorkStatus::Disputed,
            WorkAction::ResolveForFreelancer => WorkStatus::Completed,
            WorkAction::ResolveForJobSeeker => WorkStatus::Cancelled,
        }
    }

    pub fn actor(&self) -> WorkParty {
        match self {
            WorkAction::Accept
            | WorkAction::Decline
            | WorkAction::Approve
            | WorkAction::RequestRevision => WorkParty::JobSeeker,
            WorkAction::Withdraw | WorkAction::Submit | WorkAction::Resubmit => {
                WorkParty::Freelancer
            }
            WorkAction::Escalate
            | WorkAction::ResolveForFreelancer
            | WorkAction::ResolveForJobSeeker => WorkParty::Admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Cannot change work status from {from} to {to}")]
    NotAllowed { from: WorkStatus, to: WorkStatus },

    #[error("{action:?} must be performed by the {expected:?}, not the {actual:?}")]
    WrongParty {
        action: WorkAction,
        expected: WorkParty,
        actual: WorkParty,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub id: Uuid,
    pub job_title: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub duration: i32,
    pub status: WorkStatus,
    pub job_seeker_id: Uuid,
    pub freelancer_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Work {
    /// Admins are resolved first so an admin acting on their own work still
    /// gets the admin-only transitions.
    pub fn party_of(&self, user_id: Uuid, is_admin: bool) -> Option<WorkParty> {
        if is_admin {
            Some(WorkParty::Admin)
        } else if user_id == self.job_seeker_id {
            Some(WorkParty::JobSeeker)
        } else if user_id == self.freelancer_id {
            Some(WorkParty::Freelancer)
        } else {
            None
        }
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        user_id == self.job_seeker_id || user_id == self.freelancer_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub work_id: Uuid,
    pub freelancer_id: Uuid,
    pub reviewer_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkStatusChange {
    pub id: Uuid,
    pub work_id: Uuid,
    pub from_status: Option<WorkStatus>,
    pub to_status: WorkStatus,
    pub changed_by: Uuid,
    pub created_at: DateTime<Utc>,
}
