use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::{Identity, JobId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Open,
    Claimed,
    InReview,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        JobStatus::Open,
        JobStatus::Claimed,
        JobStatus::InReview,
        JobStatus::Approved,
        JobStatus::Rejected,
        JobStatus::Completed,
        JobStatus::Cancelled,
    ];

    /// Completed, Cancelled and Rejected jobs never move again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::Rejected
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "Open",
            JobStatus::Claimed => "Claimed",
            JobStatus::InReview => "InReview",
            JobStatus::Approved => "Approved",
            JobStatus::Rejected => "Rejected",
            JobStatus::Completed => "Completed",
            JobStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown job status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| *c != '_' && *c != ' ').collect();
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteDecision {
    Approve,
    Reject,
}

/// Operations an identity may attempt on a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobAction {
    Apply,
    SubmitResult,
    Vote,
    ClaimReward,
    Cancel,
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobAction::Apply => "apply",
            JobAction::SubmitResult => "submit result",
            JobAction::Vote => "vote",
            JobAction::ClaimReward => "claim reward",
            JobAction::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

/// Published by the registry after each successful mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    JobCreated {
        job_id: JobId,
        poster: Identity,
        reward: u64,
    },
    JobClaimed {
        job_id: JobId,
        worker: Identity,
    },
    ResultSubmitted {
        job_id: JobId,
        result_reference: String,
    },
    VoteCast {
        job_id: JobId,
        voter: Identity,
        decision: VoteDecision,
    },
    ReviewResolved {
        job_id: JobId,
        status: JobStatus,
    },
    /// Hand-off to the payment authority; the registry moves no funds itself.
    RewardReleased {
        job_id: JobId,
        worker: Identity,
        reward: u64,
    },
    JobCancelled {
        job_id: JobId,
    },
}

impl RegistryEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            RegistryEvent::JobCreated { job_id, .. }
            | RegistryEvent::JobClaimed { job_id, .. }
            | RegistryEvent::ResultSubmitted { job_id, .. }
            | RegistryEvent::VoteCast { job_id, .. }
            | RegistryEvent::ReviewResolved { job_id, .. }
            | RegistryEvent::RewardReleased { job_id, .. }
            | RegistryEvent::JobCancelled { job_id } => *job_id,
        }
    }
}
