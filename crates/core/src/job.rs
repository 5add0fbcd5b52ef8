use serde::{Deserialize, Serialize};

use crate::{
    enums::{JobStatus, VoteDecision},
    ids::{Identity, JobId},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: Identity,
    pub decision: VoteDecision,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub description: String,
    pub reward: u64,
    /// Unix seconds. Advisory only.
    pub deadline: u64,
    pub status: JobStatus,
    pub poster: Identity,
    pub worker: Option<Identity>,
    pub result_reference: Option<String>,
    pub votes: Vec<Vote>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub approvals: usize,
    pub rejections: usize,
}

impl VoteTally {
    pub fn total(&self) -> usize {
        self.approvals + self.rejections
    }

    /// Outcome once quorum is met. Ties go to Rejected.
    pub fn outcome(&self) -> JobStatus {
        if self.approvals > self.rejections {
            JobStatus::Approved
        } else {
            JobStatus::Rejected
        }
    }
}

impl Job {
    pub fn tally(&self) -> VoteTally {
        self.votes
            .iter()
            .fold(VoteTally::default(), |mut tally, vote| {
                match vote.decision {
                    VoteDecision::Approve => tally.approvals += 1,
                    VoteDecision::Reject => tally.rejections += 1,
                }
                tally
            })
    }

    pub fn has_voted(&self, identity: &Identity) -> bool {
        self.votes.iter().any(|v| &v.voter == identity)
    }

    pub fn is_poster(&self, identity: &Identity) -> bool {
        &self.poster == identity
    }

    pub fn is_worker(&self, identity: &Identity) -> bool {
        self.worker.as_ref() == Some(identity)
    }

    pub fn is_past_deadline(&self, now: u64) -> bool {
        self.deadline < now
    }
}
