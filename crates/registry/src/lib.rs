pub mod config;
pub mod demo;
pub mod error;
pub mod storage;

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use microjob_core::enums::{JobAction, JobStatus, RegistryEvent, VoteDecision};
use microjob_core::ids::{Identity, JobId};
use microjob_core::job::{Job, Vote};
use tokio::sync::broadcast;

pub use crate::config::{ConfigError, RegistryConfig, VOTE_THRESHOLD};
pub use crate::error::{ErrorKind, RegistryError};

const FIRST_JOB_ID: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFilter {
    All,
    Status(JobStatus),
    PostedBy(Identity),
    WorkedBy(Identity),
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        match self {
            JobFilter::All => true,
            JobFilter::Status(status) => job.status == *status,
            JobFilter::PostedBy(poster) => job.is_poster(poster),
            JobFilter::WorkedBy(worker) => job.is_worker(worker),
        }
    }
}

/// System of record for jobs.
///
/// Each mutating operation holds the job's map entry for its whole
/// check-and-apply step, so two operations on the same id never both act on
/// the same pre-state. Work happens on a copy that is only written back once
/// every precondition has passed.
pub struct JobRegistry {
    jobs: DashMap<JobId, Job>,
    next_id: AtomicU64,
    config: RegistryConfig,
    events: broadcast::Sender<RegistryEvent>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::build(RegistryConfig::default(), DashMap::new(), FIRST_JOB_ID)
    }
}

impl JobRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, DashMap::new(), FIRST_JOB_ID))
    }

    /// Rebuilds a registry from exported jobs. Ids continue after the
    /// largest restored id; every job must satisfy the lifecycle invariants.
    pub fn from_snapshot(
        config: RegistryConfig,
        jobs: Vec<Job>,
    ) -> Result<Self, RegistryError> {
        config
            .validate()
            .map_err(|e| RegistryError::InvalidInput(e.to_string()))?;

        let mut seen = HashSet::with_capacity(jobs.len());
        let map = DashMap::with_capacity(jobs.len());
        let mut next_id = FIRST_JOB_ID;
        for job in jobs {
            if !seen.insert(job.id) {
                return Err(RegistryError::InvalidInput(format!(
                    "snapshot contains job {} twice",
                    job.id
                )));
            }
            validate_restored(&job)?;
            let after = job.id.0.checked_add(1).ok_or_else(|| {
                RegistryError::InvalidInput(format!("job id {} leaves no room for new ids", job.id))
            })?;
            next_id = next_id.max(after);
            map.insert(job.id, job);
        }

        tracing::info!(count = map.len(), next_id, "registry restored from snapshot");
        Ok(Self::build(config, map, next_id))
    }

    fn build(config: RegistryConfig, jobs: DashMap<JobId, Job>, next_id: u64) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            jobs,
            next_id: AtomicU64::new(next_id),
            config,
            events,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub fn create_job(
        &self,
        poster: &Identity,
        description: &str,
        reward: u64,
        deadline: u64,
    ) -> Result<Job, RegistryError> {
        require_identity(poster)?;
        if description.trim().is_empty() {
            return Err(RegistryError::InvalidInput(
                "description must not be empty".to_string(),
            ));
        }
        if reward == 0 {
            return Err(RegistryError::InvalidInput(
                "reward must be greater than zero".to_string(),
            ));
        }

        // The counter never wraps, so an issued id is never handed out again.
        let id = self
            .next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_add(1))
            .map(JobId)
            .map_err(|_| RegistryError::InvalidInput("job ids exhausted".to_string()))?;
        let job = Job {
            id,
            description: description.to_string(),
            reward,
            deadline,
            status: JobStatus::Open,
            poster: poster.clone(),
            worker: None,
            result_reference: None,
            votes: Vec::new(),
        };
        match self.jobs.entry(id) {
            Entry::Occupied(_) => {
                return Err(RegistryError::InvalidInput(format!(
                    "job id {id} is already taken"
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(job.clone());
            }
        }

        tracing::info!(job_id = %id, %poster, reward, deadline, "job created");
        self.publish(RegistryEvent::JobCreated {
            job_id: id,
            poster: poster.clone(),
            reward,
        });
        Ok(job)
    }

    pub fn apply_to_job(&self, job_id: JobId, worker: &Identity) -> Result<Job, RegistryError> {
        self.mutate(job_id, worker, JobAction::Apply, |job| {
            job.worker = Some(worker.clone());
            job.status = JobStatus::Claimed;
            tracing::info!(job_id = %job_id, %worker, "job claimed");
            Ok(vec![RegistryEvent::JobClaimed {
                job_id,
                worker: worker.clone(),
            }])
        })
    }

    pub fn submit_result(
        &self,
        job_id: JobId,
        worker: &Identity,
        result_reference: &str,
    ) -> Result<Job, RegistryError> {
        self.mutate(job_id, worker, JobAction::SubmitResult, |job| {
            if result_reference.trim().is_empty() {
                return Err(RegistryError::InvalidInput(
                    "result reference must not be empty".to_string(),
                ));
            }
            job.result_reference = Some(result_reference.to_string());
            job.status = JobStatus::InReview;
            tracing::info!(job_id = %job_id, %worker, result_reference, "result submitted");
            Ok(vec![RegistryEvent::ResultSubmitted {
                job_id,
                result_reference: result_reference.to_string(),
            }])
        })
    }

    /// Records a vote and resolves the review as soon as the threshold is
    /// reached. The vote and the resolution land together.
    pub fn cast_vote(
        &self,
        job_id: JobId,
        voter: &Identity,
        decision: VoteDecision,
    ) -> Result<Job, RegistryError> {
        let threshold = self.config.vote_threshold;
        self.mutate(job_id, voter, JobAction::Vote, |job| {
            job.votes.push(Vote {
                voter: voter.clone(),
                decision,
            });
            let mut events = vec![RegistryEvent::VoteCast {
                job_id,
                voter: voter.clone(),
                decision,
            }];

            let tally = job.tally();
            tracing::info!(
                job_id = %job_id,
                %voter,
                ?decision,
                approvals = tally.approvals,
                rejections = tally.rejections,
                "vote cast"
            );

            if tally.total() >= threshold {
                job.status = tally.outcome();
                tracing::info!(job_id = %job_id, status = %job.status, "review resolved");
                events.push(RegistryEvent::ReviewResolved {
                    job_id,
                    status: job.status,
                });
            }
            Ok(events)
        })
    }

    pub fn claim_reward(&self, job_id: JobId, worker: &Identity) -> Result<Job, RegistryError> {
        self.mutate(job_id, worker, JobAction::ClaimReward, |job| {
            job.status = JobStatus::Completed;
            tracing::info!(job_id = %job_id, %worker, reward = job.reward, "reward released");
            Ok(vec![RegistryEvent::RewardReleased {
                job_id,
                worker: worker.clone(),
                reward: job.reward,
            }])
        })
    }

    pub fn cancel_job(&self, job_id: JobId, poster: &Identity) -> Result<Job, RegistryError> {
        self.mutate(job_id, poster, JobAction::Cancel, |job| {
            job.status = JobStatus::Cancelled;
            tracing::info!(job_id = %job_id, %poster, "job cancelled");
            Ok(vec![RegistryEvent::JobCancelled { job_id }])
        })
    }

    pub fn get_job(&self, job_id: JobId) -> Result<Job, RegistryError> {
        self.jobs
            .get(&job_id)
            .map(|entry| entry.value().clone())
            .ok_or(RegistryError::NotFound(job_id))
    }

    /// All jobs, ordered by id.
    pub fn list_jobs(&self) -> Vec<Job> {
        self.list_jobs_filtered(&JobFilter::All)
    }

    pub fn list_jobs_filtered(&self, filter: &JobFilter) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .jobs
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        jobs.sort_by_key(|job| job.id);
        jobs
    }

    pub fn snapshot(&self) -> Vec<Job> {
        self.list_jobs()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Actions `identity` could successfully start on the job right now.
    pub fn allowed_actions(
        &self,
        job_id: JobId,
        identity: &Identity,
    ) -> Result<BTreeSet<JobAction>, RegistryError> {
        let entry = self
            .jobs
            .get(&job_id)
            .ok_or(RegistryError::NotFound(job_id))?;
        let job = entry.value();
        if require_identity(identity).is_err() {
            return Ok(BTreeSet::new());
        }

        Ok([
            JobAction::Apply,
            JobAction::SubmitResult,
            JobAction::Vote,
            JobAction::ClaimReward,
            JobAction::Cancel,
        ]
        .into_iter()
        .filter(|action| self.check(job, identity, *action).is_ok())
        .collect())
    }

    /// Status, role and duplicate-vote preconditions for `action`.
    /// Status is checked first so that out-of-order calls always report
    /// `InvalidTransition`.
    fn check(&self, job: &Job, identity: &Identity, action: JobAction) -> Result<(), RegistryError> {
        let required = match action {
            JobAction::Apply | JobAction::Cancel => JobStatus::Open,
            JobAction::SubmitResult => JobStatus::Claimed,
            JobAction::Vote => JobStatus::InReview,
            JobAction::ClaimReward => JobStatus::Approved,
        };
        if job.status != required {
            return Err(RegistryError::InvalidTransition {
                job_id: job.id,
                status: job.status,
                action,
            });
        }

        let authorized = match action {
            JobAction::Apply => self.config.allow_self_claim || !job.is_poster(identity),
            JobAction::SubmitResult | JobAction::ClaimReward => job.is_worker(identity),
            JobAction::Cancel => job.is_poster(identity),
            JobAction::Vote => {
                self.config.allow_party_votes
                    || !(job.is_poster(identity) || job.is_worker(identity))
            }
        };
        if !authorized {
            return Err(RegistryError::Unauthorized {
                job_id: job.id,
                identity: identity.clone(),
                action,
            });
        }

        if action == JobAction::Vote && job.has_voted(identity) {
            return Err(RegistryError::DuplicateVote {
                job_id: job.id,
                voter: identity.clone(),
            });
        }
        Ok(())
    }

    fn mutate<F>(
        &self,
        job_id: JobId,
        identity: &Identity,
        action: JobAction,
        apply: F,
    ) -> Result<Job, RegistryError>
    where
        F: FnOnce(&mut Job) -> Result<Vec<RegistryEvent>, RegistryError>,
    {
        let result = self.try_mutate(job_id, identity, action, apply);
        if let Err(ref e) = result {
            tracing::debug!(job_id = %job_id, %identity, %action, error = %e, "operation rejected");
        }
        result
    }

    fn try_mutate<F>(
        &self,
        job_id: JobId,
        identity: &Identity,
        action: JobAction,
        apply: F,
    ) -> Result<Job, RegistryError>
    where
        F: FnOnce(&mut Job) -> Result<Vec<RegistryEvent>, RegistryError>,
    {
        require_identity(identity)?;
        let mut entry = self
            .jobs
            .get_mut(&job_id)
            .ok_or(RegistryError::NotFound(job_id))?;

        self.check(entry.value(), identity, action)?;
        let mut next = entry.value().clone();
        let events = apply(&mut next)?;
        *entry.value_mut() = next.clone();

        // Published under the entry lock so per-job event order matches
        // transition order.
        for event in events {
            self.publish(event);
        }
        Ok(next)
    }

    fn publish(&self, event: RegistryEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

/// Field invariants a job must hold for its status.
fn validate_restored(job: &Job) -> Result<(), RegistryError> {
    let broken = |why: &str| {
        Err(RegistryError::InvalidInput(format!(
            "snapshot job {} ({}): {why}",
            job.id, job.status
        )))
    };

    if job.description.trim().is_empty() {
        return broken("empty description");
    }
    if job.reward == 0 {
        return broken("zero reward");
    }
    if job.poster.as_str().trim().is_empty() {
        return broken("empty poster");
    }

    let mut voters = HashSet::with_capacity(job.votes.len());
    if !job.votes.iter().all(|v| voters.insert(&v.voter)) {
        return broken("duplicate voter");
    }

    let (has_worker, has_result, may_have_votes) = match job.status {
        JobStatus::Open | JobStatus::Cancelled => (false, false, false),
        JobStatus::Claimed => (true, false, false),
        JobStatus::InReview
        | JobStatus::Approved
        | JobStatus::Rejected
        | JobStatus::Completed => (true, true, true),
    };
    if job.worker.is_some() != has_worker {
        return broken(if has_worker { "missing worker" } else { "unexpected worker" });
    }
    if job.result_reference.is_some() != has_result {
        return broken(if has_result {
            "missing result reference"
        } else {
            "unexpected result reference"
        });
    }
    if !may_have_votes && !job.votes.is_empty() {
        return broken("votes before review");
    }
    Ok(())
}

fn require_identity(identity: &Identity) -> Result<(), RegistryError> {
    if identity.as_str().trim().is_empty() {
        return Err(RegistryError::InvalidInput(
            "identity must not be empty".to_string(),
        ));
    }
    Ok(())
}
