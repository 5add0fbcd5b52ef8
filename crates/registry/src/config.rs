/// Votes needed before a review is resolved.
pub const VOTE_THRESHOLD: usize = 3;

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("vote threshold must be at least 1")]
    ZeroThreshold,

    #[error("event capacity must be at least 1")]
    ZeroEventCapacity,

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub vote_threshold: usize,
    /// Lets a poster apply to their own job.
    pub allow_self_claim: bool,
    /// Lets the poster and worker of a job vote on its review.
    pub allow_party_votes: bool,
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            vote_threshold: VOTE_THRESHOLD,
            allow_self_claim: false,
            allow_party_votes: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vote_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        Ok(())
    }
}
