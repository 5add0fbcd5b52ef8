use microjob_core::enums::{JobAction, JobStatus};
use microjob_core::ids::{Identity, JobId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("job {0} not found")]
    NotFound(JobId),

    #[error("cannot {action} job {job_id} while it is {status}")]
    InvalidTransition {
        job_id: JobId,
        status: JobStatus,
        action: JobAction,
    },

    #[error("{identity} may not {action} job {job_id}")]
    Unauthorized {
        job_id: JobId,
        identity: Identity,
        action: JobAction,
    },

    #[error("{voter} has already voted on job {job_id}")]
    DuplicateVote { job_id: JobId, voter: Identity },
}

/// Category of a [`RegistryError`], without the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    InvalidTransition,
    Unauthorized,
    DuplicateVote,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::InvalidInput(_) => ErrorKind::InvalidInput,
            RegistryError::NotFound(_) => ErrorKind::NotFound,
            RegistryError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            RegistryError::Unauthorized { .. } => ErrorKind::Unauthorized,
            RegistryError::DuplicateVote { .. } => ErrorKind::DuplicateVote,
        }
    }
}
