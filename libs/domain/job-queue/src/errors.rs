// [libs/domain/job-queue/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobQueueError {
    #[error("job not found")]
    NotFound,

    #[error("lease ownership conflict: job is held by a different worker")]
    OwnershipConflict,

    #[error("metadata store unavailable: {0}")]
    Storage(String),
}

impl From<bin2nlp_infra_db::DbError> for JobQueueError {
    fn from(error: bin2nlp_infra_db::DbError) -> Self {
        match error {
            bin2nlp_infra_db::DbError::JobNotFound => JobQueueError::NotFound,
            bin2nlp_infra_db::DbError::OwnershipConflict => JobQueueError::OwnershipConflict,
            other => JobQueueError::Storage(other.to_string()),
        }
    }
}
