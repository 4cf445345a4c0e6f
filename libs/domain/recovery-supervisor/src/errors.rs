// [libs/domain/recovery-supervisor/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("job queue failed: {0}")]
    JobQueue(#[from] bin2nlp_domain_job_queue::JobQueueError),
}
