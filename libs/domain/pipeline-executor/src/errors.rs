// [libs/domain/pipeline-executor/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("input blob is missing or unreadable: {0}")]
    InputUnavailable(String),

    #[error("decompilation collaborator failed: {0}")]
    Decompiler(#[from] bin2nlp_infra_decompiler_client::DecompilerError),

    #[error("llm provider failed: {0}")]
    Llm(#[from] bin2nlp_infra_llm_client::LlmClientError),

    #[error("blob store failed: {0}")]
    Blob(#[from] bin2nlp_infra_blob_store::BlobError),

    #[error("credential vault failed: {0}")]
    Vault(#[from] bin2nlp_core_credential_vault::VaultError),

    #[error("metadata store failed: {0}")]
    JobQueue(#[from] bin2nlp_domain_job_queue::JobQueueError),

    #[error("job has no usable provider configuration")]
    NoProviderConfigured,

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
