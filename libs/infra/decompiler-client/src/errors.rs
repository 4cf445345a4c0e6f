// [libs/infra/decompiler-client/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecompilerError {
    #[error("failed to spawn decompiler collaborator: {0}")]
    SpawnFailed(std::io::Error),

    #[error("decompiler collaborator timed out")]
    Timeout,

    #[error("decompiler collaborator exited with status {0}: {1}")]
    NonZeroExit(i32, String),

    #[error("decompiler collaborator produced malformed output: {0}")]
    MalformedOutput(#[from] serde_json::Error),
}
