// [libs/infra/llm-client/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmClientError {
    #[error("network fault talking to provider: {0}")]
    NetworkFault(#[from] reqwest::Error),

    #[error("provider rejected the request: {0}")]
    ProviderRejection(String),

    #[error("provider response could not be decoded: {0}")]
    DecodingFault(#[from] serde_json::Error),

    #[error("provider configuration invalid: {0}")]
    ConfigurationInvalid(String),

    #[error("provider call exceeded its deadline")]
    Timeout,
}
