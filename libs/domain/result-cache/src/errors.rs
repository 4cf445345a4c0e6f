// [libs/domain/result-cache/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResultCacheError {
    #[error("cache store unavailable: {0}")]
    StoreUnavailable(String),
}
