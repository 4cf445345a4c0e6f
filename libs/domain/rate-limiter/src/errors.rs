// [libs/domain/rate-limiter/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RateLimiterError {
    #[error("tier desconocido: {0}")]
    UnknownTier(String),
}
