// [libs/infra/db/src/repositories/mod.rs]
//! Repository registry: one authority per entity family, each constructed
//! from a fresh `libsql::Connection`.

pub mod cache;
pub mod credential;
pub mod job;
pub mod rate_limit;
pub mod session;
pub mod worker;

pub use cache::CacheRepository;
pub use credential::CredentialRepository;
pub use job::JobRepository;
pub use rate_limit::RateLimitRepository;
pub use session::SessionRepository;
pub use worker::WorkerRepository;
