// [libs/infra/db/src/lib.rs]
/*!
 * APARATO: METADATA STORE (C1)
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA RELACIONAL TRANSACCIONAL DEL NUCLEO
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::DbClient;
pub use errors::DbError;
pub use repositories::{
    CacheRepository, CredentialRepository, JobRepository, RateLimitRepository, SessionRepository,
    WorkerRepository,
};
