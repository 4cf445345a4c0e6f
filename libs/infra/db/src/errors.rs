// [libs/infra/db/src/errors.rs]
/*!
 * APARATO: DATABASE ERROR CATALOG
 * CLASIFICACION: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACION SEMANTICA DE FALLOS DE PERSISTENCIA
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("connection failure: {0}")]
    ConnectionError(String),

    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("query rejected: {0}")]
    QueryError(#[from] libsql::Error),

    #[error("data mapping violation: {0}")]
    MappingError(String),

    #[error("transaction collapse")]
    TransactionError,

    #[error("job not found")]
    JobNotFound,

    #[error("lease ownership conflict: job is held by a different worker")]
    OwnershipConflict,

    #[error("job is not in a state that accepts this operation")]
    InvalidState,

    #[error("cache entry not found")]
    CacheEntryNotFound,

    #[error("credential not found")]
    CredentialNotFound,

    #[error("session not found")]
    SessionNotFound,
}
