// [apps/orchestrator/src/errors.rs]
/*!
 * APARATO: ERRORES DEL ADAPTADOR HTTP
 * CLASIFICACION: APPLICATION LAYER (ESTRATO L1-APP)
 * RESPONSABILIDAD: TRADUCCION DE FALLOS INTERNOS A RESPUESTAS JSON
 *
 * Todo fallo que llega hasta aqui se reduce a un `ErrorClass` cerrado
 * (`bin2nlp_domain_models::ErrorClass`) antes de escoger un codigo HTTP;
 * ese mapeo vive en un solo lugar (`ErrorClass::http_status`) y este
 * adaptador no lo duplica.
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bin2nlp_domain_models::ErrorClass;
use serde_json::json;

pub struct ApiError {
    pub class: ErrorClass,
    pub message: String,
}

impl ApiError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Validation, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.class.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(json!({
                "error": format!("{:?}", self.class).to_lowercase(),
                "message": self.message,
            })),
        )
            .into_response()
    }
}

impl From<bin2nlp_infra_db::DbError> for ApiError {
    fn from(error: bin2nlp_infra_db::DbError) -> Self {
        use bin2nlp_infra_db::DbError;
        match error {
            DbError::JobNotFound | DbError::CredentialNotFound | DbError::CacheEntryNotFound | DbError::SessionNotFound => {
                ApiError::new(ErrorClass::Validation, "resource not found")
            }
            DbError::OwnershipConflict | DbError::InvalidState => {
                ApiError::new(ErrorClass::Validation, error.to_string())
            }
            other => ApiError::new(ErrorClass::Storage, other.to_string()),
        }
    }
}

impl From<bin2nlp_domain_job_queue::JobQueueError> for ApiError {
    fn from(error: bin2nlp_domain_job_queue::JobQueueError) -> Self {
        use bin2nlp_domain_job_queue::JobQueueError;
        match error {
            JobQueueError::NotFound => ApiError::new(ErrorClass::Validation, "job not found"),
            JobQueueError::OwnershipConflict => ApiError::new(ErrorClass::Validation, error.to_string()),
            JobQueueError::Storage(message) => ApiError::new(ErrorClass::Storage, message),
        }
    }
}

impl From<bin2nlp_domain_rate_limiter::RateLimiterError> for ApiError {
    fn from(error: bin2nlp_domain_rate_limiter::RateLimiterError) -> Self {
        ApiError::new(ErrorClass::Validation, error.to_string())
    }
}

impl From<bin2nlp_domain_result_cache::ResultCacheError> for ApiError {
    fn from(error: bin2nlp_domain_result_cache::ResultCacheError) -> Self {
        ApiError::new(ErrorClass::Storage, error.to_string())
    }
}

impl From<bin2nlp_infra_blob_store::BlobError> for ApiError {
    fn from(error: bin2nlp_infra_blob_store::BlobError) -> Self {
        use bin2nlp_infra_blob_store::BlobError;
        match error {
            BlobError::KeyTooLarge(..) => ApiError::new(ErrorClass::Validation, error.to_string()),
            BlobError::NotFound => ApiError::new(ErrorClass::Validation, "blob not found"),
            other => ApiError::new(ErrorClass::Storage, other.to_string()),
        }
    }
}

impl From<bin2nlp_core_credential_vault::VaultError> for ApiError {
    fn from(error: bin2nlp_core_credential_vault::VaultError) -> Self {
        ApiError::new(ErrorClass::Internal, error.to_string())
    }
}
