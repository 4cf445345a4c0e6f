// [libs/domain/models/src/errors.rs]
//! The closed error taxonomy shared by every component.
//!
//! Individual crates (`db`, `blob-store`, `llm-client`, …) define their own
//! `thiserror` error enums for local failure modes; this module defines the
//! taxonomy those local errors are ultimately classified into at the
//! C7/C8 boundary and at the thin HTTP adapter, so the mapping to HTTP
//! status and retry policy lives in exactly one place.

use serde::{Deserialize, Serialize};

/// The nine terminal/transient classes a failure is bucketed into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Validation,
    Authentication,
    RateLimited,
    Processing,
    Timeout,
    FormatUnsupported,
    Storage,
    ProviderUnavailable,
    Internal,
}

impl ErrorClass {
    /// HTTP status code mapping.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorClass::Validation => 400,
            ErrorClass::Authentication => 401,
            ErrorClass::RateLimited => 429,
            ErrorClass::FormatUnsupported => 422,
            ErrorClass::Timeout => 504,
            ErrorClass::Processing
            | ErrorClass::Storage
            | ErrorClass::ProviderUnavailable
            | ErrorClass::Internal => 500,
        }
    }

    /// Whether C8's recovery policy retries this class transparently.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorClass::Processing | ErrorClass::Storage | ErrorClass::Internal
        )
    }
}

/// Severity recorded alongside every classified failure in per-job
/// diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// The supervisor's recognized failure categories,
/// distinct from `ErrorClass`: this is *why* an executor invocation ended,
/// which the supervisor maps onto a retry/restart/salvage/abort policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Timeout,
    FormatError,
    ConnectionError,
    MemoryError,
    ProcessError,
    Generic,
}

impl FailureCategory {
    pub fn default_severity(self) -> Severity {
        match self {
            FailureCategory::Timeout => Severity::Medium,
            FailureCategory::FormatError => Severity::Low,
            FailureCategory::ConnectionError => Severity::Medium,
            FailureCategory::MemoryError => Severity::Critical,
            FailureCategory::ProcessError => Severity::High,
            FailureCategory::Generic => Severity::Medium,
        }
    }
}

/// A single classified failure as recorded in per-job diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedFailure {
    pub category: FailureCategory,
    pub severity: Severity,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_and_internal_are_transient_but_validation_is_not() {
        assert!(ErrorClass::Storage.is_transient());
        assert!(ErrorClass::Internal.is_transient());
        assert!(!ErrorClass::Validation.is_transient());
    }
}
