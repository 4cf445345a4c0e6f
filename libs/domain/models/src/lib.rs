
pub mod blob;
pub mod cache;
pub mod config;
pub mod credential;
pub mod decompilation;
pub mod errors;
pub mod job;
pub mod rate_limit;
pub mod result;
pub mod session;
pub mod worker;

pub use blob::BlobMetadata;
pub use cache::{CacheEntry, CacheStats, CURRENT_SCHEMA_VERSION};
pub use config::{AnalysisDepth, JobConfig, ProviderKind, TranslationDetail};
pub use credential::ProviderCredential;
pub use decompilation::{
    DecompilationDocument, DecompiledFunction, ExtractedString, FileMetadata, ImportedSymbol,
    StringEncoding,
};
pub use errors::{ClassifiedFailure, ErrorClass, FailureCategory, Severity};
pub use job::{retry_backoff_seconds, Job, JobPriority, JobStatus, MAX_RETRIES};
pub use rate_limit::{AdmitDecision, RateLimitCounter, RateWindow, TierLimits, WindowStatus};
pub use result::{
    ArtifactDiagnostic, FunctionTranslation, ImportTranslation, LlmTranslations, ResultDocument,
    StringTranslation,
};
pub use session::SessionRecord;
pub use worker::{QueueStats, WorkerHeartbeat, WorkerLease};
