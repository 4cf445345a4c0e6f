// [libs/domain/models/src/result.rs]
//! Merged result document — the schema cached by C5 and returned from
//! `status(job_id)` once a job completes.

use serde::{Deserialize, Serialize};

use crate::cache::CURRENT_SCHEMA_VERSION;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionTranslation {
    pub name: String,
    pub address: String,
    pub natural_language: String,
    pub purpose: Option<String>,
    pub parameters: Vec<String>,
    pub return_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportTranslation {
    pub library: String,
    pub function: String,
    pub purpose: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringTranslation {
    pub content: String,
    pub address: String,
    pub natural_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmTranslations {
    pub functions: Vec<FunctionTranslation>,
    #[serde(default)]
    pub imports: Vec<ImportTranslation>,
    #[serde(default)]
    pub strings: Vec<StringTranslation>,
    #[serde(default)]
    pub overall_summary: Option<String>,
}

/// A per-artifact failure recorded when a single function/import/string
/// translation fails without aborting the whole job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactDiagnostic {
    pub artifact_kind: String,
    pub artifact_name: String,
    pub error_class: String,
    pub message: String,
}

/// The merged document written to the blob store and indexed by C5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultDocument {
    pub schema_version: u32,
    pub success: bool,
    pub function_count: usize,
    pub import_count: usize,
    pub string_count: usize,
    pub duration_seconds: f64,
    pub decompilation_id: uuid::Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_translations: Option<LlmTranslations>,
    /// Set when the job completed from partial artifacts under
    /// cancellation/timeout salvage.
    #[serde(default)]
    pub salvaged: bool,
    #[serde(default)]
    pub diagnostics: Vec<ArtifactDiagnostic>,
}

impl ResultDocument {
    pub fn new_success(
        decompilation_id: uuid::Uuid,
        function_count: usize,
        import_count: usize,
        string_count: usize,
        duration_seconds: f64,
        llm_translations: Option<LlmTranslations>,
    ) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            success: true,
            function_count,
            import_count,
            string_count,
            duration_seconds,
            decompilation_id,
            llm_translations,
            salvaged: false,
            diagnostics: Vec::new(),
        }
    }

    /// An artifact-level success threshold is required for a salvaged job
    /// to be reported as `completed` rather than `failed` — at least one
    /// artifact must have translated successfully.
    pub fn has_any_successful_artifact(&self) -> bool {
        self.llm_translations
            .as_ref()
            .map(|t| !t.functions.is_empty() || !t.imports.is_empty() || !t.strings.is_empty())
            .unwrap_or(false)
    }
}
