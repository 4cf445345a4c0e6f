// [libs/domain/models/src/config.rs]
//! Closed configuration record accepted on submission.
//!
//! The original service accepted an open, dict-shaped configuration bag.
//! Per the redesign, recognized keys are enumerated here as a closed
//! record; anything else a client sends is rejected at the HTTP boundary
//! before it ever reaches this type.

use serde::{Deserialize, Serialize};

/// Depth dial for the decompilation collaborator (Stage A).
///
/// `Quick` accepts the legacy alias `"basic"` used by early clients of the
/// original service, which only ever exposed three depth levels at the API
/// boundary even though its cache TTL table already priced four.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    #[serde(alias = "basic")]
    Quick,
    Standard,
    Comprehensive,
    Deep,
}

impl AnalysisDepth {
    /// TTL multiplier applied to the cache's base TTL (see `ResultCache`).
    pub fn ttl_multiplier(self) -> f64 {
        match self {
            AnalysisDepth::Quick => 0.5,
            AnalysisDepth::Standard => 1.0,
            AnalysisDepth::Comprehensive => 2.0,
            AnalysisDepth::Deep => 3.0,
        }
    }

    /// Tag value stored alongside a cache entry (`depth:<value>`).
    pub fn tag_value(self) -> &'static str {
        match self {
            AnalysisDepth::Quick => "quick",
            AnalysisDepth::Standard => "standard",
            AnalysisDepth::Comprehensive => "comprehensive",
            AnalysisDepth::Deep => "deep",
        }
    }

    /// Maps onto the external decompiler collaborator's own depth dial.
    pub fn collaborator_dial(self) -> &'static str {
        match self {
            AnalysisDepth::Quick => "shallow",
            AnalysisDepth::Standard => "default",
            AnalysisDepth::Comprehensive => "full",
            AnalysisDepth::Deep => "full",
        }
    }
}

/// Level of detail requested for Stage B (translation).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TranslationDetail {
    /// Functions only.
    Basic,
    /// Functions + imports.
    Standard,
    /// Functions + imports + strings + overall summary.
    Detailed,
}

impl TranslationDetail {
    pub fn includes_imports(self) -> bool {
        !matches!(self, TranslationDetail::Basic)
    }

    pub fn includes_strings_and_summary(self) -> bool {
        matches!(self, TranslationDetail::Detailed)
    }
}

/// Recognized LLM provider kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Openai,
    Anthropic,
    Gemini,
    Ollama,
}

impl ProviderKind {
    /// Self-hosted kinds require an explicit endpoint URL.
    pub fn requires_endpoint(self) -> bool {
        matches!(self, ProviderKind::Ollama)
    }
}

/// The closed configuration record carried on a job.
///
/// Only the keys enumerated here influence job execution or the cache-key
/// fingerprint. Anything a caller sends outside this shape is logged and
/// discarded by the HTTP adapter's config normalizer before a `Job` is
/// ever constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobConfig {
    pub analysis_depth: AnalysisDepth,
    pub translation_detail: TranslationDetail,
    pub provider_id: Option<String>,
    pub provider_kind: Option<ProviderKind>,
    pub provider_model: Option<String>,
    pub provider_endpoint: Option<String>,
    /// Present only transiently on submission; never persisted in plaintext
    /// and never echoed back in a status response. Binding this to a
    /// durable `ProviderCredential` row is the executor's job.
    #[serde(skip_serializing)]
    pub provider_api_key: Option<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            analysis_depth: AnalysisDepth::Standard,
            translation_detail: TranslationDetail::Basic,
            provider_id: None,
            provider_kind: None,
            provider_model: None,
            provider_endpoint: None,
            provider_api_key: None,
        }
    }
}

impl JobConfig {
    /// Recognized keys participating in the cache-key fingerprint, in a
    /// fixed order so the fingerprint is deterministic regardless of how
    /// the struct is constructed. Unrecognized keys never reach this type
    /// in the first place, so there is nothing further to filter here.
    pub fn fingerprint_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("analysis_depth", self.analysis_depth.tag_value().to_string()),
            (
                "translation_detail",
                match self.translation_detail {
                    TranslationDetail::Basic => "basic",
                    TranslationDetail::Standard => "standard",
                    TranslationDetail::Detailed => "detailed",
                }
                .to_string(),
            ),
        ];
        if let Some(provider_id) = &self.provider_id {
            pairs.push(("provider_id", provider_id.clone()));
        }
        if let Some(model) = &self.provider_model {
            pairs.push(("provider_model", model.clone()));
        }
        pairs
    }

    /// Whether Stage B has anything to bind to: either a stored credential
    /// reference or an inline provider kind. A job submitted with neither
    /// (§6's `submit(... provider_id?)` with no override) skips translation
    /// entirely and completes as decompilation-only.
    pub fn has_provider_configured(&self) -> bool {
        self.provider_id.is_some() || self.provider_kind.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_provider_configured() {
        assert!(!JobConfig::default().has_provider_configured());
    }

    #[test]
    fn inline_provider_kind_counts_as_configured() {
        let config = JobConfig {
            provider_kind: Some(ProviderKind::Openai),
            ..JobConfig::default()
        };
        assert!(config.has_provider_configured());
    }

    #[test]
    fn stored_provider_id_counts_as_configured() {
        let config = JobConfig {
            provider_id: Some("cred-1".to_string()),
            ..JobConfig::default()
        };
        assert!(config.has_provider_configured());
    }

    #[test]
    fn fingerprint_pairs_are_stable_regardless_of_field_order() {
        let config = JobConfig {
            provider_id: Some("cred-1".to_string()),
            provider_model: Some("gpt-x".to_string()),
            ..JobConfig::default()
        };
        let pairs = config.fingerprint_pairs();
        assert!(pairs.contains(&("provider_id", "cred-1".to_string())));
        assert!(pairs.contains(&("provider_model", "gpt-x".to_string())));
    }
}
