// [libs/infra/llm-client/src/lib.rs]
/*!
 * APARATO: LLM PROVIDER COLLABORATOR CLIENT
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: EMISION DE PROMPTS Y RECEPCION DE COMPLETIONS DE
 * PROVEEDORES LLM SALIENTES (STAGE B)
 *
 * Subclass-based polymorphism in the original is re-expressed as a single
 * capability trait (`LlmProvider`) plus a tagged-kind enum for
 * provider-specific configuration validation. No vendor SDK
 * is linked; every kind speaks plain HTTPS JSON through `reqwest`, which
 * is all the core needs from an outbound collaborator it does not own.
 */

pub mod errors;

use std::time::Duration;

use async_trait::async_trait;
use bin2nlp_domain_models::config::ProviderKind;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

pub use errors::LlmClientError;

/// Configuration bound to a single outbound call, already resolved from a
/// `ProviderCredential` (decrypted key) and the job's `JobConfig` overrides.
#[derive(Debug, Clone)]
pub struct ProviderBinding {
    pub kind: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub endpoint: Option<String>,
}

impl ProviderBinding {
    /// Validates the closed configuration keys required by `kind`: every
    /// kind needs a non-empty API-key-shaped value (self-hosted providers
    /// like Ollama typically carry a placeholder rather than a real
    /// secret, but an empty string is still rejected), and self-hosted
    /// kinds additionally need an endpoint URL.
    pub fn validate(&self) -> Result<(), LlmClientError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmClientError::ConfigurationInvalid(
                "provider binding requires a non-empty API key (a placeholder for self-hosted kinds)".into(),
            ));
        }
        if self.kind.requires_endpoint() && self.endpoint.as_deref().unwrap_or("").is_empty() {
            return Err(LlmClientError::ConfigurationInvalid(format!(
                "provider kind {:?} requires an explicit endpoint URL",
                self.kind
            )));
        }
        Ok(())
    }

    fn resolved_endpoint(&self) -> String {
        match (&self.endpoint, self.kind) {
            (Some(endpoint), _) if !endpoint.is_empty() => endpoint.clone(),
            (_, ProviderKind::Openai) => "https://api.openai.com/v1/chat/completions".to_string(),
            (_, ProviderKind::Anthropic) => "https://api.anthropic.com/v1/messages".to_string(),
            (_, ProviderKind::Gemini) => {
                format!(
                    "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                    self.model
                )
            }
            (_, ProviderKind::Ollama) => "http://localhost:11434/api/generate".to_string(),
        }
    }
}

/// Capability set every provider kind satisfies: a text
/// completion call and a pure token-cost estimator consulted by C4 before
/// the call is made.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        deadline: Duration,
    ) -> Result<Completion, LlmClientError>;

    fn estimate_tokens(&self, prompt: &str) -> u32;
}

/// A completion plus the actual token usage the provider reported (or an
/// estimate when the wire format omits usage), recorded post-hoc against
/// C4 per 7.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Generic HTTPS JSON adapter shared by all four recognized kinds. Each
/// kind only differs in its request/response envelope, not its transport.
pub struct HttpLlmProvider {
    client: Client,
    binding: ProviderBinding,
}

impl HttpLlmProvider {
    pub fn new(client: Client, binding: ProviderBinding) -> Result<Self, LlmClientError> {
        binding.validate()?;
        Ok(Self { client, binding })
    }

    fn build_request(&self, prompt: &str, max_tokens: u32) -> reqwest::RequestBuilder {
        let url = self.binding.resolved_endpoint();
        let request = self.client.post(url).timeout(Duration::from_secs(120));

        match self.binding.kind {
            ProviderKind::Openai => request
                .bearer_auth(&self.binding.api_key)
                .json(&OpenAiRequest {
                    model: self.binding.model.clone(),
                    messages: vec![OpenAiMessage {
                        role: "user".to_string(),
                        content: prompt.to_string(),
                    }],
                    max_tokens,
                }),
            ProviderKind::Anthropic => request
                .header("x-api-key", &self.binding.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&AnthropicRequest {
                    model: self.binding.model.clone(),
                    max_tokens,
                    messages: vec![AnthropicMessage {
                        role: "user".to_string(),
                        content: prompt.to_string(),
                    }],
                }),
            ProviderKind::Gemini => request
                .query(&[("key", self.binding.api_key.as_str())])
                .json(&GeminiRequest {
                    contents: vec![GeminiContent {
                        parts: vec![GeminiPart { text: prompt.to_string() }],
                    }],
                }),
            ProviderKind::Ollama => request.json(&OllamaRequest {
                model: self.binding.model.clone(),
                prompt: prompt.to_string(),
                stream: false,
            }),
        }
    }
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    /// Stage B's outbound call boundary. A transport error
    /// or non-2xx response surfaces as `ProviderUnavailable` at the C7/C8
    /// mapping (per-artifact tolerated, never crashes the worker).
    #[instrument(skip(self, prompt), fields(provider = ?self.binding.kind))]
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        deadline: Duration,
    ) -> Result<Completion, LlmClientError> {
        let request = self.build_request(prompt, max_tokens);

        let response = match tokio::time::timeout(deadline, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => return Err(LlmClientError::NetworkFault(error)),
            Err(_elapsed) => {
                warn!("⏱️  [llm_client]: provider call exceeded deadline of {:?}", deadline);
                return Err(LlmClientError::Timeout);
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmClientError::ProviderRejection(format!("{status}: {body}")));
        }

        let body_bytes = response.bytes().await.map_err(LlmClientError::NetworkFault)?;
        parse_completion(self.binding.kind, &body_bytes)
    }

    fn estimate_tokens(&self, prompt: &str) -> u32 {
        estimate_tokens_for_prompt(prompt)
    }
}

/// A whitespace-and-length heuristic, not a vendor tokenizer, used only to
/// pre-charge C4 before the call is made.
pub fn estimate_tokens_for_prompt(prompt: &str) -> u32 {
    let char_estimate = (prompt.len() as f64 / 4.0).ceil() as u32;
    let word_estimate = prompt.split_whitespace().count() as u32;
    char_estimate.max(word_estimate).max(1)
}

fn parse_completion(kind: ProviderKind, body: &[u8]) -> Result<Completion, LlmClientError> {
    match kind {
        ProviderKind::Openai => {
            let parsed: OpenAiResponse = serde_json::from_slice(body)?;
            let text = parsed
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .unwrap_or_default();
            Ok(Completion {
                text,
                input_tokens: parsed.usage.as_ref().map(|u| u.prompt_tokens).unwrap_or(0),
                output_tokens: parsed.usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0),
            })
        }
        ProviderKind::Anthropic => {
            let parsed: AnthropicResponse = serde_json::from_slice(body)?;
            let text = parsed.content.into_iter().next().map(|c| c.text).unwrap_or_default();
            Ok(Completion {
                text,
                input_tokens: parsed.usage.as_ref().map(|u| u.input_tokens).unwrap_or(0),
                output_tokens: parsed.usage.as_ref().map(|u| u.output_tokens).unwrap_or(0),
            })
        }
        ProviderKind::Gemini => {
            let parsed: GeminiResponse = serde_json::from_slice(body)?;
            let text = parsed
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content.parts.into_iter().next())
                .map(|p| p.text)
                .unwrap_or_default();
            Ok(Completion {
                text,
                input_tokens: 0,
                output_tokens: 0,
            })
        }
        ProviderKind::Ollama => {
            let parsed: OllamaResponse = serde_json::from_slice(body)?;
            Ok(Completion {
                text: parsed.response,
                input_tokens: parsed.prompt_eval_count.unwrap_or(0),
                output_tokens: parsed.eval_count.unwrap_or(0),
            })
        }
    }
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    text: String,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_binding(kind: ProviderKind) -> ProviderBinding {
        ProviderBinding {
            kind,
            api_key: "sk-test".to_string(),
            model: "test-model".to_string(),
            endpoint: None,
        }
    }

    #[test]
    fn hosted_kind_without_api_key_is_rejected() {
        let mut binding = sample_binding(ProviderKind::Openai);
        binding.api_key = String::new();
        assert!(matches!(binding.validate(), Err(LlmClientError::ConfigurationInvalid(_))));
    }

    #[test]
    fn ollama_requires_an_endpoint() {
        let binding = sample_binding(ProviderKind::Ollama);
        assert!(matches!(binding.validate(), Err(LlmClientError::ConfigurationInvalid(_))));
    }

    #[test]
    fn ollama_with_endpoint_validates() {
        let mut binding = sample_binding(ProviderKind::Ollama);
        binding.endpoint = Some("http://localhost:11434".to_string());
        assert!(binding.validate().is_ok());
    }

    #[test]
    fn token_estimate_is_never_zero_for_nonempty_prompt() {
        assert!(estimate_tokens_for_prompt("hello world") > 0);
        assert!(estimate_tokens_for_prompt("x") >= 1);
    }

    #[test]
    fn openai_response_parses_choice_and_usage() {
        let body = br#"{"choices":[{"message":{"content":"hello"}}],"usage":{"prompt_tokens":3,"completion_tokens":5}}"#;
        let completion = parse_completion(ProviderKind::Openai, body).expect("parse");
        assert_eq!(completion.text, "hello");
        assert_eq!(completion.input_tokens, 3);
        assert_eq!(completion.output_tokens, 5);
    }

    #[test]
    fn anthropic_response_parses_content_block() {
        let body = br#"{"content":[{"text":"hi there"}],"usage":{"input_tokens":2,"output_tokens":4}}"#;
        let completion = parse_completion(ProviderKind::Anthropic, body).expect("parse");
        assert_eq!(completion.text, "hi there");
        assert_eq!(completion.output_tokens, 4);
    }
}
