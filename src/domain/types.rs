//! Core value types shared by the registry, the adapters and the HTTP layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Canonical provider identifier (e.g. "openai", "cohere").
///
/// Always stored trimmed and lowercased, so two keys that differ only in
/// case or surrounding whitespace compare equal.
///
/// ```
/// use llm_switchboard::types::ProviderKey;
///
/// assert_eq!(ProviderKey::parse("  OpenAI "), ProviderKey::parse("openai"));
/// assert_eq!(ProviderKey::parse("  OpenAI ").as_str(), "openai");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderKey(String);

impl ProviderKey {
    /// Normalize a raw key: trim, then lowercase.
    pub fn parse(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderKey {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Vendor-specific model name. Opaque; no structure is assumed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ModelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Generation-time knobs. Every field is optional; adapters fill the gaps
/// with their own defaults via [`SamplingParameters::overlay`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SamplingParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub do_sample: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_return_sequences: Option<u32>,
}

impl SamplingParameters {
    /// No knob set. Usable in `const` adapter default tables.
    pub const EMPTY: Self = Self {
        temperature: None,
        max_tokens: None,
        top_p: None,
        top_k: None,
        frequency_penalty: None,
        presence_penalty: None,
        repetition_penalty: None,
        do_sample: None,
        num_return_sequences: None,
    };

    /// Caller-supplied values win; anything left unset falls back to `defaults`.
    pub fn overlay(&self, defaults: &SamplingParameters) -> SamplingParameters {
        SamplingParameters {
            temperature: self.temperature.or(defaults.temperature),
            max_tokens: self.max_tokens.or(defaults.max_tokens),
            top_p: self.top_p.or(defaults.top_p),
            top_k: self.top_k.or(defaults.top_k),
            frequency_penalty: self.frequency_penalty.or(defaults.frequency_penalty),
            presence_penalty: self.presence_penalty.or(defaults.presence_penalty),
            repetition_penalty: self.repetition_penalty.or(defaults.repetition_penalty),
            do_sample: self.do_sample.or(defaults.do_sample),
            num_return_sequences: self.num_return_sequences.or(defaults.num_return_sequences),
        }
    }
}

/// A text-generation request as it enters the dispatcher.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub provider: String,
    pub model: String,
    pub parameters: SamplingParameters,
}

impl GenerationRequest {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            provider: provider.into(),
            model: model.into(),
            parameters: SamplingParameters::default(),
        }
    }

    pub fn with_parameters(mut self, parameters: SamplingParameters) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Token accounting reported by the vendor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Use the vendor's own total when it reports one.
    pub fn with_total(mut self, total: Option<u64>) -> Self {
        if let Some(total) = total {
            self.total_tokens = total;
        }
        self
    }
}

/// Vendor-specific fields carried alongside the generated text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
}

impl ResponseMetadata {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    pub fn finish_reason(mut self, reason: Option<String>) -> Self {
        self.finish_reason = reason;
        self
    }

    pub fn system_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.system_fingerprint = fingerprint;
        self
    }
}

/// Normalized generation output, whatever shape the vendor returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub id: Option<String>,
    pub content: String,
    pub metadata: Option<ResponseMetadata>,
    pub usage: Option<TokenUsage>,
}

impl GenerationResult {
    /// Builds a result from raw vendor text; leading and trailing whitespace is dropped.
    pub fn new(content: impl AsRef<str>) -> Self {
        Self {
            id: None,
            content: content.as_ref().trim().to_string(),
            metadata: None,
            usage: None,
        }
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    pub fn with_metadata(mut self, metadata: ResponseMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.usage = usage;
        self
    }
}
