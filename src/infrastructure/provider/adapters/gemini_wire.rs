//! `generateContent` wire format shared by the Google AI and Vertex AI adapters.

use serde::{Deserialize, Serialize};

use crate::domain::types::{GenerationResult, ResponseMetadata, SamplingParameters, TokenUsage};
use crate::infrastructure::provider::error::AdapterError;

pub(super) const GEMINI_DEFAULTS: SamplingParameters = SamplingParameters {
    temperature: Some(0.7),
    max_tokens: Some(256),
    top_p: Some(0.95),
    top_k: Some(40),
    ..SamplingParameters::EMPTY
};

#[derive(Serialize)]
pub(super) struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

pub(super) fn user_contents(text: &str) -> Vec<Content<'_>> {
    vec![Content {
        role: Some("user"),
        parts: vec![Part { text }],
    }]
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    pub(super) fn new(system: &'a str, prompt: &'a str, params: &SamplingParameters) -> Self {
        let system = system.trim();
        Self {
            system_instruction: (!system.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part { text: system }],
            }),
            contents: user_contents(prompt),
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
                top_p: params.top_p,
                top_k: params.top_k,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
    response_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    total_token_count: Option<u64>,
}

impl GenerateContentResponse {
    pub(super) fn into_result(
        self,
        provider: &str,
        requested_model: &str,
    ) -> Result<GenerationResult, AdapterError> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::invalid_response(provider, "missing candidates"))?;
        let content: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        if content.is_empty() {
            return Err(AdapterError::invalid_response(provider, "missing text"));
        }

        let metadata =
            ResponseMetadata::new(self.model_version.unwrap_or_else(|| requested_model.to_string()))
                .finish_reason(candidate.finish_reason);
        let usage = self.usage_metadata.map(|u| {
            TokenUsage::new(u.prompt_token_count, u.candidates_token_count)
                .with_total(u.total_token_count)
        });

        Ok(GenerationResult::new(content)
            .with_id(self.response_id)
            .with_metadata(metadata)
            .with_usage(usage))
    }
}
