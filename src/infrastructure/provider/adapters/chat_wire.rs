//! Chat-completions wire format shared by the OpenAI-compatible, Azure
//! and Ollama adapters.

use serde::{Deserialize, Serialize};

use crate::domain::types::{GenerationResult, ResponseMetadata, SamplingParameters, TokenUsage};
use crate::infrastructure::provider::error::AdapterError;

pub(super) const CHAT_DEFAULTS: SamplingParameters = SamplingParameters {
    temperature: Some(0.7),
    max_tokens: Some(150),
    ..SamplingParameters::EMPTY
};

#[derive(Serialize)]
pub(super) struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// System preamble (when non-empty) followed by the user prompt.
pub(super) fn chat_messages<'a>(system: &'a str, prompt: &'a str) -> Vec<ChatMessage<'a>> {
    let mut messages = Vec::with_capacity(2);
    if !system.trim().is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: prompt,
    });
    messages
}

#[derive(Serialize)]
pub(super) struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    stream: bool,
}

impl<'a> ChatRequest<'a> {
    pub(super) fn new(
        model: Option<&'a str>,
        system: &'a str,
        prompt: &'a str,
        params: &SamplingParameters,
    ) -> Self {
        Self {
            model,
            messages: chat_messages(system, prompt),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
            stream: false,
        }
    }
}

#[derive(Deserialize)]
pub(super) struct ChatResponse {
    id: Option<String>,
    model: Option<String>,
    system_fingerprint: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    total_tokens: Option<u64>,
}

impl ChatResponse {
    pub(super) fn into_result(
        self,
        provider: &str,
        requested_model: &str,
    ) -> Result<GenerationResult, AdapterError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::invalid_response(provider, "missing choices"))?;
        let content = choice
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| AdapterError::invalid_response(provider, "missing content"))?;

        let metadata = ResponseMetadata::new(self.model.unwrap_or_else(|| requested_model.to_string()))
            .finish_reason(choice.finish_reason)
            .system_fingerprint(self.system_fingerprint);
        let usage = self
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens).with_total(u.total_tokens));

        Ok(GenerationResult::new(content)
            .with_id(self.id)
            .with_metadata(metadata)
            .with_usage(usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_system_prompt_is_omitted() {
        let messages = serde_json::to_value(chat_messages("  ", "hi")).unwrap();
        assert_eq!(messages, serde_json::json!([{"role": "user", "content": "hi"}]));
    }

    #[test]
    fn response_without_choices_is_invalid() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let err = response.into_result("openai", "gpt-4o").unwrap_err();
        assert!(matches!(err, AdapterError::InvalidResponse { .. }));
    }
}
