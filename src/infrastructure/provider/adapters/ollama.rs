//! Ollama adapter for local models

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::base::{AuthScheme, HttpClientBase};
use super::chat_wire::{ChatMessage, chat_messages};
use crate::domain::types::{
    GenerationResult, ModelId, ProviderKey, ResponseMetadata, SamplingParameters, TokenUsage,
};
use crate::infrastructure::provider::error::AdapterError;
use crate::infrastructure::provider::factory::AdapterContext;
use crate::infrastructure::provider::traits::ProviderAdapter;
use crate::infrastructure::provider::types::{ModelFilter, ModelListing};

const BASE_URL: &str = "http://localhost:11434";

const DEFAULTS: SamplingParameters = SamplingParameters {
    temperature: Some(0.7),
    ..SamplingParameters::EMPTY
};

pub fn build(ctx: AdapterContext) -> Box<dyn ProviderAdapter> {
    Box::new(OllamaAdapter::new(ctx))
}

/// Ollama ignores the caller's key; requests go out unauthenticated.
pub struct OllamaAdapter {
    base: HttpClientBase,
}

impl OllamaAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            base: HttpClientBase::new(&ctx, BASE_URL, AuthScheme::None),
        }
    }

    async fn fetch_models(&self) -> Result<Vec<String>, AdapterError> {
        let url = self.base.build_url("/api/tags");
        let payload: TagsPayload = self.base.fetch(self.base.get(&url)).await?;
        Ok(payload.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn provider(&self) -> &ProviderKey {
        &self.base.provider
    }

    fn active_model(&self) -> Option<&ModelId> {
        self.base.model.as_ref()
    }

    async fn list_models(&self, filter: Option<&ModelFilter>) -> ModelListing {
        ModelListing::settle(self.base.id(), self.fetch_models().await, &[]).narrow(filter)
    }

    async fn set_model(&mut self, model: &ModelId) -> Result<(), AdapterError> {
        self.base.model = Some(model.clone());
        Ok(())
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParameters,
    ) -> Result<GenerationResult, AdapterError> {
        let model = self.base.require_model()?;
        let url = self.base.build_url("/api/chat");
        let params = params.overlay(&DEFAULTS);
        let payload = OllamaRequest {
            model: model.as_str(),
            messages: chat_messages(&self.base.system_prompt, prompt),
            stream: false,
            options: OllamaOptions {
                temperature: params.temperature,
                num_predict: params.max_tokens,
                top_p: params.top_p,
                top_k: params.top_k,
                repeat_penalty: params.repetition_penalty,
                frequency_penalty: params.frequency_penalty,
                presence_penalty: params.presence_penalty,
            },
        };

        info!(
            provider = self.base.id(),
            model = model.as_str(),
            "Sending request to Ollama"
        );

        let response: OllamaResponse = self.base.generate(self.base.post(&url, &payload)).await?;
        debug!("Received response from Ollama");

        let content = response
            .message
            .ok_or_else(|| AdapterError::invalid_response(self.base.id(), "missing message"))?
            .content;
        let usage = match (response.prompt_eval_count, response.eval_count) {
            (None, None) => None,
            (prompt, completion) => Some(TokenUsage::new(
                prompt.unwrap_or_default(),
                completion.unwrap_or_default(),
            )),
        };
        let metadata = ResponseMetadata::new(response.model.unwrap_or_else(|| model.to_string()))
            .finish_reason(response.done_reason);

        Ok(GenerationResult::new(content)
            .with_metadata(metadata)
            .with_usage(usage))
    }
}

#[derive(Deserialize)]
struct TagsPayload {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    model: Option<String>,
    message: Option<OllamaMessage>,
    done_reason: Option<String>,
    prompt_eval_count: Option<u64>,
    eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::super::base::test_support::context_at;
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn lists_local_tags_without_auth() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/tags")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"models":[{"name":"llama3:latest"},{"name":"qwen2.5:7b"}]}"#)
            .create_async()
            .await;

        let listing = OllamaAdapter::new(context_at("ollama", &server.url()))
            .list_models(None)
            .await;

        mock.assert_async().await;
        assert_eq!(listing.models().len(), 2);
    }

    #[tokio::test]
    async fn unreachable_daemon_degrades_listing() {
        let adapter = OllamaAdapter::new(context_at("ollama", "http://127.0.0.1:1"));
        let listing = adapter.list_models(None).await;
        assert_eq!(listing.status(), "degraded");
        assert!(listing.models().is_empty());
    }

    #[tokio::test]
    async fn generate_posts_non_streaming_chat() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::PartialJson(json!({
                "model": "llama3:latest",
                "stream": false,
                "messages": [
                    {"role": "system", "content": "Answer the following question:"},
                    {"role": "user", "content": "Hi"}
                ]
            })))
            .with_status(200)
            .with_body(
                json!({
                    "model": "llama3:latest",
                    "message": {"role": "assistant", "content": "Hello!\n"},
                    "done": true,
                    "done_reason": "stop",
                    "prompt_eval_count": 20,
                    "eval_count": 3
                })
                .to_string(),
            )
            .create_async()
            .await;

        let mut adapter = OllamaAdapter::new(context_at("ollama", &server.url()));
        adapter.set_model(&ModelId::from("llama3:latest")).await.unwrap();
        let result = adapter
            .generate("Hi", &SamplingParameters::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.content, "Hello!");
        assert_eq!(result.usage, Some(TokenUsage::new(20, 3)));
    }
}
