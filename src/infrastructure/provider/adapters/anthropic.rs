//! Anthropic Messages API adapter

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::base::{AuthScheme, HttpClientBase, token_count};
use crate::domain::types::{
    GenerationResult, ModelId, ProviderKey, ResponseMetadata, SamplingParameters, TokenUsage,
};
use crate::infrastructure::provider::error::AdapterError;
use crate::infrastructure::provider::factory::AdapterContext;
use crate::infrastructure::provider::traits::ProviderAdapter;
use crate::infrastructure::provider::types::{ModelFilter, ModelListing};

const BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

const DEFAULTS: SamplingParameters = SamplingParameters {
    temperature: Some(0.7),
    max_tokens: Some(1024),
    ..SamplingParameters::EMPTY
};

pub fn build(ctx: AdapterContext) -> Box<dyn ProviderAdapter> {
    Box::new(AnthropicAdapter::new(ctx))
}

pub struct AnthropicAdapter {
    base: HttpClientBase,
}

impl AnthropicAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            base: HttpClientBase::new(&ctx, BASE_URL, AuthScheme::Header("x-api-key")),
        }
    }

    async fn fetch_models(&self) -> Result<Vec<String>, AdapterError> {
        let url = self.base.build_url("/v1/models");
        let request = self
            .base
            .get(&url)
            .header("anthropic-version", API_VERSION)
            .query(&[("limit", "1000")]);
        let payload: ModelsPayload = self.base.fetch(request).await?;
        Ok(payload.data.into_iter().map(|m| m.id).collect())
    }

    async fn request_token_count(&self, model: &ModelId, text: &str) -> Result<usize, AdapterError> {
        let url = self.base.build_url("/v1/messages/count_tokens");
        let mut body = json!({
            "model": model.as_str(),
            "messages": [{"role": "user", "content": text}],
        });
        if !self.base.system_prompt.trim().is_empty() {
            body["system"] = json!(self.base.system_prompt);
        }
        let request = self
            .base
            .post(&url, &body)
            .header("anthropic-version", API_VERSION);
        let response: CountTokensResponse = self.base.fetch(request).await?;
        Ok(token_count(response.input_tokens))
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
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
        let url = self.base.build_url("/v1/messages");
        let params = params.overlay(&DEFAULTS);
        let system = self.base.system_prompt.trim();
        let payload = MessagesRequest {
            model: model.as_str(),
            system: (!system.is_empty()).then_some(system),
            messages: vec![UserMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: params.max_tokens.unwrap_or(1024),
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
        };

        info!(
            provider = self.base.id(),
            model = model.as_str(),
            "Sending request to Anthropic"
        );

        let request = self
            .base
            .post(&url, &payload)
            .header("anthropic-version", API_VERSION);
        let response: MessagesResponse = self.base.generate(request).await?;
        debug!("Received response from Anthropic");

        let content: String = response
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();
        if content.is_empty() {
            return Err(AdapterError::invalid_response(self.base.id(), "missing text content"));
        }

        let metadata = ResponseMetadata::new(response.model.unwrap_or_else(|| model.to_string()))
            .finish_reason(response.stop_reason);
        let usage = response
            .usage
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens));

        Ok(GenerationResult::new(content)
            .with_id(response.id)
            .with_metadata(metadata)
            .with_usage(usage))
    }

    async fn count_tokens(&self, text: &str) -> usize {
        let Some(model) = self.base.model.as_ref() else {
            warn!(provider = self.base.id(), "Cannot count tokens without an active model");
            return 0;
        };
        match self.request_token_count(model, text).await {
            Ok(count) => count,
            Err(err) => {
                warn!(provider = self.base.id(), error = %err, "Token counting failed");
                0
            }
        }
    }
}

#[derive(Deserialize)]
struct ModelsPayload {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<UserMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    id: Option<String>,
    model: Option<String>,
    stop_reason: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<MessagesUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct MessagesUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Deserialize)]
struct CountTokensResponse {
    input_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::super::base::test_support::context_at;
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn lists_models_with_version_header() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/models")
            .match_query(Matcher::Any)
            .match_header("x-api-key", "sk-test")
            .match_header("anthropic-version", API_VERSION)
            .with_status(200)
            .with_body(r#"{"data":[{"id":"claude-3-5-haiku-latest","type":"model"}],"has_more":false}"#)
            .create_async()
            .await;

        let listing = AnthropicAdapter::new(context_at("anthropic", &server.url()))
            .list_models(None)
            .await;

        mock.assert_async().await;
        assert_eq!(listing.models(), ["claude-3-5-haiku-latest".to_string()].as_slice());
    }

    #[tokio::test]
    async fn generate_maps_messages_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "claude-3-5-haiku-latest",
                "system": "Answer the following question:",
                "max_tokens": 1024,
                "messages": [{"role": "user", "content": "Say hi"}]
            })))
            .with_status(200)
            .with_body(
                json!({
                    "id": "msg_01",
                    "model": "claude-3-5-haiku-20241022",
                    "stop_reason": "end_turn",
                    "content": [{"type": "text", "text": " Hi! "}],
                    "usage": {"input_tokens": 9, "output_tokens": 3}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let mut adapter = AnthropicAdapter::new(context_at("anthropic", &server.url()));
        adapter
            .set_model(&ModelId::from("claude-3-5-haiku-latest"))
            .await
            .unwrap();
        let result = adapter
            .generate("Say hi", &SamplingParameters::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.content, "Hi!");
        assert_eq!(result.id.as_deref(), Some("msg_01"));
        assert_eq!(
            result.metadata.and_then(|m| m.finish_reason).as_deref(),
            Some("end_turn")
        );
        assert_eq!(result.usage, Some(TokenUsage::new(9, 3)));
    }

    #[tokio::test]
    async fn counts_tokens_through_vendor() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/messages/count_tokens")
            .with_status(200)
            .with_body(r#"{"input_tokens":14}"#)
            .create_async()
            .await;

        let mut adapter = AnthropicAdapter::new(context_at("anthropic", &server.url()));
        assert_eq!(adapter.count_tokens("hello").await, 0);

        adapter
            .set_model(&ModelId::from("claude-3-5-haiku-latest"))
            .await
            .unwrap();
        assert_eq!(adapter.count_tokens("hello").await, 14);
    }

    #[tokio::test]
    async fn count_tokens_failure_is_zero() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/messages/count_tokens")
            .with_status(500)
            .create_async()
            .await;

        let mut adapter = AnthropicAdapter::new(context_at("anthropic", &server.url()));
        adapter
            .set_model(&ModelId::from("claude-3-5-haiku-latest"))
            .await
            .unwrap();
        assert_eq!(adapter.count_tokens("hello").await, 0);
    }
}
