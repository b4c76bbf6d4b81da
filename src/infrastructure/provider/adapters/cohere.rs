//! Cohere adapter (v2 chat, v1 models and tokenize)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::base::{AuthScheme, HttpClientBase};
use super::chat_wire::{CHAT_DEFAULTS, ChatMessage, chat_messages};
use crate::domain::types::{
    GenerationResult, ModelId, ProviderKey, ResponseMetadata, SamplingParameters, TokenUsage,
};
use crate::infrastructure::provider::error::AdapterError;
use crate::infrastructure::provider::factory::AdapterContext;
use crate::infrastructure::provider::traits::ProviderAdapter;
use crate::infrastructure::provider::types::{ModelFilter, ModelListing};

const BASE_URL: &str = "https://api.cohere.com";

pub fn build(ctx: AdapterContext) -> Box<dyn ProviderAdapter> {
    Box::new(CohereAdapter::new(ctx))
}

pub struct CohereAdapter {
    base: HttpClientBase,
}

impl CohereAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            base: HttpClientBase::new(&ctx, BASE_URL, AuthScheme::Bearer),
        }
    }

    async fn fetch_models(&self) -> Result<Vec<String>, AdapterError> {
        let url = self.base.build_url("/v1/models");
        let request = self.base.get(&url).query(&[("endpoint", "chat")]);
        let payload: ModelsPayload = self.base.fetch(request).await?;
        Ok(payload.models.into_iter().map(|m| m.name).collect())
    }

    async fn tokenize(&self, model: &ModelId, text: &str) -> Result<usize, AdapterError> {
        let url = self.base.build_url("/v1/tokenize");
        let body = TokenizeRequest {
            text,
            model: model.as_str(),
        };
        let response: TokenizeResponse = self.base.fetch(self.base.post(&url, &body)).await?;
        Ok(response.tokens.len())
    }
}

#[async_trait]
impl ProviderAdapter for CohereAdapter {
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
        let url = self.base.build_url("/v2/chat");
        let params = params.overlay(&CHAT_DEFAULTS);
        let payload = CohereChatRequest {
            model: model.as_str(),
            messages: chat_messages(&self.base.system_prompt, prompt),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            p: params.top_p,
            k: params.top_k,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
        };

        info!(
            provider = self.base.id(),
            model = model.as_str(),
            "Sending request to Cohere"
        );

        let response: CohereChatResponse = self.base.generate(self.base.post(&url, &payload)).await?;
        debug!("Received response from Cohere");

        let content: String = response
            .message
            .map(|m| m.content)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        if content.is_empty() {
            return Err(AdapterError::invalid_response(self.base.id(), "missing text content"));
        }

        let usage = response
            .usage
            .and_then(|u| u.tokens)
            .map(|t| TokenUsage::new(t.input_tokens as u64, t.output_tokens as u64));

        Ok(GenerationResult::new(content)
            .with_id(response.id)
            .with_metadata(ResponseMetadata::new(model.as_str()).finish_reason(response.finish_reason))
            .with_usage(usage))
    }

    async fn count_tokens(&self, text: &str) -> usize {
        let Some(model) = self.base.model.as_ref() else {
            warn!(provider = self.base.id(), "Cannot count tokens without an active model");
            return 0;
        };
        match self.tokenize(model, text).await {
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
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    name: String,
}

#[derive(Serialize)]
struct CohereChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
}

#[derive(Deserialize)]
struct CohereChatResponse {
    id: Option<String>,
    finish_reason: Option<String>,
    message: Option<CohereMessage>,
    usage: Option<CohereUsage>,
}

#[derive(Deserialize)]
struct CohereMessage {
    #[serde(default)]
    content: Vec<CohereContent>,
}

#[derive(Deserialize)]
struct CohereContent {
    text: Option<String>,
}

#[derive(Deserialize)]
struct CohereUsage {
    tokens: Option<CohereTokens>,
}

#[derive(Deserialize)]
struct CohereTokens {
    #[serde(default)]
    input_tokens: f64,
    #[serde(default)]
    output_tokens: f64,
}

#[derive(Serialize)]
struct TokenizeRequest<'a> {
    text: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct TokenizeResponse {
    tokens: Vec<i64>,
}
