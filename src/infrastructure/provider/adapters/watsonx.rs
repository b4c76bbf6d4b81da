//! IBM watsonx.ai adapter
//!
//! The caller's key is sent as a bearer token, so callers pass an IAM
//! access token rather than a raw IBM Cloud API key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::base::{AuthScheme, HttpClientBase};
use super::chat_wire::{CHAT_DEFAULTS, ChatMessage, chat_messages};
use crate::domain::types::{
    GenerationResult, ModelId, ProviderKey, ResponseMetadata, SamplingParameters, TokenUsage,
};
use crate::infrastructure::provider::error::AdapterError;
use crate::infrastructure::provider::factory::AdapterContext;
use crate::infrastructure::provider::traits::ProviderAdapter;
use crate::infrastructure::provider::types::{ModelFilter, ModelListing};

const BASE_URL: &str = "https://us-south.ml.cloud.ibm.com";
const DEFAULT_API_VERSION: &str = "2024-05-01";

pub fn build(ctx: AdapterContext) -> Box<dyn ProviderAdapter> {
    Box::new(WatsonxAdapter::new(ctx))
}

pub struct WatsonxAdapter {
    base: HttpClientBase,
    project_id: String,
    api_version: String,
}

impl WatsonxAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            base: HttpClientBase::new(&ctx, BASE_URL, AuthScheme::Bearer),
            project_id: ctx.settings.project.clone().unwrap_or_default(),
            api_version: ctx
                .settings
                .api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        }
    }

    async fn fetch_models(&self) -> Result<Vec<String>, AdapterError> {
        let url = self.base.build_url("/ml/v1/foundation_model_specs");
        let request = self.base.get(&url).query(&[
            ("version", self.api_version.as_str()),
            ("filters", "function_text_chat"),
            ("limit", "200"),
        ]);
        let payload: ModelSpecs = self.base.fetch(request).await?;
        Ok(payload.resources.into_iter().map(|r| r.model_id).collect())
    }
}

#[async_trait]
impl ProviderAdapter for WatsonxAdapter {
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
        let url = self.base.build_url("/ml/v1/text/chat");
        let params = params.overlay(&CHAT_DEFAULTS);
        let payload = WatsonxChatRequest {
            model_id: model.as_str(),
            project_id: &self.project_id,
            messages: chat_messages(&self.base.system_prompt, prompt),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
        };

        info!(
            provider = self.base.id(),
            model = model.as_str(),
            "Sending request to watsonx.ai"
        );

        let request = self
            .base
            .post(&url, &payload)
            .query(&[("version", self.api_version.as_str())]);
        let response: WatsonxChatResponse = self.base.generate(request).await?;
        debug!("Received response from watsonx.ai");

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::invalid_response(self.base.id(), "missing choices"))?;
        let content = choice
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| AdapterError::invalid_response(self.base.id(), "missing content"))?;

        let metadata = ResponseMetadata::new(response.model_id.unwrap_or_else(|| model.to_string()))
            .finish_reason(choice.finish_reason);
        let usage = response.usage.map(|u| {
            TokenUsage::new(u.prompt_tokens, u.completion_tokens).with_total(u.total_tokens)
        });

        Ok(GenerationResult::new(content)
            .with_id(response.id)
            .with_metadata(metadata)
            .with_usage(usage))
    }
}

#[derive(Deserialize)]
struct ModelSpecs {
    #[serde(default)]
    resources: Vec<ModelSpec>,
}

#[derive(Deserialize)]
struct ModelSpec {
    model_id: String,
}

#[derive(Serialize)]
struct WatsonxChatRequest<'a> {
    model_id: &'a str,
    project_id: &'a str,
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
}

#[derive(Deserialize)]
struct WatsonxChatResponse {
    id: Option<String>,
    model_id: Option<String>,
    #[serde(default)]
    choices: Vec<WatsonxChoice>,
    usage: Option<WatsonxUsage>,
}

#[derive(Deserialize)]
struct WatsonxChoice {
    message: Option<WatsonxMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WatsonxMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct WatsonxUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    total_tokens: Option<u64>,
}
