//! Google AI (Gemini API) adapter

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::base::{AuthScheme, HttpClientBase, token_count};
use super::gemini_wire::{
    GEMINI_DEFAULTS, GenerateContentRequest, GenerateContentResponse, user_contents,
};
use crate::domain::types::{GenerationResult, ModelId, ProviderKey, SamplingParameters};
use crate::infrastructure::provider::error::AdapterError;
use crate::infrastructure::provider::factory::AdapterContext;
use crate::infrastructure::provider::traits::ProviderAdapter;
use crate::infrastructure::provider::types::{ModelFilter, ModelListing};

const BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_PATH: &str = "/v1beta/models";

pub fn build(ctx: AdapterContext) -> Box<dyn ProviderAdapter> {
    Box::new(GeminiAdapter::new(ctx))
}

/// Gemini adapter for Google AI
pub struct GeminiAdapter {
    base: HttpClientBase,
}

impl GeminiAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            base: HttpClientBase::new(&ctx, BASE_URL, AuthScheme::Header("x-goog-api-key")),
        }
    }

    fn build_model_url(&self, model: &ModelId, method: &str) -> String {
        let model = model.as_str().trim_start_matches("models/");
        self.base.build_url(&format!("{API_PATH}/{model}:{method}"))
    }

    async fn fetch_models(&self) -> Result<Vec<String>, AdapterError> {
        let url = self.base.build_url(API_PATH);
        let request = self.base.get(&url).query(&[("pageSize", "1000")]);
        let payload: ModelsPayload = self.base.fetch(request).await?;
        Ok(payload
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods.is_empty()
                    || m.supported_generation_methods
                        .iter()
                        .any(|method| method == "generateContent")
            })
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }

    async fn request_token_count(&self, model: &ModelId, text: &str) -> Result<usize, AdapterError> {
        let url = self.build_model_url(model, "countTokens");
        let body = json!({ "contents": user_contents(text) });
        let response: CountTokensResponse = self.base.fetch(self.base.post(&url, &body)).await?;
        Ok(token_count(response.total_tokens))
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
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
        let url = self.build_model_url(model, "generateContent");
        let params = params.overlay(&GEMINI_DEFAULTS);
        let payload = GenerateContentRequest::new(&self.base.system_prompt, prompt, &params);

        info!(
            provider = self.base.id(),
            model = model.as_str(),
            "Sending request to Gemini"
        );

        let response: GenerateContentResponse =
            self.base.generate(self.base.post(&url, &payload)).await?;
        debug!("Received response from Gemini");

        response.into_result(self.base.id(), model.as_str())
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
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountTokensResponse {
    total_tokens: u64,
}
