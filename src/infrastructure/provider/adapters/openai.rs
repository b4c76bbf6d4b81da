//! OpenAI-compatible adapter
//!
//! Serves every vendor that speaks the `/v1/models` + chat-completions
//! dialect: OpenAI, NVIDIA, Groq, Mistral, Databricks, Fireworks,
//! Together, Upstage and xAI. Vendors differ only in base URL, paths and
//! the fallback list used when listing fails.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::base::{AuthScheme, HttpClientBase};
use super::chat_wire::{CHAT_DEFAULTS, ChatRequest, ChatResponse};
use crate::domain::types::{GenerationResult, ModelId, ProviderKey, SamplingParameters};
use crate::infrastructure::provider::error::AdapterError;
use crate::infrastructure::provider::factory::AdapterContext;
use crate::infrastructure::provider::traits::ProviderAdapter;
use crate::infrastructure::provider::types::{ModelFilter, ModelListing};

const CHAT_PATH: &str = "/v1/chat/completions";
const MODELS_PATH: &str = "/v1/models";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VendorProfile {
    base_url: &'static str,
    models_path: &'static str,
    chat_path: &'static str,
    fallback: &'static [&'static str],
}

impl VendorProfile {
    const fn standard(base_url: &'static str) -> Self {
        Self {
            base_url,
            models_path: MODELS_PATH,
            chat_path: CHAT_PATH,
            fallback: &[],
        }
    }
}

fn profile_for(provider: &str) -> VendorProfile {
    match provider {
        "nvidia" => VendorProfile::standard("https://integrate.api.nvidia.com"),
        "groq" => VendorProfile::standard("https://api.groq.com/openai"),
        "mistral" => VendorProfile::standard("https://api.mistral.ai"),
        "fireworks" => VendorProfile::standard("https://api.fireworks.ai/inference"),
        "together" => VendorProfile::standard("https://api.together.xyz"),
        "upstage" => VendorProfile::standard("https://api.upstage.ai"),
        "xai" => VendorProfile::standard("https://api.x.ai"),
        // Workspace URL always comes from the `endpoint` setting.
        "databricks" => VendorProfile {
            base_url: "",
            models_path: "/api/2.0/serving-endpoints",
            chat_path: "/serving-endpoints/chat/completions",
            fallback: &[],
        },
        _ => VendorProfile {
            fallback: &["gpt-3.5-turbo"],
            ..VendorProfile::standard("https://api.openai.com")
        },
    }
}

pub fn build(ctx: AdapterContext) -> Box<dyn ProviderAdapter> {
    Box::new(OpenAiCompatibleAdapter::new(ctx))
}

/// Adapter for chat-completions style vendors
pub struct OpenAiCompatibleAdapter {
    base: HttpClientBase,
    profile: VendorProfile,
}

impl OpenAiCompatibleAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        let profile = profile_for(ctx.provider.as_str());
        Self {
            base: HttpClientBase::new(&ctx, profile.base_url, AuthScheme::Bearer),
            profile,
        }
    }

    async fn fetch_models(&self) -> Result<Vec<String>, AdapterError> {
        let url = self.base.build_url(self.profile.models_path);
        let payload: ModelsPayload = self.base.fetch(self.base.get(&url)).await?;
        Ok(payload.into_ids())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleAdapter {
    fn provider(&self) -> &ProviderKey {
        &self.base.provider
    }

    fn active_model(&self) -> Option<&ModelId> {
        self.base.model.as_ref()
    }

    async fn list_models(&self, filter: Option<&ModelFilter>) -> ModelListing {
        let result = self.fetch_models().await;
        if let Ok(models) = &result {
            debug!(provider = self.base.id(), count = models.len(), "Listed models");
        }
        ModelListing::settle(self.base.id(), result, self.profile.fallback).narrow(filter)
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
        let url = self.base.build_url(self.profile.chat_path);
        let params = params.overlay(&CHAT_DEFAULTS);
        let payload = ChatRequest::new(Some(model.as_str()), &self.base.system_prompt, prompt, &params);

        info!(
            provider = self.base.id(),
            model = model.as_str(),
            "Sending request to OpenAI-compatible provider"
        );

        let response: ChatResponse = self.base.generate(self.base.post(&url, &payload)).await?;
        debug!("Received response from OpenAI-compatible provider");

        response.into_result(self.base.id(), model.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModelsPayload {
    Data { data: Vec<ModelEntry> },
    Endpoints { endpoints: Vec<EndpointEntry> },
    Bare(Vec<ModelEntry>),
}

impl ModelsPayload {
    fn into_ids(self) -> Vec<String> {
        match self {
            ModelsPayload::Data { data } | ModelsPayload::Bare(data) => {
                data.into_iter().map(|m| m.id).collect()
            }
            ModelsPayload::Endpoints { endpoints } => {
                endpoints.into_iter().map(|e| e.name).collect()
            }
        }
    }
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct EndpointEntry {
    name: String,
}
