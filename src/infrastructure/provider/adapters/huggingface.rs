//! Hugging Face adapter
//!
//! Model discovery goes through the Hub API, generation through the
//! serverless Inference API. Listing covers both text pipelines. Selecting a
//! model fetches its Hub card and requires one of them; on failure no model
//! stays selected.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::base::{AuthScheme, HttpClientBase, join_url};
use crate::domain::types::{
    GenerationResult, ModelId, ProviderKey, ResponseMetadata, SamplingParameters,
};
use crate::infrastructure::provider::error::AdapterError;
use crate::infrastructure::provider::factory::AdapterContext;
use crate::infrastructure::provider::traits::ProviderAdapter;
use crate::infrastructure::provider::types::{ModelFilter, ModelListing};

const HUB_URL: &str = "https://huggingface.co";
const INFERENCE_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_LIST_LIMIT: usize = 10;
const TEXT_PIPELINES: &[&str] = &["text-generation", "text2text-generation"];

const DEFAULTS: SamplingParameters = SamplingParameters {
    max_tokens: Some(256),
    temperature: Some(0.7),
    do_sample: Some(true),
    top_p: Some(0.95),
    repetition_penalty: Some(1.5),
    num_return_sequences: Some(1),
    ..SamplingParameters::EMPTY
};

pub fn build(ctx: AdapterContext) -> Box<dyn ProviderAdapter> {
    Box::new(HuggingFaceAdapter::new(ctx))
}

pub struct HuggingFaceAdapter {
    base: HttpClientBase,
    inference_endpoint: String,
}

impl HuggingFaceAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            base: HttpClientBase::new(&ctx, HUB_URL, AuthScheme::Bearer),
            inference_endpoint: ctx.settings.endpoint_or(INFERENCE_URL),
        }
    }

    /// One Hub query per text pipeline, merged in query order without
    /// duplicates. A search term lifts the default limit so an exact id is
    /// never cut off by more popular partial matches.
    async fn search_hub(&self, filter: Option<&ModelFilter>) -> Result<Vec<String>, AdapterError> {
        let url = self.base.build_url("/api/models");
        let search = filter
            .and_then(|f| f.search.as_deref())
            .map(str::trim)
            .filter(|term| !term.is_empty());
        let limit = match (filter.and_then(|f| f.limit), search) {
            (Some(limit), _) => Some(limit),
            (None, None) => Some(DEFAULT_LIST_LIMIT),
            (None, Some(_)) => None,
        };
        let limit_param = limit.map(|l| l.to_string());

        let mut ids: Vec<String> = Vec::new();
        for pipeline in TEXT_PIPELINES {
            let mut query = vec![("pipeline_tag", *pipeline), ("sort", "downloads")];
            if let Some(limit) = limit_param.as_deref() {
                query.push(("limit", limit));
            }
            if let Some(term) = search {
                query.push(("search", term));
            }
            let models: Vec<HubModel> = self.base.fetch(self.base.get(&url).query(&query)).await?;
            for id in models.into_iter().map(HubModel::into_id) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        if let Some(limit) = limit {
            ids.truncate(limit);
        }
        Ok(ids)
    }

    async fn load_model(&self, model: &ModelId) -> Result<(), AdapterError> {
        let url = self.base.build_url(&format!("/api/models/{model}"));
        let card: HubModel = self.base.fetch(self.base.get(&url)).await?;
        match card.pipeline_tag.as_deref() {
            None => Ok(()),
            Some(tag) if TEXT_PIPELINES.contains(&tag) => Ok(()),
            Some(tag) => Err(AdapterError::model_load(
                self.base.id(),
                model.as_str(),
                format!("pipeline '{tag}' does not generate text"),
            )),
        }
    }
}

#[async_trait]
impl ProviderAdapter for HuggingFaceAdapter {
    fn provider(&self) -> &ProviderKey {
        &self.base.provider
    }

    fn active_model(&self) -> Option<&ModelId> {
        self.base.model.as_ref()
    }

    async fn list_models(&self, filter: Option<&ModelFilter>) -> ModelListing {
        ModelListing::settle(self.base.id(), self.search_hub(filter).await, &[])
    }

    async fn set_model(&mut self, model: &ModelId) -> Result<(), AdapterError> {
        self.base.model = None;
        match self.load_model(model).await {
            Ok(()) => {
                self.base.model = Some(model.clone());
                Ok(())
            }
            Err(err) => {
                warn!(
                    provider = self.base.id(),
                    model = model.as_str(),
                    error = %err,
                    "Failed to load Hugging Face model"
                );
                Err(match err {
                    load @ AdapterError::ModelLoad { .. } => load,
                    other => AdapterError::model_load(
                        self.base.id(),
                        model.as_str(),
                        other.user_message(),
                    ),
                })
            }
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParameters,
    ) -> Result<GenerationResult, AdapterError> {
        let model = self.base.require_model()?;
        let url = join_url(&self.inference_endpoint, &format!("/models/{model}"));
        let params = params.overlay(&DEFAULTS);
        let system = self.base.system_prompt.trim();
        let inputs = if system.is_empty() {
            prompt.to_string()
        } else {
            format!("{system}\n{prompt}")
        };
        let payload = InferenceRequest {
            inputs: &inputs,
            parameters: InferenceParameters {
                max_new_tokens: params.max_tokens,
                temperature: params.temperature,
                do_sample: params.do_sample,
                top_p: params.top_p,
                top_k: params.top_k,
                repetition_penalty: params.repetition_penalty,
                num_return_sequences: params.num_return_sequences,
                return_full_text: false,
            },
        };

        info!(
            provider = self.base.id(),
            model = model.as_str(),
            "Sending request to Hugging Face Inference API"
        );

        let outputs: Vec<GeneratedText> = self.base.generate(self.base.post(&url, &payload)).await?;
        debug!(sequences = outputs.len(), "Received response from Hugging Face");

        if outputs.is_empty() {
            return Err(AdapterError::invalid_response(self.base.id(), "no generated sequences"));
        }
        let content = outputs
            .iter()
            .map(|o| o.generated_text.trim())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(GenerationResult::new(content).with_metadata(ResponseMetadata::new(model.as_str())))
    }
}

#[derive(Deserialize)]
struct HubModel {
    id: String,
    pipeline_tag: Option<String>,
}

impl HubModel {
    fn into_id(self) -> String {
        self.id
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    do_sample: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_return_sequences: Option<u32>,
    return_full_text: bool,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}
