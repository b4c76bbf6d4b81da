//! Vertex AI adapter
//!
//! Vertex has no key-scoped model listing, so the listing comes from the
//! `models` setting. Selecting a model verifies it against the publisher
//! model catalogue; a failed check leaves no model selected.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::base::{AuthScheme, HttpClientBase};
use super::gemini_wire::{GEMINI_DEFAULTS, GenerateContentRequest, GenerateContentResponse};
use crate::domain::types::{GenerationResult, ModelId, ProviderKey, SamplingParameters};
use crate::infrastructure::provider::error::AdapterError;
use crate::infrastructure::provider::factory::AdapterContext;
use crate::infrastructure::provider::traits::ProviderAdapter;
use crate::infrastructure::provider::types::{ModelFilter, ModelListing};

const DEFAULT_LOCATION: &str = "us-central1";
pub const UNLISTED_NOTE: &str = "Use Google VertexAI Console to list models";

pub fn build(ctx: AdapterContext) -> Box<dyn ProviderAdapter> {
    Box::new(VertexAdapter::new(ctx))
}

pub struct VertexAdapter {
    base: HttpClientBase,
    project: String,
    location: String,
    configured_models: Vec<String>,
}

impl VertexAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        let location = ctx
            .settings
            .location
            .clone()
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        let default_endpoint = format!("https://{location}-aiplatform.googleapis.com");
        Self {
            base: HttpClientBase::new(&ctx, &default_endpoint, AuthScheme::Bearer),
            project: ctx.settings.project.clone().unwrap_or_default(),
            location,
            configured_models: ctx.settings.models.clone(),
        }
    }

    async fn load_model(&self, model: &ModelId) -> Result<(), AdapterError> {
        let url = self
            .base
            .build_url(&format!("/v1/publishers/google/models/{model}"));
        let card: PublisherModel = self.base.fetch(self.base.get(&url)).await?;
        debug!(
            provider = self.base.id(),
            model = model.as_str(),
            name = card.name.as_deref().unwrap_or_default(),
            "Verified publisher model"
        );
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for VertexAdapter {
    fn provider(&self) -> &ProviderKey {
        &self.base.provider
    }

    fn active_model(&self) -> Option<&ModelId> {
        self.base.model.as_ref()
    }

    async fn list_models(&self, filter: Option<&ModelFilter>) -> ModelListing {
        if self.configured_models.is_empty() {
            return ModelListing::unlisted(UNLISTED_NOTE);
        }
        ModelListing::Available(self.configured_models.clone()).narrow(filter)
    }

    async fn set_model(&mut self, model: &ModelId) -> Result<(), AdapterError> {
        self.base.model = None;
        if let Err(err) = self.load_model(model).await {
            warn!(
                provider = self.base.id(),
                model = model.as_str(),
                error = %err,
                "Failed to load Vertex AI model"
            );
            return Err(AdapterError::model_load(
                self.base.id(),
                model.as_str(),
                err.user_message(),
            ));
        }
        self.base.model = Some(model.clone());
        Ok(())
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParameters,
    ) -> Result<GenerationResult, AdapterError> {
        let model = self.base.require_model()?;
        let url = self.base.build_url(&format!(
            "/v1/projects/{}/locations/{}/publishers/google/models/{model}:generateContent",
            self.project, self.location
        ));
        let params = params.overlay(&GEMINI_DEFAULTS);
        let payload = GenerateContentRequest::new(&self.base.system_prompt, prompt, &params);

        info!(
            provider = self.base.id(),
            model = model.as_str(),
            project = self.project.as_str(),
            location = self.location.as_str(),
            "Sending request to Vertex AI"
        );

        let response: GenerateContentResponse =
            self.base.generate(self.base.post(&url, &payload)).await?;
        debug!("Received response from Vertex AI");

        response.into_result(self.base.id(), model.as_str())
    }
}

#[derive(Deserialize)]
struct PublisherModel {
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::super::base::test_support::context;
    use super::*;
    use crate::config::ProviderSettings;
    use mockito::Server;

    fn settings(endpoint: &str, models: &[&str]) -> ProviderSettings {
        ProviderSettings {
            project: Some("demo-project".into()),
            models: models.iter().map(|m| m.to_string()).collect(),
            ..ProviderSettings::default().with_endpoint(endpoint)
        }
    }

    #[tokio::test]
    async fn listing_is_unlisted_without_configured_models() {
        let adapter = VertexAdapter::new(context("vertex", settings("http://unused", &[])));
        assert_eq!(
            adapter.list_models(None).await,
            ModelListing::unlisted(UNLISTED_NOTE)
        );
    }

    #[tokio::test]
    async fn failed_load_leaves_no_model() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/publishers/google/models/gemini-1.5-pro")
            .with_status(200)
            .with_body(r#"{"name":"publishers/google/models/gemini-1.5-pro"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/v1/publishers/google/models/not-a-model")
            .with_status(404)
            .create_async()
            .await;

        let mut adapter = VertexAdapter::new(context("vertex", settings(&server.url(), &[])));
        adapter
            .set_model(&ModelId::from("gemini-1.5-pro"))
            .await
            .unwrap();
        assert_eq!(adapter.active_model().map(ModelId::as_str), Some("gemini-1.5-pro"));

        let err = adapter
            .set_model(&ModelId::from("not-a-model"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::ModelLoad { .. }));
        assert!(adapter.active_model().is_none());

        let err = adapter
            .generate("hi", &SamplingParameters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NotReady { .. }));
    }

    #[tokio::test]
    async fn generate_targets_project_location_path() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/publishers/google/models/gemini-1.5-pro")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let mock = server
            .mock(
                "POST",
                "/v1/projects/demo-project/locations/us-central1/publishers/google/models/gemini-1.5-pro:generateContent",
            )
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Hello"}]},"finishReason":"STOP"}]}"#)
            .create_async()
            .await;

        let mut adapter =
            VertexAdapter::new(context("vertex", settings(&server.url(), &["gemini-1.5-pro"])));
        adapter
            .set_model(&ModelId::from("gemini-1.5-pro"))
            .await
            .unwrap();
        let result = adapter
            .generate("Say hello", &SamplingParameters::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.content, "Hello");
        assert_eq!(result.metadata.unwrap().model_name, "gemini-1.5-pro");
    }
}
