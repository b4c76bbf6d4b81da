//! Azure OpenAI adapter
//!
//! Azure exposes models through per-resource deployments and has no
//! listing endpoint usable with an inference key, so the listing comes
//! from the `models` setting or is reported as unlisted.

use async_trait::async_trait;
use tracing::{debug, info};

use super::base::{AuthScheme, HttpClientBase};
use super::chat_wire::{CHAT_DEFAULTS, ChatRequest, ChatResponse};
use crate::domain::types::{GenerationResult, ModelId, ProviderKey, SamplingParameters};
use crate::infrastructure::provider::error::AdapterError;
use crate::infrastructure::provider::factory::AdapterContext;
use crate::infrastructure::provider::traits::ProviderAdapter;
use crate::infrastructure::provider::types::{ModelFilter, ModelListing};

const DEFAULT_API_VERSION: &str = "2024-10-21";
pub const UNLISTED_NOTE: &str = "Azure OpenAI models depend on configured deployments";

pub fn build(ctx: AdapterContext) -> Box<dyn ProviderAdapter> {
    Box::new(AzureOpenAiAdapter::new(ctx))
}

pub struct AzureOpenAiAdapter {
    base: HttpClientBase,
    api_version: String,
    deployments: Vec<String>,
}

impl AzureOpenAiAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            base: HttpClientBase::new(&ctx, "", AuthScheme::Header("api-key")),
            api_version: ctx
                .settings
                .api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            deployments: ctx.settings.models.clone(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for AzureOpenAiAdapter {
    fn provider(&self) -> &ProviderKey {
        &self.base.provider
    }

    fn active_model(&self) -> Option<&ModelId> {
        self.base.model.as_ref()
    }

    async fn list_models(&self, filter: Option<&ModelFilter>) -> ModelListing {
        if self.deployments.is_empty() {
            return ModelListing::unlisted(UNLISTED_NOTE);
        }
        ModelListing::Available(self.deployments.clone()).narrow(filter)
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
        let deployment = self.base.require_model()?;
        let url = self.base.build_url(&format!(
            "/openai/deployments/{deployment}/chat/completions"
        ));
        let params = params.overlay(&CHAT_DEFAULTS);
        let payload = ChatRequest::new(None, &self.base.system_prompt, prompt, &params);

        info!(
            provider = self.base.id(),
            model = deployment.as_str(),
            api_version = self.api_version.as_str(),
            "Sending request to Azure OpenAI"
        );

        let request = self
            .base
            .post(&url, &payload)
            .query(&[("api-version", self.api_version.as_str())]);
        let response: ChatResponse = self.base.generate(request).await?;
        debug!("Received response from Azure OpenAI");

        response.into_result(self.base.id(), deployment.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::super::base::test_support::context;
    use super::*;
    use crate::config::ProviderSettings;
    use mockito::{Matcher, Server};

    fn settings(endpoint: &str, models: &[&str]) -> ProviderSettings {
        ProviderSettings {
            models: models.iter().map(|m| m.to_string()).collect(),
            ..ProviderSettings::default().with_endpoint(endpoint)
        }
    }

    #[tokio::test]
    async fn unlisted_without_configured_deployments() {
        let adapter = AzureOpenAiAdapter::new(context("azure", settings("http://unused", &[])));
        let listing = adapter.list_models(None).await;
        assert_eq!(listing, ModelListing::unlisted(UNLISTED_NOTE));
    }

    #[tokio::test]
    async fn configured_deployments_are_available() {
        let adapter =
            AzureOpenAiAdapter::new(context("azure", settings("http://unused", &["gpt-4o", "gpt-35"])));
        let listing = adapter.list_models(None).await;
        assert_eq!(
            listing,
            ModelListing::Available(vec!["gpt-4o".into(), "gpt-35".into()])
        );
    }

    #[tokio::test]
    async fn generate_targets_deployment_with_api_key_header() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-4o/chat/completions")
            .match_query(Matcher::UrlEncoded(
                "api-version".into(),
                DEFAULT_API_VERSION.into(),
            ))
            .match_header("api-key", "sk-test")
            .with_status(200)
            .with_body(
                r#"{"id":"cmpl-1","model":"gpt-4o","choices":[{"message":{"content":"Paris"},"finish_reason":"stop"}]}"#,
            )
            .create_async()
            .await;

        let mut adapter =
            AzureOpenAiAdapter::new(context("azure", settings(&server.url(), &["gpt-4o"])));
        adapter.set_model(&ModelId::from("gpt-4o")).await.unwrap();
        let result = adapter
            .generate("Capital of France?", &SamplingParameters::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.content, "Paris");
        assert_eq!(result.id.as_deref(), Some("cmpl-1"));
    }
}
