//! AWS Bedrock adapter (Converse API with Bedrock API keys)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::base::{AuthScheme, HttpClientBase, join_url};
use crate::domain::types::{
    GenerationResult, ModelId, ProviderKey, ResponseMetadata, SamplingParameters, TokenUsage,
};
use crate::infrastructure::provider::error::AdapterError;
use crate::infrastructure::provider::factory::AdapterContext;
use crate::infrastructure::provider::traits::ProviderAdapter;
use crate::infrastructure::provider::types::{ModelFilter, ModelListing};

const DEFAULT_REGION: &str = "us-east-1";

const DEFAULTS: SamplingParameters = SamplingParameters {
    temperature: Some(0.7),
    max_tokens: Some(512),
    ..SamplingParameters::EMPTY
};

pub fn build(ctx: AdapterContext) -> Box<dyn ProviderAdapter> {
    Box::new(BedrockAdapter::new(ctx))
}

/// Control-plane calls (listing) go to `bedrock.<region>`, inference to
/// `bedrock-runtime.<region>`. An `endpoint` setting replaces both.
pub struct BedrockAdapter {
    base: HttpClientBase,
    runtime_endpoint: String,
    region: String,
}

impl BedrockAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        let region = ctx
            .settings
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let control = format!("https://bedrock.{region}.amazonaws.com");
        let runtime = format!("https://bedrock-runtime.{region}.amazonaws.com");
        Self {
            base: HttpClientBase::new(&ctx, &control, AuthScheme::Bearer),
            runtime_endpoint: ctx.settings.endpoint_or(&runtime),
            region,
        }
    }

    async fn fetch_models(&self) -> Result<Vec<String>, AdapterError> {
        let url = self.base.build_url("/foundation-models");
        let request = self.base.get(&url).query(&[("byOutputModality", "TEXT")]);
        let payload: ModelsPayload = self.base.fetch(request).await?;
        Ok(payload
            .model_summaries
            .into_iter()
            .map(|m| m.model_id)
            .collect())
    }
}

#[async_trait]
impl ProviderAdapter for BedrockAdapter {
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
        let url = join_url(&self.runtime_endpoint, &format!("/model/{model}/converse"));
        let params = params.overlay(&DEFAULTS);
        let system = self.base.system_prompt.trim();
        let payload = ConverseRequest {
            system: if system.is_empty() {
                Vec::new()
            } else {
                vec![TextBlock { text: system }]
            },
            messages: vec![ConverseMessage {
                role: "user",
                content: vec![TextBlock { text: prompt }],
            }],
            inference_config: InferenceConfig {
                temperature: params.temperature,
                max_tokens: params.max_tokens,
                top_p: params.top_p,
            },
        };

        info!(
            provider = self.base.id(),
            model = model.as_str(),
            region = self.region.as_str(),
            "Sending request to Bedrock"
        );

        let response: ConverseResponse = self.base.generate(self.base.post(&url, &payload)).await?;
        debug!("Received response from Bedrock");

        let content: String = response
            .output
            .and_then(|o| o.message)
            .map(|m| m.content)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|block| block.text)
            .collect();
        if content.is_empty() {
            return Err(AdapterError::invalid_response(self.base.id(), "missing text output"));
        }

        let usage = response
            .usage
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens).with_total(u.total_tokens));

        Ok(GenerationResult::new(content)
            .with_metadata(ResponseMetadata::new(model.as_str()).finish_reason(response.stop_reason))
            .with_usage(usage))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelsPayload {
    #[serde(default)]
    model_summaries: Vec<ModelSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelSummary {
    model_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConverseRequest<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<TextBlock<'a>>,
    messages: Vec<ConverseMessage<'a>>,
    inference_config: InferenceConfig,
}

#[derive(Serialize)]
struct TextBlock<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct ConverseMessage<'a> {
    role: &'static str,
    content: Vec<TextBlock<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseResponse {
    output: Option<ConverseOutput>,
    stop_reason: Option<String>,
    usage: Option<ConverseUsage>,
}

#[derive(Deserialize)]
struct ConverseOutput {
    message: Option<ConverseReply>,
}

#[derive(Deserialize)]
struct ConverseReply {
    #[serde(default)]
    content: Vec<ReplyBlock>,
}

#[derive(Deserialize)]
struct ReplyBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    total_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::super::base::test_support::{context, context_at};
    use super::*;
    use crate::config::ProviderSettings;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[test]
    fn region_selects_default_hosts() {
        let settings = ProviderSettings {
            region: Some("eu-west-1".into()),
            ..ProviderSettings::default()
        };
        let adapter = BedrockAdapter::new(context("aws", settings));
        assert_eq!(adapter.base.endpoint, "https://bedrock.eu-west-1.amazonaws.com");
        assert_eq!(
            adapter.runtime_endpoint,
            "https://bedrock-runtime.eu-west-1.amazonaws.com"
        );
    }

    #[tokio::test]
    async fn lists_text_foundation_models() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/foundation-models")
            .match_query(Matcher::UrlEncoded("byOutputModality".into(), "TEXT".into()))
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_body(r#"{"modelSummaries":[{"modelId":"anthropic.claude-3-haiku-20240307-v1:0"}]}"#)
            .create_async()
            .await;

        let listing = BedrockAdapter::new(context_at("aws", &server.url()))
            .list_models(None)
            .await;

        mock.assert_async().await;
        assert_eq!(
            listing.models(),
            ["anthropic.claude-3-haiku-20240307-v1:0".to_string()].as_slice()
        );
    }

    #[tokio::test]
    async fn generate_uses_converse() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/model/amazon.titan-text-express-v1/converse")
            .match_body(Matcher::PartialJson(json!({
                "system": [{"text": "Answer the following question:"}],
                "messages": [{"role": "user", "content": [{"text": "Hi"}]}],
                "inferenceConfig": {"maxTokens": 512}
            })))
            .with_status(200)
            .with_body(
                json!({
                    "output": {"message": {"role": "assistant", "content": [{"text": "Hello."}]}},
                    "stopReason": "end_turn",
                    "usage": {"inputTokens": 4, "outputTokens": 2, "totalTokens": 6}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let mut adapter = BedrockAdapter::new(context_at("aws", &server.url()));
        adapter
            .set_model(&ModelId::from("amazon.titan-text-express-v1"))
            .await
            .unwrap();
        let result = adapter
            .generate("Hi", &SamplingParameters::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.content, "Hello.");
        assert_eq!(result.usage, Some(TokenUsage::new(4, 2)));
        assert!(result.id.is_none());
    }
}
