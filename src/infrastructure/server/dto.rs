use crate::domain::types::{GenerationResult, SamplingParameters};
use crate::infrastructure::provider::ModelListing;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Error class: `invalid_provider`, `invalid_model`, `missing_credential`,
    /// `adapter_unavailable`, `generation_failed` or `invalid_request`.
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProvidersResponse {
    pub providers: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ModelsQuery {
    /// Provider key, case-insensitive.
    #[serde(default)]
    pub provider: String,
    /// Case-insensitive substring filter on model ids.
    pub search: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    /// `available`, `unlisted` or `degraded`.
    pub listing: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<ModelListing> for ModelsResponse {
    fn from(listing: ModelListing) -> Self {
        let status = listing.status().to_string();
        let note = listing.note().map(str::to_string);
        Self {
            models: listing.into_models(),
            listing: status,
            note,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRequestBody {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    pub parameters: Option<SamplingParameters>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenUsageDto {
    pub completion_tokens: u64,
    pub prompt_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResponseMetadataDto {
    /// Absent when the vendor reported no usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsageDto>,
    pub model_name: String,
    pub system_fingerprint: Option<String>,
    pub finish_reason: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub logprobs: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsageMetadataDto {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

/// Chat-message shaped generation result.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_metadata: Option<ResponseMetadataDto>,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: Option<String>,
    pub id: String,
    pub example: bool,
    #[schema(value_type = Vec<Object>)]
    pub tool_calls: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub invalid_tool_calls: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadataDto>,
}

impl From<GenerationResult> for GenerateResponse {
    fn from(result: GenerationResult) -> Self {
        let response_metadata = result.metadata.map(|metadata| ResponseMetadataDto {
            token_usage: result.usage.map(|usage| TokenUsageDto {
                completion_tokens: usage.completion_tokens,
                prompt_tokens: usage.prompt_tokens,
                total_tokens: usage.total_tokens,
            }),
            model_name: metadata.model_name,
            system_fingerprint: metadata.system_fingerprint,
            finish_reason: metadata.finish_reason,
            logprobs: None,
        });
        let usage_metadata = result.usage.map(|u| UsageMetadataDto {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Self {
            content: result.content,
            response_metadata,
            kind: "ai".to_string(),
            name: None,
            id: result
                .id
                .unwrap_or_else(|| format!("run-{}", Uuid::new_v4())),
            example: false,
            tool_calls: Vec::new(),
            invalid_tool_calls: Vec::new(),
            usage_metadata,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CountTokensRequestBody {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CountTokensResponse {
    pub tokens: usize,
}
