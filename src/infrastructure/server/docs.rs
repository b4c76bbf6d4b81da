use super::dto::{
    CountTokensRequestBody, CountTokensResponse, ErrorResponse, GenerateRequestBody,
    GenerateResponse, ModelsResponse, ProvidersResponse, ResponseMetadataDto, TokenUsageDto,
    UsageMetadataDto,
};
use super::routes;
use crate::domain::types::SamplingParameters;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::providers::providers_handler,
        routes::models::models_handler,
        routes::generate::generate_handler,
        routes::tokens::count_tokens_handler
    ),
    components(
        schemas(
            ProvidersResponse,
            ModelsResponse,
            GenerateRequestBody,
            GenerateResponse,
            ResponseMetadataDto,
            TokenUsageDto,
            UsageMetadataDto,
            SamplingParameters,
            CountTokensRequestBody,
            CountTokensResponse,
            ErrorResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "providers", description = "Registered LLM vendors"),
        (name = "models", description = "Model discovery per vendor"),
        (name = "generate", description = "Text generation and token counting")
    )
)]
pub(super) struct ApiDoc;

/// The caller's vendor API key travels as a bearer token.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}
