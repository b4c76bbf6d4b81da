use super::super::dto::{ErrorResponse, GenerateRequestBody, GenerateResponse};
use super::super::error::{ApiError, api_error};
use super::super::state::ServerState;
use super::credential_from;
use crate::domain::types::GenerationRequest;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::info;

#[utoipa::path(
    post,
    path = "/generate",
    tag = "generate",
    request_body = GenerateRequestBody,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Generated message", body = GenerateResponse),
        (status = 400, description = "Unknown provider, unlisted model or empty prompt", body = ErrorResponse),
        (status = 401, description = "Missing or malformed API key", body = ErrorResponse),
        (status = 502, description = "Vendor generation failed", body = ErrorResponse),
        (status = 503, description = "Provider not usable in this deployment", body = ErrorResponse)
    )
)]
pub async fn generate_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(payload): Json<GenerateRequestBody>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let credential = credential_from(&headers)?;
    info!(
        provider = payload.provider.as_str(),
        model = payload.model.as_str(),
        "Received /generate request"
    );

    let request = GenerationRequest::new(payload.provider, payload.model, payload.prompt)
        .with_parameters(payload.parameters.unwrap_or_default());
    let result = state
        .dispatcher()
        .generate(&request, credential)
        .await
        .map_err(api_error)?;

    Ok(Json(GenerateResponse::from(result)))
}
