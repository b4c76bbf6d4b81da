use super::super::dto::{CountTokensRequestBody, CountTokensResponse, ErrorResponse};
use super::super::error::{ApiError, api_error};
use super::super::state::ServerState;
use super::credential_from;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::debug;

#[utoipa::path(
    post,
    path = "/count-tokens",
    tag = "generate",
    request_body = CountTokensRequestBody,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Token count, 0 when the provider cannot count", body = CountTokensResponse),
        (status = 400, description = "Unknown provider or unlisted model", body = ErrorResponse),
        (status = 401, description = "Missing or malformed API key", body = ErrorResponse),
        (status = 502, description = "Model could not be selected", body = ErrorResponse),
        (status = 503, description = "Provider not usable in this deployment", body = ErrorResponse)
    )
)]
pub async fn count_tokens_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(payload): Json<CountTokensRequestBody>,
) -> Result<Json<CountTokensResponse>, ApiError> {
    let credential = credential_from(&headers)?;
    let tokens = state
        .dispatcher()
        .count_tokens(&payload.provider, &payload.model, &payload.text, credential)
        .await
        .map_err(api_error)?;
    debug!(provider = payload.provider.as_str(), tokens, "Counted tokens");
    Ok(Json(CountTokensResponse { tokens }))
}
