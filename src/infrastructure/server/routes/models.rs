use super::super::dto::{ErrorResponse, ModelsQuery, ModelsResponse};
use super::super::error::{ApiError, api_error};
use super::super::state::ServerState;
use super::credential_from;
use crate::infrastructure::provider::ModelFilter;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::info;

#[utoipa::path(
    get,
    path = "/models",
    tag = "models",
    params(ModelsQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Models offered by the provider", body = ModelsResponse),
        (status = 400, description = "Unknown provider", body = ErrorResponse),
        (status = 401, description = "Missing or malformed API key", body = ErrorResponse),
        (status = 503, description = "Provider not usable in this deployment", body = ErrorResponse)
    )
)]
pub async fn models_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Query(query): Query<ModelsQuery>,
) -> Result<Json<ModelsResponse>, ApiError> {
    let credential = credential_from(&headers)?;
    info!(provider = query.provider.as_str(), "Received /models request");

    let filter = (query.search.is_some() || query.limit.is_some()).then(|| ModelFilter {
        search: query.search.clone(),
        limit: query.limit,
    });
    let listing = state
        .dispatcher()
        .list_models(&query.provider, credential, filter.as_ref())
        .await
        .map_err(api_error)?;

    Ok(Json(ModelsResponse::from(listing)))
}
