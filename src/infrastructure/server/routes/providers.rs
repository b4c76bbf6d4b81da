use super::super::dto::ProvidersResponse;
use super::super::state::ServerState;
use axum::Json;
use axum::extract::State;
use std::sync::Arc;
use tracing::debug;

#[utoipa::path(
    get,
    path = "/providers",
    tag = "providers",
    responses(
        (status = 200, description = "Registered provider keys in registry order", body = ProvidersResponse)
    )
)]
pub async fn providers_handler(State(state): State<Arc<ServerState>>) -> Json<ProvidersResponse> {
    let providers: Vec<String> = state
        .dispatcher()
        .providers()
        .into_iter()
        .map(|key| key.to_string())
        .collect();
    debug!(count = providers.len(), "Serving /providers request");
    Json(ProvidersResponse { providers })
}
