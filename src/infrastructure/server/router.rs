use super::docs::ApiDoc;
use super::error::ServerError;
use super::routes;
use super::state::ServerState;
use crate::application::Dispatcher;
use crate::config::RestServerConfig;
use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub const API_PREFIX: &str = "/api/v1";

/// Full application router: API routes at the root and under `/api/v1`,
/// plus Swagger UI.
pub fn build_router(dispatcher: Dispatcher, config: &RestServerConfig) -> Router {
    let state = Arc::new(ServerState::new(dispatcher));

    let api: Router<Arc<ServerState>> = Router::new()
        .route("/providers", get(routes::providers::providers_handler))
        .route("/models", get(routes::models::models_handler))
        .route("/generate", post(routes::generate::generate_handler))
        .route("/count-tokens", post(routes::tokens::count_tokens_handler));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(api.clone())
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .with_state(state)
}

fn cors_layer(config: &RestServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = origin.as_str(), "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

pub(super) async fn serve(
    dispatcher: Dispatcher,
    config: &RestServerConfig,
    addr: SocketAddr,
) -> Result<(), ServerError> {
    info!(%addr, "Binding REST server");
    let app = build_router(dispatcher, config);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "REST server ready to accept connections");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
