mod docs;
mod dto;
mod error;
mod router;
mod routes;
mod state;

pub use dto::{
    CountTokensResponse, ErrorResponse, GenerateResponse, ModelsResponse, ProvidersResponse,
};
pub use error::ServerError;
pub use router::{API_PREFIX, build_router};

use crate::application::Dispatcher;
use crate::config::RestServerConfig;
use std::net::SocketAddr;

pub async fn serve(
    dispatcher: Dispatcher,
    config: &RestServerConfig,
    addr: SocketAddr,
) -> Result<(), ServerError> {
    router::serve(dispatcher, config, addr).await
}
