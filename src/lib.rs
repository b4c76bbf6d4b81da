pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{DispatchError, Dispatcher};
pub use cli::{Cli, Command};
pub use config::{AppConfig, ProviderSettings};
pub use domain::{credential, types};
pub use infrastructure::{provider, server};

use credential::{Credential, CredentialError};
use provider::ModelFilter;
use serde::Serialize;
use server::{CountTokensResponse, GenerateResponse, ModelsResponse, ProvidersResponse};
use std::error::Error;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};
use types::GenerationRequest;

pub async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    init_tracing();
    debug!(config = ?cli.config, command = ?cli.command, "CLI arguments parsed");

    let config = AppConfig::load(cli.config.as_deref())?;
    let dispatcher = Dispatcher::new(config);

    match cli.command {
        Command::Serve { addr } => {
            let server_config = dispatcher.config().server.clone();
            let addr = addr.unwrap_or(server_config.bind);
            info!(addr = %addr, "Starting REST server");
            server::serve(dispatcher, &server_config, addr).await?;
        }
        Command::Providers => {
            let providers = dispatcher
                .providers()
                .into_iter()
                .map(|key| key.to_string())
                .collect();
            print_json(&ProvidersResponse { providers })?;
        }
        Command::Models {
            provider,
            search,
            limit,
        } => {
            let credential = credential_from(cli.api_key)?;
            let filter = (search.is_some() || limit.is_some())
                .then(|| ModelFilter { search, limit });
            let listing = dispatcher
                .list_models(&provider, credential, filter.as_ref())
                .await?;
            print_json(&ModelsResponse::from(listing))?;
        }
        Command::Generate {
            provider,
            model,
            sampling,
            prompt,
        } => {
            let credential = credential_from(cli.api_key)?;
            let request = GenerationRequest::new(provider, model, prompt.join(" "))
                .with_parameters(sampling.into());
            let result = dispatcher.generate(&request, credential).await?;
            print_json(&GenerateResponse::from(result))?;
        }
        Command::CountTokens {
            provider,
            model,
            text,
        } => {
            let credential = credential_from(cli.api_key)?;
            let tokens = dispatcher
                .count_tokens(&provider, &model, &text.join(" "), credential)
                .await?;
            print_json(&CountTokensResponse { tokens })?;
        }
    }

    Ok(())
}

fn credential_from(api_key: Option<String>) -> Result<Credential, CredentialError> {
    match api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Ok(Credential::new(key)),
        _ => Err(CredentialError::Missing),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .with_writer(std::io::stderr)
            .init();
    });
}
