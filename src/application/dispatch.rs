//! Request dispatch
//!
//! Every call runs the same pipeline: validate the provider key, load its
//! adapter factory, build an adapter bound to the caller's credential,
//! confirm the requested model is listed, select it, then act. Nothing is
//! retried and no adapter outlives the call.

use crate::config::AppConfig;
use crate::domain::credential::{Credential, CredentialError};
use crate::domain::types::{GenerationRequest, GenerationResult, ModelId, ProviderKey};
use crate::infrastructure::provider::{
    AdapterError, AdapterFactory, AdapterRuntime, ModelFilter, ModelListing, ProviderAdapter,
    ProviderRegistry, RegistryError, Unavailability,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Who is expected to fix a failed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller sent something wrong.
    ClientInput,
    /// The deployment cannot serve the provider.
    Environment,
    /// The vendor failed or misbehaved.
    Vendor,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid provider '{provider}'; known providers: {}", .known.join(", "))]
    InvalidProvider { provider: String, known: Vec<String> },
    #[error("provider '{provider}' is unavailable: {reason}")]
    AdapterUnavailable {
        provider: String,
        reason: Unavailability,
    },
    #[error(
        "model '{model}' is not available for provider '{provider}'{}",
        .note.as_deref().map(|n| format!(" ({n})")).unwrap_or_default()
    )]
    InvalidModel {
        provider: String,
        model: String,
        note: Option<String>,
    },
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },
    #[error("generation failed: {0}")]
    Generation(#[source] AdapterError),
}

impl DispatchError {
    pub fn class(&self) -> ErrorClass {
        match self {
            DispatchError::InvalidProvider { .. }
            | DispatchError::InvalidModel { .. }
            | DispatchError::Credential(_)
            | DispatchError::InvalidRequest { .. } => ErrorClass::ClientInput,
            DispatchError::AdapterUnavailable { .. } => ErrorClass::Environment,
            DispatchError::Generation(_) => ErrorClass::Vendor,
        }
    }

    /// Stable machine-readable name, used as `kind` in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::InvalidProvider { .. } => "invalid_provider",
            DispatchError::AdapterUnavailable { .. } => "adapter_unavailable",
            DispatchError::InvalidModel { .. } => "invalid_model",
            DispatchError::Credential(_) => "missing_credential",
            DispatchError::InvalidRequest { .. } => "invalid_request",
            DispatchError::Generation(_) => "generation_failed",
        }
    }

    /// Message safe to show callers. Vendor response bodies are left out.
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::Generation(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<RegistryError> for DispatchError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownProvider { provider } => DispatchError::InvalidProvider {
                known: ProviderRegistry::builtin()
                    .list_known_providers()
                    .into_iter()
                    .map(|k| k.to_string())
                    .collect(),
                provider,
            },
            RegistryError::AdapterUnavailable { provider, reason } => {
                DispatchError::AdapterUnavailable { provider, reason }
            }
        }
    }
}

/// Entry point shared by the HTTP routes and the CLI.
#[derive(Clone)]
pub struct Dispatcher {
    registry: ProviderRegistry,
    config: AppConfig,
    runtime: AdapterRuntime,
}

impl Dispatcher {
    pub fn new(config: AppConfig) -> Self {
        let runtime = AdapterRuntime::new(&config.dispatch);
        Self {
            registry: ProviderRegistry::builtin(),
            config,
            runtime,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Known provider keys, in registry order.
    pub fn providers(&self) -> Vec<ProviderKey> {
        self.registry.list_known_providers()
    }

    /// Model listing for `provider` without any membership check.
    pub async fn list_models(
        &self,
        provider: &str,
        credential: Credential,
        filter: Option<&ModelFilter>,
    ) -> Result<ModelListing, DispatchError> {
        let factory = self.load(provider)?;
        let adapter = factory.build(&self.runtime, credential);
        let listing = adapter.list_models(filter).await;
        debug!(
            provider = adapter.provider().as_str(),
            status = listing.status(),
            count = listing.models().len(),
            "Listed models"
        );
        Ok(listing)
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
        credential: Credential,
    ) -> Result<GenerationResult, DispatchError> {
        if request.prompt.trim().is_empty() {
            return Err(DispatchError::InvalidRequest {
                reason: "prompt must not be empty".to_string(),
            });
        }

        let adapter = self
            .prepare(&request.provider, &request.model, credential)
            .await?;

        info!(
            provider = adapter.provider().as_str(),
            model = request.model.as_str(),
            "Dispatching generation request"
        );
        let result = adapter
            .generate(&request.prompt, &request.parameters)
            .await
            .map_err(|err| {
                warn!(
                    provider = adapter.provider().as_str(),
                    model = request.model.as_str(),
                    error = %err,
                    "Generation failed"
                );
                DispatchError::Generation(err)
            })?;
        debug!(
            provider = adapter.provider().as_str(),
            chars = result.content.len(),
            "Generation completed"
        );
        Ok(result)
    }

    /// Token count for `text` under `model`. Providers without a counting
    /// endpoint, or whose count fails, report 0.
    pub async fn count_tokens(
        &self,
        provider: &str,
        model: &str,
        text: &str,
        credential: Credential,
    ) -> Result<usize, DispatchError> {
        let adapter = self.prepare(provider, model, credential).await?;
        Ok(adapter.count_tokens(text).await)
    }

    fn load(&self, provider: &str) -> Result<AdapterFactory, DispatchError> {
        let key = ProviderKey::parse(provider);
        if !self.registry.contains(&key) {
            warn!(provider, "Rejected unknown provider");
            return Err(RegistryError::unknown(provider.trim()).into());
        }
        let descriptor = self.registry.resolve(&key)?;
        let settings = self.config.provider_settings(key.as_str());
        self.registry.load(descriptor, &settings).map_err(|err| {
            warn!(provider = key.as_str(), error = %err, "Provider adapter unavailable");
            DispatchError::from(err)
        })
    }

    /// Validate, load, list, then select `model`.
    async fn prepare(
        &self,
        provider: &str,
        model: &str,
        credential: Credential,
    ) -> Result<Box<dyn ProviderAdapter>, DispatchError> {
        let factory = self.load(provider)?;
        let mut adapter = factory.build(&self.runtime, credential);
        let model = ModelId::new(model.trim());

        let listing = adapter
            .list_models(Some(&ModelFilter::search(model.as_str())))
            .await;
        if !listing.contains(&model) {
            warn!(
                provider = adapter.provider().as_str(),
                model = model.as_str(),
                listing = listing.status(),
                "Requested model is not listed"
            );
            return Err(DispatchError::InvalidModel {
                provider: adapter.provider().to_string(),
                model: model.to_string(),
                note: listing.note().map(str::to_string),
            });
        }

        adapter
            .set_model(&model)
            .await
            .map_err(DispatchError::Generation)?;
        Ok(adapter)
    }
}
