//! Provider adapter trait

use super::error::AdapterError;
use super::types::{ModelFilter, ModelListing};
use crate::domain::types::{GenerationResult, ModelId, ProviderKey, SamplingParameters};
use async_trait::async_trait;
use tracing::warn;

/// One vendor integration, bound to a single caller's credential.
///
/// Instances are built per request and dropped when the request completes.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> &ProviderKey;

    /// The model selected by the last successful [`ProviderAdapter::set_model`].
    fn active_model(&self) -> Option<&ModelId>;

    /// Never fails; see [`ModelListing`] for how vendor trouble is reported.
    async fn list_models(&self, filter: Option<&ModelFilter>) -> ModelListing;

    /// Select the model used by subsequent calls.
    ///
    /// Adapters that must load or verify the model remotely leave no model
    /// selected when that fails.
    async fn set_model(&mut self, model: &ModelId) -> Result<(), AdapterError>;

    /// Fails with [`AdapterError::NotReady`] before any vendor call when no
    /// model is selected.
    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParameters,
    ) -> Result<GenerationResult, AdapterError>;

    async fn count_tokens(&self, _text: &str) -> usize {
        warn!(
            provider = self.provider().as_str(),
            "Token counting is not supported by this provider"
        );
        0
    }
}
