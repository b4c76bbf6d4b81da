//! Adapter factory - builds per-request adapters for a loaded provider

use super::adapters;
use super::registry::{AdapterKind, ProviderDescriptor};
use super::traits::ProviderAdapter;
use crate::config::{DispatchSettings, ProviderSettings};
use crate::domain::credential::Credential;
use crate::domain::types::ProviderKey;
use reqwest::Client;
use std::time::Duration;

/// Process-wide pieces every adapter shares.
#[derive(Debug, Clone)]
pub struct AdapterRuntime {
    pub http: Client,
    pub listing_timeout: Duration,
    pub generation_timeout: Option<Duration>,
    pub system_prompt: String,
}

impl AdapterRuntime {
    pub fn new(settings: &DispatchSettings) -> Self {
        Self {
            http: Client::new(),
            listing_timeout: settings.listing_timeout,
            generation_timeout: settings.generation_timeout,
            system_prompt: settings.system_prompt.clone(),
        }
    }
}

impl Default for AdapterRuntime {
    fn default() -> Self {
        Self::new(&DispatchSettings::default())
    }
}

/// Everything an adapter constructor receives.
#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub provider: ProviderKey,
    pub settings: ProviderSettings,
    pub credential: Credential,
    pub runtime: AdapterRuntime,
}

pub type AdapterConstructor = fn(AdapterContext) -> Box<dyn ProviderAdapter>;

/// Constructor for `kind`, or `None` when its feature is compiled out.
pub(crate) fn constructor_for(kind: AdapterKind) -> Option<AdapterConstructor> {
    match kind {
        #[cfg(feature = "openai-compatible")]
        AdapterKind::OpenAiCompatible => Some(adapters::openai::build),
        #[cfg(feature = "azure")]
        AdapterKind::AzureOpenAi => Some(adapters::azure::build),
        #[cfg(feature = "anthropic")]
        AdapterKind::Anthropic => Some(adapters::anthropic::build),
        #[cfg(feature = "cohere")]
        AdapterKind::Cohere => Some(adapters::cohere::build),
        #[cfg(feature = "google")]
        AdapterKind::GoogleGenAi => Some(adapters::gemini::build),
        #[cfg(feature = "vertex")]
        AdapterKind::VertexAi => Some(adapters::vertex::build),
        #[cfg(feature = "bedrock")]
        AdapterKind::Bedrock => Some(adapters::bedrock::build),
        #[cfg(feature = "huggingface")]
        AdapterKind::HuggingFace => Some(adapters::huggingface::build),
        #[cfg(feature = "ollama")]
        AdapterKind::Ollama => Some(adapters::ollama::build),
        #[cfg(feature = "watsonx")]
        AdapterKind::Watsonx => Some(adapters::watsonx::build),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

/// A provider that passed loading. Builds a fresh adapter per call.
#[derive(Debug, Clone)]
pub struct AdapterFactory {
    descriptor: &'static ProviderDescriptor,
    settings: ProviderSettings,
    constructor: AdapterConstructor,
}

impl AdapterFactory {
    pub(crate) fn new(
        descriptor: &'static ProviderDescriptor,
        settings: ProviderSettings,
        constructor: AdapterConstructor,
    ) -> Self {
        Self {
            descriptor,
            settings,
            constructor,
        }
    }

    pub fn descriptor(&self) -> &'static ProviderDescriptor {
        self.descriptor
    }

    pub fn build(&self, runtime: &AdapterRuntime, credential: Credential) -> Box<dyn ProviderAdapter> {
        (self.constructor)(AdapterContext {
            provider: ProviderKey::parse(self.descriptor.key),
            settings: self.settings.clone(),
            credential,
            runtime: runtime.clone(),
        })
    }
}
