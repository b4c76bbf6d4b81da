//! Provider registry
//!
//! A fixed, ordered table maps each canonical provider key to the adapter
//! kind that serves it and the cargo feature that compiles that adapter in.
//! Resolving a key and loading its adapter are separate steps so callers
//! can tell "no such provider" apart from "provider not usable here".

use super::error::{RegistryError, Unavailability};
use super::factory::{AdapterFactory, constructor_for};
use crate::config::ProviderSettings;
use crate::domain::types::ProviderKey;
use tracing::debug;

/// Concrete adapter implementation behind a provider key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    OpenAiCompatible,
    AzureOpenAi,
    Anthropic,
    Cohere,
    GoogleGenAi,
    VertexAi,
    Bedrock,
    HuggingFace,
    Ollama,
    Watsonx,
}

impl AdapterKind {
    /// Cargo feature that compiles this adapter.
    pub const fn feature(self) -> &'static str {
        match self {
            AdapterKind::OpenAiCompatible => "openai-compatible",
            AdapterKind::AzureOpenAi => "azure",
            AdapterKind::Anthropic => "anthropic",
            AdapterKind::Cohere => "cohere",
            AdapterKind::GoogleGenAi => "google",
            AdapterKind::VertexAi => "vertex",
            AdapterKind::Bedrock => "bedrock",
            AdapterKind::HuggingFace => "huggingface",
            AdapterKind::Ollama => "ollama",
            AdapterKind::Watsonx => "watsonx",
        }
    }
}

/// Deployment setting a provider cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredSetting {
    Endpoint,
    Project,
}

impl RequiredSetting {
    pub const fn name(self) -> &'static str {
        match self {
            RequiredSetting::Endpoint => "endpoint",
            RequiredSetting::Project => "project",
        }
    }

    fn is_present(self, settings: &ProviderSettings) -> bool {
        match self {
            RequiredSetting::Endpoint => settings.endpoint.is_some(),
            RequiredSetting::Project => settings.project.is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub key: &'static str,
    pub module: &'static str,
    pub adapter: AdapterKind,
    pub requires: &'static [RequiredSetting],
}

const fn entry(
    key: &'static str,
    adapter: AdapterKind,
    requires: &'static [RequiredSetting],
) -> ProviderDescriptor {
    ProviderDescriptor {
        key,
        module: adapter.feature(),
        adapter,
        requires,
    }
}

const NONE: &[RequiredSetting] = &[];
const ENDPOINT: &[RequiredSetting] = &[RequiredSetting::Endpoint];
const PROJECT: &[RequiredSetting] = &[RequiredSetting::Project];

pub static PROVIDER_TABLE: [ProviderDescriptor; 18] = [
    entry("anthropic", AdapterKind::Anthropic, NONE),
    entry("openai", AdapterKind::OpenAiCompatible, NONE),
    entry("vertex", AdapterKind::VertexAi, PROJECT),
    entry("cohere", AdapterKind::Cohere, NONE),
    entry("nvidia", AdapterKind::OpenAiCompatible, NONE),
    entry("groq", AdapterKind::OpenAiCompatible, NONE),
    entry("mistral", AdapterKind::OpenAiCompatible, NONE),
    entry("databricks", AdapterKind::OpenAiCompatible, ENDPOINT),
    entry("aws", AdapterKind::Bedrock, NONE),
    entry("azure", AdapterKind::AzureOpenAi, ENDPOINT),
    entry("fireworks", AdapterKind::OpenAiCompatible, NONE),
    entry("together", AdapterKind::OpenAiCompatible, NONE),
    entry("google", AdapterKind::GoogleGenAi, NONE),
    entry("huggingface", AdapterKind::HuggingFace, NONE),
    entry("ollama", AdapterKind::Ollama, NONE),
    entry("upstage", AdapterKind::OpenAiCompatible, NONE),
    entry("ibm", AdapterKind::Watsonx, PROJECT),
    entry("xai", AdapterKind::OpenAiCompatible, NONE),
];

#[derive(Debug, Clone, Copy)]
pub struct ProviderRegistry {
    table: &'static [ProviderDescriptor],
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProviderRegistry {
    pub const fn builtin() -> Self {
        Self {
            table: &PROVIDER_TABLE,
        }
    }

    /// Known provider keys in table order.
    pub fn list_known_providers(&self) -> Vec<ProviderKey> {
        self.table.iter().map(|d| ProviderKey::parse(d.key)).collect()
    }

    pub fn contains(&self, key: &ProviderKey) -> bool {
        self.table.iter().any(|d| d.key == key.as_str())
    }

    pub fn resolve(&self, key: &ProviderKey) -> Result<&'static ProviderDescriptor, RegistryError> {
        self.table
            .iter()
            .find(|d| d.key == key.as_str())
            .ok_or_else(|| RegistryError::unknown(key.as_str()))
    }

    /// Checks that `descriptor` can run in this build and deployment and
    /// hands back a factory for per-request adapters.
    pub fn load(
        &self,
        descriptor: &'static ProviderDescriptor,
        settings: &ProviderSettings,
    ) -> Result<AdapterFactory, RegistryError> {
        let constructor = constructor_for(descriptor.adapter).ok_or_else(|| {
            RegistryError::unavailable(
                descriptor.key,
                Unavailability::FeatureDisabled {
                    feature: descriptor.module,
                },
            )
        })?;

        if !settings.enabled {
            return Err(RegistryError::unavailable(
                descriptor.key,
                Unavailability::Disabled,
            ));
        }

        if let Some(missing) = descriptor
            .requires
            .iter()
            .find(|setting| !setting.is_present(settings))
        {
            return Err(RegistryError::unavailable(
                descriptor.key,
                Unavailability::MissingSetting {
                    setting: missing.name(),
                },
            ));
        }

        debug!(
            provider = descriptor.key,
            module = descriptor.module,
            "Loaded provider adapter"
        );
        Ok(AdapterFactory::new(descriptor, settings.clone(), constructor))
    }
}
