use super::defaults::{DEFAULT_LISTING_TIMEOUT_SECS, DEFAULT_SYSTEM_PROMPT};
use super::error::ConfigError;
use super::provider::ProviderSettings;
use super::server::RestServerConfig;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Timeouts and prompt framing shared by every dispatched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub listing_timeout: Duration,
    /// `None` leaves generation calls unbounded.
    pub generation_timeout: Option<Duration>,
    pub system_prompt: String,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            listing_timeout: Duration::from_secs(DEFAULT_LISTING_TIMEOUT_SECS),
            generation_timeout: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Application configuration loaded from switchboard.toml
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: RestServerConfig,
    pub dispatch: DispatchSettings,
    /// Keyed by normalized provider key.
    pub providers: BTreeMap<String, ProviderSettings>,
}

impl AppConfig {
    /// Load configuration from a file path (or the default path if None).
    ///
    /// A missing default file yields built-in defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    /// Settings for `provider`, falling back to defaults when the file has
    /// no section for it.
    pub fn provider_settings(&self, provider: &str) -> ProviderSettings {
        self.providers.get(provider).cloned().unwrap_or_default()
    }

    pub fn with_provider(mut self, provider: &str, settings: ProviderSettings) -> Self {
        self.providers.insert(provider.to_ascii_lowercase(), settings);
        self
    }
}
