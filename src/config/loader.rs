use super::app::{AppConfig, DispatchSettings};
use super::defaults::{CONFIG_PATH, DEFAULT_ENV_PATH, DEFAULT_SYSTEM_PROMPT};
use super::error::ConfigError;
use super::provider::{ProviderSettings, RawProviderSettings};
use super::server::{RawRestServer, RestServerConfig};
use crate::domain::types::ProviderKey;
use crate::infrastructure::provider::registry::ProviderRegistry;
use dotenvy::from_filename;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;
use tracing::{debug, info};

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    server: RawRestServer,
    #[serde(default)]
    dispatch: RawDispatch,
    #[serde(default)]
    providers: BTreeMap<String, RawProviderSettings>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawDispatch {
    listing_timeout_secs: Option<u64>,
    generation_timeout_secs: Option<u64>,
    system_prompt: Option<String>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(DEFAULT_ENV_PATH);
    });
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    match path {
        Some(path) => read_config(path),
        None => match read_config(Path::new(CONFIG_PATH)) {
            Err(ConfigError::NotFound { .. }) => {
                info!("Configuration file not found; using defaults");
                Ok(AppConfig::default())
            }
            other => other,
        },
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading switchboard configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_and_build(parsed)
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    let server = RestServerConfig::try_from(parsed.server)?;

    let listing_timeout_secs = parsed
        .dispatch
        .listing_timeout_secs
        .unwrap_or_else(|| DispatchSettings::default().listing_timeout.as_secs());
    if listing_timeout_secs == 0 {
        return Err(ConfigError::ZeroListingTimeout);
    }
    let dispatch = DispatchSettings {
        listing_timeout: Duration::from_secs(listing_timeout_secs),
        generation_timeout: parsed
            .dispatch
            .generation_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs),
        system_prompt: parsed
            .dispatch
            .system_prompt
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
    };

    let registry = ProviderRegistry::builtin();
    let mut providers = BTreeMap::new();
    for (raw_key, raw_settings) in parsed.providers {
        let key = ProviderKey::parse(&raw_key);
        if !registry.contains(&key) {
            return Err(ConfigError::UnknownProvider { provider: raw_key });
        }
        providers.insert(key.as_str().to_string(), ProviderSettings::from(raw_settings));
    }

    Ok(AppConfig {
        server,
        dispatch,
        providers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(content: &str) -> Result<AppConfig, ConfigError> {
        let parsed: RawConfig = toml::from_str(content).expect("valid toml");
        validate_and_build(parsed)
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = build("").expect("config");
        assert_eq!(config.server, RestServerConfig::default());
        assert_eq!(config.dispatch, DispatchSettings::default());
        assert!(config.providers.is_empty());
    }

    #[test]
    fn provider_sections_are_normalized() {
        let config = build(
            r#"
[providers.Azure]
endpoint = "https://res.openai.azure.com"
models = ["gpt-4o"]
"#,
        )
        .expect("config");
        let azure = config.provider_settings("azure");
        assert_eq!(azure.endpoint.as_deref(), Some("https://res.openai.azure.com"));
        assert_eq!(azure.models, vec!["gpt-4o".to_string()]);
    }

    #[test]
    fn unknown_provider_section_is_rejected() {
        let err = build("[providers.openia]\nenabled = true").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProvider { provider } if provider == "openia"));
    }

    #[test]
    fn zero_listing_timeout_is_rejected() {
        let err = build("[dispatch]\nlisting_timeout_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroListingTimeout));
    }

    #[test]
    fn zero_generation_timeout_means_unbounded() {
        let config = build("[dispatch]\ngeneration_timeout_secs = 0").expect("config");
        assert!(config.dispatch.generation_timeout.is_none());
    }
}
