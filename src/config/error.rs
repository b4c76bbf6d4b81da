use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid bind address '{value}' in [server]")]
    InvalidBind { value: String },

    #[error("[providers.{provider}] does not name a registered provider")]
    UnknownProvider { provider: String },

    #[error("[dispatch] listing_timeout_secs must be greater than zero")]
    ZeroListingTimeout,
}
