use super::defaults::DEFAULT_BIND;
use super::error::ConfigError;
use serde::Deserialize;
use std::net::SocketAddr;

/// Settings for the REST front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestServerConfig {
    pub bind: SocketAddr,
    /// Allowed CORS origins. Empty or `["*"]` allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for RestServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: Vec::new(),
        }
    }
}

impl RestServerConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawRestServer {
    bind: Option<String>,
    #[serde(default)]
    cors_origins: Vec<String>,
}

impl TryFrom<RawRestServer> for RestServerConfig {
    type Error = ConfigError;

    fn try_from(raw: RawRestServer) -> Result<Self, Self::Error> {
        let value = raw.bind.unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = value
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBind {
                value: value.clone(),
            })?;
        Ok(Self {
            bind,
            cors_origins: raw.cors_origins,
        })
    }
}
