//! Registry and adapter errors

use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// Why a known provider cannot be loaded in this deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailability {
    /// The crate was built without the cargo feature for this integration.
    FeatureDisabled { feature: &'static str },
    /// `enabled = false` in the provider's config section.
    Disabled,
    /// A setting the integration cannot work without is absent.
    MissingSetting { setting: &'static str },
}

impl fmt::Display for Unavailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeatureDisabled { feature } => {
                write!(f, "built without the '{feature}' feature")
            }
            Self::Disabled => f.write_str("disabled in configuration"),
            Self::MissingSetting { setting } => write!(f, "missing required setting '{setting}'"),
        }
    }
}

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown provider '{provider}'")]
    UnknownProvider { provider: String },
    #[error("provider '{provider}' is unavailable: {reason}")]
    AdapterUnavailable {
        provider: String,
        reason: Unavailability,
    },
}

impl RegistryError {
    pub fn unknown(provider: impl Into<String>) -> Self {
        Self::UnknownProvider {
            provider: provider.into(),
        }
    }

    pub fn unavailable(provider: impl Into<String>, reason: Unavailability) -> Self {
        Self::AdapterUnavailable {
            provider: provider.into(),
            reason,
        }
    }
}

/// Adapter errors
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("provider '{provider}' has no active model")]
    NotReady { provider: String },
    #[error("provider '{provider}' could not load model '{model}': {reason}")]
    ModelLoad {
        provider: String,
        model: String,
        reason: String,
    },
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' responded with HTTP {status}: {body}")]
    Vendor {
        provider: String,
        status: u16,
        body: String,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl AdapterError {
    pub fn not_ready(provider: impl Into<String>) -> Self {
        Self::NotReady {
            provider: provider.into(),
        }
    }

    pub fn model_load(
        provider: impl Into<String>,
        model: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ModelLoad {
            provider: provider.into(),
            model: model.into(),
            reason: reason.into(),
        }
    }

    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn vendor(provider: impl Into<String>, status: StatusCode, body: impl Into<String>) -> Self {
        Self::Vendor {
            provider: provider.into(),
            status: status.as_u16(),
            body: body.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Short, caller-facing description without vendor response bodies.
    pub fn user_message(&self) -> String {
        match self {
            AdapterError::NotReady { provider } => {
                format!("No model has been selected for provider '{provider}'.")
            }
            AdapterError::ModelLoad { provider, model, .. } => {
                format!("Model '{model}' could not be loaded from provider '{provider}'.")
            }
            AdapterError::Network { provider, source } => {
                if source.is_connect() {
                    format!("Could not connect to provider '{provider}'.")
                } else if source.is_timeout() {
                    format!("Request to provider '{provider}' timed out.")
                } else {
                    format!("Network error talking to provider '{provider}'.")
                }
            }
            AdapterError::Vendor {
                provider, status, ..
            } => match StatusCode::from_u16(*status) {
                Ok(StatusCode::UNAUTHORIZED) | Ok(StatusCode::FORBIDDEN) => {
                    format!("Provider '{provider}' rejected the API key.")
                }
                Ok(StatusCode::NOT_FOUND) => {
                    format!("Provider '{provider}' does not know the requested resource.")
                }
                Ok(StatusCode::TOO_MANY_REQUESTS) => {
                    format!("Provider '{provider}' is rate limiting requests.")
                }
                Ok(StatusCode::SERVICE_UNAVAILABLE) | Ok(StatusCode::BAD_GATEWAY) => {
                    format!("Provider '{provider}' is currently unavailable.")
                }
                _ => format!("Request to provider '{provider}' failed with status {status}."),
            },
            AdapterError::InvalidResponse { provider, .. } => {
                format!("Provider '{provider}' returned a response that could not be read.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailability_reads_naturally() {
        let err = RegistryError::unavailable(
            "vertex",
            Unavailability::MissingSetting { setting: "project" },
        );
        assert_eq!(
            err.to_string(),
            "provider 'vertex' is unavailable: missing required setting 'project'"
        );
    }

    #[test]
    fn vendor_user_message_hides_body() {
        let err = AdapterError::vendor("openai", StatusCode::UNAUTHORIZED, "secret detail");
        let message = err.user_message();
        assert!(message.contains("rejected the API key"));
        assert!(!message.contains("secret detail"));
    }
}
