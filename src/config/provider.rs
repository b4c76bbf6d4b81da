//! # Provider Settings
//!
//! Deployment-level knobs for individual vendor integrations. None of these
//! carry credentials: API keys always arrive with the request.
//!
//! | Key | Used by | Meaning |
//! |-----|---------|---------|
//! | `enabled` | all | `false` makes the provider report itself unavailable |
//! | `endpoint` | all | replaces every base URL the adapter talks to |
//! | `region` | aws | Bedrock region (default `us-east-1`) |
//! | `project` | vertex, ibm | GCP project / watsonx project id (required) |
//! | `location` | vertex | GCP location (default `us-central1`) |
//! | `api_version` | azure, ibm | API version query parameter |
//! | `models` | azure, vertex | models to advertise where the vendor has no listing endpoint |
//!
//! # Example
//!
//! ```toml
//! [providers.databricks]
//! endpoint = "https://${DATABRICKS_HOST}"
//!
//! [providers.nvidia]
//! enabled = false
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            region: None,
            project: None,
            location: None,
            api_version: None,
            models: Vec::new(),
        }
    }
}

impl ProviderSettings {
    /// Configured endpoint without a trailing slash, or `default`.
    pub fn endpoint_or(&self, default: &str) -> String {
        self.endpoint
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawProviderSettings {
    #[serde(default)]
    enabled: Option<bool>,
    endpoint: Option<String>,
    region: Option<String>,
    project: Option<String>,
    location: Option<String>,
    api_version: Option<String>,
    #[serde(default)]
    models: Vec<String>,
}

impl From<RawProviderSettings> for ProviderSettings {
    fn from(raw: RawProviderSettings) -> Self {
        let expand = |s: String| -> String {
            shellexpand::full(&s)
                .map(|cow| cow.into_owned())
                .unwrap_or(s)
        };
        let non_empty = |s: String| {
            let trimmed = s.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        };

        Self {
            enabled: raw.enabled.unwrap_or(true),
            endpoint: raw.endpoint.map(expand).and_then(non_empty),
            region: raw.region.map(expand).and_then(non_empty),
            project: raw.project.map(expand).and_then(non_empty),
            location: raw.location.map(expand).and_then(non_empty),
            api_version: raw.api_version.and_then(non_empty),
            models: raw.models.into_iter().filter_map(non_empty).collect(),
        }
    }
}
