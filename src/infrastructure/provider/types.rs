//! Model listing types

use super::error::AdapterError;
use crate::domain::types::ModelId;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Optional narrowing of a model listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFilter {
    /// Case-insensitive substring match on the model id.
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl ModelFilter {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, model: &str) -> bool {
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                model.to_lowercase().contains(&term.to_lowercase())
            }
            _ => true,
        }
    }

    fn apply(&self, models: Vec<String>) -> Vec<String> {
        let limit = self.limit.unwrap_or(usize::MAX);
        models
            .into_iter()
            .filter(|model| self.matches(model))
            .take(limit)
            .collect()
    }
}

/// Outcome of asking a vendor which models it offers.
///
/// Listing never fails outright: vendor trouble becomes [`ModelListing::Degraded`],
/// vendors without a listing endpoint report [`ModelListing::Unlisted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelListing {
    Available(Vec<String>),
    Unlisted { note: String },
    Degraded { reason: String, fallback: Vec<String> },
}

impl ModelListing {
    pub fn unlisted(note: impl Into<String>) -> Self {
        Self::Unlisted { note: note.into() }
    }

    /// Turns a raw listing attempt into a listing, logging and degrading on error.
    pub fn settle(
        provider: &str,
        result: Result<Vec<String>, AdapterError>,
        fallback: &[&str],
    ) -> Self {
        match result {
            Ok(models) => Self::Available(models),
            Err(err) => {
                warn!(provider, error = %err, "Failed to list models; using fallback");
                Self::Degraded {
                    reason: err.user_message(),
                    fallback: fallback.iter().map(|m| m.to_string()).collect(),
                }
            }
        }
    }

    /// Models a caller may select. Empty for unlisted vendors.
    pub fn models(&self) -> &[String] {
        match self {
            Self::Available(models) => models,
            Self::Unlisted { .. } => &[],
            Self::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn contains(&self, model: &ModelId) -> bool {
        self.models().iter().any(|m| m == model.as_str())
    }

    /// Explanation attached to an unlisted or degraded listing.
    pub fn note(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unlisted { note } => Some(note),
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Available(_) => "available",
            Self::Unlisted { .. } => "unlisted",
            Self::Degraded { .. } => "degraded",
        }
    }

    /// Applies `filter` locally, for vendors whose listing API cannot.
    pub fn narrow(self, filter: Option<&ModelFilter>) -> Self {
        let Some(filter) = filter else {
            return self;
        };
        match self {
            Self::Available(models) => Self::Available(filter.apply(models)),
            Self::Degraded { reason, fallback } => Self::Degraded {
                reason,
                fallback: filter.apply(fallback),
            },
            unlisted => unlisted,
        }
    }

    pub fn into_models(self) -> Vec<String> {
        match self {
            Self::Available(models) => models,
            Self::Unlisted { .. } => Vec::new(),
            Self::Degraded { fallback, .. } => fallback,
        }
    }
}
