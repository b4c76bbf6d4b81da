//! Request-scoped vendor credentials.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use thiserror::Error;

const BEARER_PREFIX: &str = "Bearer ";

/// Why a credential could not be extracted from a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("missing API key")]
    Missing,
    #[error("malformed Authorization header: expected 'Bearer <key>'")]
    Malformed,
}

/// A vendor API key. Lives for one request, prints as `[REDACTED]`.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Extract the raw key from an `Authorization` header value.
    ///
    /// An absent header is [`CredentialError::Missing`]; a header that does
    /// not start with `Bearer ` or carries an empty key is
    /// [`CredentialError::Malformed`].
    pub fn from_authorization(header: Option<&str>) -> Result<Self, CredentialError> {
        let header = header.ok_or(CredentialError::Missing)?;
        let key = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(CredentialError::Malformed)?
            .trim();
        if key.is_empty() {
            return Err(CredentialError::Malformed);
        }
        Ok(Self::new(key))
    }

    /// Only for building the outbound vendor request.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}
