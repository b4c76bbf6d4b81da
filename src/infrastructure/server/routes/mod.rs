pub mod generate;
pub mod models;
pub mod providers;
pub mod tokens;

use super::error::{ApiError, api_error};
use crate::application::DispatchError;
use crate::domain::credential::{Credential, CredentialError};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

/// Pulls the caller's vendor key from `Authorization: Bearer <key>`.
pub(crate) fn credential_from(headers: &HeaderMap) -> Result<Credential, ApiError> {
    let header = match headers.get(AUTHORIZATION) {
        None => None,
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| api_error(DispatchError::Credential(CredentialError::Malformed)))?,
        ),
    };
    Credential::from_authorization(header).map_err(|err| api_error(err.into()))
}
