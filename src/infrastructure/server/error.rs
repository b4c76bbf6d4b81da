use super::dto::ErrorResponse;
use crate::application::DispatchError;
use axum::Json;
use axum::http::StatusCode;
use std::net::SocketAddr;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind HTTP listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP server error: {0}")]
    Serve(#[from] std::io::Error),
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn status_for(err: &DispatchError) -> StatusCode {
    match err {
        DispatchError::Credential(_) => StatusCode::UNAUTHORIZED,
        DispatchError::InvalidProvider { .. }
        | DispatchError::InvalidModel { .. }
        | DispatchError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        DispatchError::AdapterUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DispatchError::Generation(_) => StatusCode::BAD_GATEWAY,
    }
}

pub(crate) fn api_error(err: DispatchError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(%err, kind = err.kind(), "Request failed");
    } else {
        warn!(%err, kind = err.kind(), "Request rejected");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            kind: err.kind().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credential::CredentialError;
    use crate::infrastructure::provider::{AdapterError, Unavailability};

    #[test]
    fn maps_each_class_to_status() {
        assert_eq!(
            status_for(&DispatchError::Credential(CredentialError::Missing)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&DispatchError::InvalidModel {
                provider: "openai".into(),
                model: "x".into(),
                note: None
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&DispatchError::AdapterUnavailable {
                provider: "ibm".into(),
                reason: Unavailability::Disabled
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&DispatchError::Generation(AdapterError::not_ready("openai"))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn generation_error_body_hides_vendor_detail() {
        let err = DispatchError::Generation(AdapterError::vendor(
            "openai",
            StatusCode::INTERNAL_SERVER_ERROR,
            "stack trace from vendor",
        ));
        let (status, Json(body)) = api_error(err);
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.kind, "generation_failed");
        assert!(!body.error.contains("stack trace"));
    }
}
