//! Base HTTP client with shared logic

use crate::domain::credential::Credential;
use crate::domain::types::{ModelId, ProviderKey};
use crate::infrastructure::provider::error::AdapterError;
use crate::infrastructure::provider::factory::AdapterContext;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// How the caller's credential is attached to outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    Header(&'static str),
    None,
}

/// Base HTTP client with shared functionality
#[derive(Clone)]
pub struct HttpClientBase {
    pub provider: ProviderKey,
    pub endpoint: String,
    pub system_prompt: String,
    pub model: Option<ModelId>,
    auth: AuthScheme,
    credential: Credential,
    http: Client,
    listing_timeout: Duration,
    generation_timeout: Option<Duration>,
}

impl HttpClientBase {
    /// `default_endpoint` is used unless the provider's `endpoint` setting overrides it.
    pub fn new(ctx: &AdapterContext, default_endpoint: &str, auth: AuthScheme) -> Self {
        Self {
            provider: ctx.provider.clone(),
            endpoint: ctx.settings.endpoint_or(default_endpoint),
            system_prompt: ctx.runtime.system_prompt.clone(),
            model: None,
            auth,
            credential: ctx.credential.clone(),
            http: ctx.runtime.http.clone(),
            listing_timeout: ctx.runtime.listing_timeout,
            generation_timeout: ctx.runtime.generation_timeout,
        }
    }

    pub fn id(&self) -> &str {
        self.provider.as_str()
    }

    /// Build URL from endpoint and path
    pub fn build_url(&self, path: &str) -> String {
        join_url(&self.endpoint, path)
    }

    pub fn require_model(&self) -> Result<&ModelId, AdapterError> {
        self.model
            .as_ref()
            .ok_or_else(|| AdapterError::not_ready(self.id()))
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.authorize(self.http.get(url))
    }

    pub fn post<Req: Serialize + ?Sized>(&self, url: &str, body: &Req) -> RequestBuilder {
        self.authorize(self.http.post(url).json(body))
    }

    /// Send a listing or metadata request, bounded by the listing timeout.
    pub async fn fetch<Res: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Res, AdapterError> {
        self.send(request.timeout(self.listing_timeout)).await
    }

    /// Send a generation request, bounded only if a generation timeout is configured.
    pub async fn generate<Res: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Res, AdapterError> {
        let request = match self.generation_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        };
        self.send(request).await
    }

    async fn send<Res: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Res, AdapterError> {
        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::network(self.id(), e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::network(self.id(), e))?;
        if !status.is_success() {
            return Err(AdapterError::vendor(self.id(), status, body));
        }
        serde_json::from_str(&body)
            .map_err(|e| AdapterError::invalid_response(self.id(), e.to_string()))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth {
            AuthScheme::Bearer => request.bearer_auth(self.credential.expose()),
            AuthScheme::Header(name) => request.header(name, self.credential.expose()),
            AuthScheme::None => request,
        }
    }
}

/// Vendor token counts arrive as `u64`; saturate on narrower targets.
pub fn token_count(count: u64) -> usize {
    usize::try_from(count).unwrap_or(usize::MAX)
}

pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use mockito::Server;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://h/", "/v1/models"), "http://h/v1/models");
        assert_eq!(join_url("http://h", "v1/models"), "http://h/v1/models");
    }

    #[test]
    fn token_count_saturates() {
        assert_eq!(token_count(14), 14);
        assert_eq!(token_count(u64::MAX), usize::MAX);
    }

    #[test]
    fn require_model_fails_before_selection() {
        let base = HttpClientBase::new(&context("openai", Default::default()), "http://h", AuthScheme::Bearer);
        assert!(matches!(base.require_model(), Err(AdapterError::NotReady { .. })));
    }

    #[tokio::test]
    async fn non_success_status_becomes_vendor_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/models")
            .match_header("authorization", "Bearer sk-test")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let base = HttpClientBase::new(&context_at("openai", &server.url()), "unused", AuthScheme::Bearer);
        let result: Result<serde_json::Value, _> =
            base.fetch(base.get(&base.build_url("/v1/models"))).await;

        mock.assert_async().await;
        match result {
            Err(AdapterError::Vendor { status, body, .. }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn header_auth_uses_named_header() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/ping")
            .match_header("x-api-key", "sk-test")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let base = HttpClientBase::new(
            &context_at("anthropic", &server.url()),
            "unused",
            AuthScheme::Header("x-api-key"),
        );
        let result: Result<serde_json::Value, _> = base.fetch(base.get(&base.build_url("/ping"))).await;

        mock.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/ping")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let base = HttpClientBase::new(&context_at("openai", &server.url()), "unused", AuthScheme::Bearer);
        let result: Result<serde_json::Value, _> = base.fetch(base.get(&base.build_url("/ping"))).await;
        assert!(matches!(result, Err(AdapterError::InvalidResponse { .. })));
    }
}
