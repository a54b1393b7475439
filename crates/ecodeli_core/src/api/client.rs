//! REST transport and typed client helpers.
//!
//! # Responsibility
//! - Issue JSON requests against the configured base URL.
//! - Decode list payloads whether paginated or bare.
//!
//! # Invariants
//! - One client-wide timeout; no retry, no backoff.
//! - Transports return raw JSON; typing happens in `ApiClient`.

use crate::api::error::{ApiError, ApiResult};
use crate::api::page::{ListPayload, Page, PageRequest};
use crate::config::ApiConfig;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Minimal JSON transport. `path` is relative to the API base URL.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn get(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value>;
    async fn post(&self, path: &str, body: &Value) -> ApiResult<Value>;
    async fn patch(&self, path: &str, body: &Value) -> ApiResult<Value>;
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: String,
    client: Client,
    bearer_token: Option<String>,
}

impl ReqwestTransport {
    /// Builds a transport with the client-wide timeout of `config`.
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        Url::parse(&config.base_url)
            .map_err(|err| ApiError::InvalidUrl(format!("{}: {err}", config.base_url)))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ApiError::Transport(format!("cannot build http client: {err}")))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            bearer_token: None,
        })
    }

    /// Attaches the access token obtained by the identity flow.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.bearer_token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        self
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|err| ApiError::InvalidUrl(format!("{joined}: {err}")))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        let mut request = self.client.request(method.clone(), self.url(path)?);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        debug!(
            "event=api_request module=api status=start method={} path={}",
            method, path
        );
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(
                "event=api_request module=api status=error method={} path={} http_status={}",
                method,
                path,
                status.as_u16()
            );
            return Err(ApiError::status(status.as_u16(), &text));
        }

        debug!(
            "event=api_request module=api status=ok method={} path={} http_status={}",
            method,
            path,
            status.as_u16()
        );
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value> {
        self.send(Method::GET, path, query, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    async fn patch(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.send(Method::PATCH, path, &[], Some(body)).await
    }
}

/// Typed helpers over any [`ApiTransport`].
#[derive(Debug, Clone)]
pub struct ApiClient<T: ApiTransport> {
    transport: T,
}

impl ApiClient<ReqwestTransport> {
    /// Builds a production client from configuration.
    pub fn from_config(config: &ApiConfig) -> ApiResult<Self> {
        Ok(Self::new(ReqwestTransport::new(config)?))
    }
}

impl<T: ApiTransport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET and decode a single document.
    pub async fn get_json<D: DeserializeOwned>(
        &self,
        path: &str,
        request: &PageRequest,
    ) -> ApiResult<D> {
        let value = self.transport.get(path, &request.to_query()).await?;
        decode(path, value)
    }

    /// GET a list endpoint answering a page envelope or a bare array.
    pub async fn get_list<D: DeserializeOwned>(
        &self,
        path: &str,
        request: &PageRequest,
    ) -> ApiResult<Page<D>> {
        let value = self.transport.get(path, &request.to_query()).await?;
        if value.is_null() {
            return Ok(Page::default());
        }
        let payload: ListPayload<D> = decode(path, value)?;
        Ok(payload.into_page())
    }

    /// GET a detail endpoint; 404 and an empty 2xx body map to `None`.
    pub async fn get_optional<D: DeserializeOwned>(&self, path: &str) -> ApiResult<Option<D>> {
        match self.transport.get(path, &[]).await {
            Ok(value) if value.is_null() => {
                debug!("event=api_request module=api status=empty path={}", path);
                Ok(None)
            }
            Ok(value) => decode(path, value).map(Some),
            Err(err) if err.is_not_found() => {
                debug!("event=api_request module=api status=not_found path={}", path);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn post_json<B: Serialize, D: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<D> {
        let body = serde_json::to_value(body)?;
        let value = self.transport.post(path, &body).await?;
        decode(path, value)
    }

    pub async fn patch_json<B: Serialize, D: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<D> {
        let body = serde_json::to_value(body)?;
        let value = self.transport.patch(path, &body).await?;
        decode(path, value)
    }
}

fn decode<D: DeserializeOwned>(path: &str, value: Value) -> ApiResult<D> {
    serde_json::from_value(value).map_err(|err| {
        warn!(
            "event=api_decode module=api status=error path={} reason={}",
            path, err
        );
        ApiError::Decode(err.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::ReqwestTransport;
    use crate::api::error::ApiError;
    use crate::config::ApiConfig;
    use std::time::Duration;

    #[test]
    fn transport_rejects_unparsable_base_url() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            timeout: Duration::from_secs(1),
        };
        let error = ReqwestTransport::new(&config).expect_err("invalid base url");
        assert!(matches!(error, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn url_joins_base_and_relative_path() {
        let transport = ReqwestTransport::new(&ApiConfig::default()).expect("default config");
        let url = transport.url("/admin/invoices").expect("joined url");
        assert_eq!(url.as_str(), "http://localhost:3002/api/v1/admin/invoices");
    }

    #[test]
    fn blank_bearer_token_is_ignored() {
        let transport = ReqwestTransport::new(&ApiConfig::default())
            .expect("default config")
            .with_bearer_token("  ");
        assert!(transport.bearer_token.is_none());
    }
}
