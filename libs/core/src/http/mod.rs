use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode};

use crate::config::ClientConfig;

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Request/response exchange used by [`crate::TeamsClient`]. Implementations must be safe to
/// share between concurrent sends.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: Request<Bytes>) -> Result<RawResponse>;
}

#[derive(Clone, Debug)]
pub struct ReqwestHttpClient {
    http: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Builds a client honoring the configured user agent and proxy.
    ///
    /// No request timeout is set here; [`crate::TeamsClient`] bounds each send itself, so a
    /// timeout changed after construction still applies.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(proxy) = config.proxy.as_deref() {
            let proxy =
                reqwest::Proxy::all(proxy).with_context(|| format!("invalid proxy url {proxy}"))?;
            builder = builder.proxy(proxy);
        }
        let http = builder.build().context("failed to build http client")?;
        Ok(Self::new(http))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: Request<Bytes>) -> Result<RawResponse> {
        let (parts, body) = request.into_parts();
        let response = self
            .http
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(body)
            .send()
            .await
            .context("webhook request failed")?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .context("failed to read webhook response body")?;
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
