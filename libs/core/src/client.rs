use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{Method, Request, StatusCode};
use thiserror::Error;
use url::Url;

use crate::config::ClientConfig;
use crate::error::CardError;
use crate::http::{HttpClient, RawResponse, ReqwestHttpClient};
use crate::message::Message;
use crate::validate::{PatternError, WebhookUrlValidator};

/// Body Teams returns when an incoming webhook accepted the payload.
pub const EXPECTED_RESPONSE_TEXT: &str = "1";

const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("webhook url for {host} does not match any accepted pattern")]
    WebhookUrlUnexpected { host: String },
    #[error(transparent)]
    InvalidMessage(#[from] CardError),
    #[error("webhook transport error: {0}")]
    Transport(#[source] anyhow::Error),
    #[error("webhook request timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected webhook response: status={status} body={body:?}")]
    WebhookResponseUnexpected { status: StatusCode, body: String },
}

/// Posts prepared messages to Teams incoming webhooks.
///
/// One request per [`TeamsClient::send`]; nothing is retried.
pub struct TeamsClient {
    http: Arc<dyn HttpClient>,
    /// Proxy the reqwest transport was built with; `None` for a caller-supplied transport.
    managed_proxy: Option<Option<String>>,
    validator: WebhookUrlValidator,
    skip_url_validation: bool,
    user_agent: String,
    timeout: Duration,
}

impl TeamsClient {
    /// A client with default settings over a reqwest transport.
    pub fn new() -> anyhow::Result<Self> {
        Self::from_config(&ClientConfig::default())
    }

    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let http = ReqwestHttpClient::from_config(config)?;
        let mut client = Self::with_http_client(Arc::new(http));
        client.managed_proxy = Some(config.proxy.clone());
        client.apply_config(config)?;
        Ok(client)
    }

    /// A client over a caller-supplied transport with default settings.
    pub fn with_http_client(http: Arc<dyn HttpClient>) -> Self {
        let config = ClientConfig::default();
        Self {
            http,
            managed_proxy: None,
            validator: WebhookUrlValidator::default(),
            skip_url_validation: config.skip_url_validation,
            user_agent: config.user_agent,
            timeout: config.timeout,
        }
    }

    /// Copies settings from `config`.
    ///
    /// A reqwest transport built by this client is rebuilt when the proxy changes. A
    /// caller-supplied transport is kept as-is, so its proxy stays the caller's concern.
    pub fn apply_config(&mut self, config: &ClientConfig) -> anyhow::Result<()> {
        let mut validator = self.validator.clone();
        if config.replace_default_patterns {
            validator.clear();
        }
        validator.add_patterns(&config.url_patterns)?;

        if let Some(proxy) = &self.managed_proxy {
            if *proxy != config.proxy {
                self.http = Arc::new(ReqwestHttpClient::from_config(config)?);
                self.managed_proxy = Some(config.proxy.clone());
                tracing::debug!(proxy = config.proxy.is_some(), "webhook transport rebuilt");
            }
        }

        self.validator = validator;
        self.skip_url_validation = config.skip_url_validation;
        self.user_agent = config.user_agent.clone();
        self.timeout = config.timeout;
        Ok(())
    }

    pub fn add_webhook_url_validation_patterns<I, S>(
        &mut self,
        patterns: I,
    ) -> Result<&mut Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.validator.add_patterns(patterns)?;
        Ok(self)
    }

    pub fn clear_webhook_url_validation_patterns(&mut self) -> &mut Self {
        self.validator.clear();
        self
    }

    /// When set, any URL string is forwarded to the transport as-is.
    pub fn skip_webhook_url_validation_on_send(&mut self, skip: bool) -> &mut Self {
        self.skip_url_validation = skip;
        self
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) -> &mut Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn validator(&self) -> &WebhookUrlValidator {
        &self.validator
    }

    pub fn validate_webhook(&self, webhook_url: &str) -> Result<(), SendError> {
        if self.validator.validate(webhook_url) {
            return Ok(());
        }
        let host = host_of(webhook_url);
        tracing::debug!(host = %host, "webhook url rejected by validation patterns");
        Err(SendError::WebhookUrlUnexpected { host })
    }

    /// Validates the URL, prepares `message` if needed, posts it and checks the acknowledgement.
    ///
    /// Validation and preparation failures happen before any request is made.
    pub async fn send(&self, webhook_url: &str, message: &mut Message) -> Result<(), SendError> {
        if self.skip_url_validation {
            tracing::debug!("webhook url validation skipped");
        } else {
            self.validate_webhook(webhook_url)?;
        }

        let payload = message.prepare()?;
        let request = self.build_request(webhook_url, payload)?;

        let host = host_of(webhook_url);
        let response = match tokio::time::timeout(self.timeout, self.http.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                tracing::warn!(host = %host, error = %err, "webhook transport failed");
                return Err(SendError::Transport(err));
            }
            Err(_) => {
                tracing::warn!(host = %host, timeout = ?self.timeout, "webhook request timed out");
                return Err(SendError::Timeout(self.timeout));
            }
        };

        check_response(&response).inspect_err(|err| {
            tracing::warn!(host = %host, error = %err, "webhook rejected message");
        })?;
        tracing::info!(host = %host, status = %response.status, "webhook message delivered");
        Ok(())
    }

    fn build_request(
        &self,
        webhook_url: &str,
        payload: Bytes,
    ) -> Result<Request<Bytes>, SendError> {
        Request::builder()
            .method(Method::POST)
            .uri(webhook_url)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, self.user_agent.as_str())
            .body(payload)
            .map_err(|err| {
                SendError::Transport(anyhow::Error::new(err).context("invalid webhook request"))
            })
    }
}

/// Success is a 2xx status whose body is exactly [`EXPECTED_RESPONSE_TEXT`].
pub fn check_response(response: &RawResponse) -> Result<(), SendError> {
    let body = String::from_utf8_lossy(&response.body);
    if response.status.is_success() && body == EXPECTED_RESPONSE_TEXT {
        return Ok(());
    }
    Err(SendError::WebhookResponseUnexpected {
        status: response.status,
        body: truncate(&body, BODY_PREVIEW_LIMIT).to_string(),
    })
}

fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// The part of a webhook URL safe to log; the path carries the channel token.
fn host_of(webhook_url: &str) -> String {
    Url::parse(webhook_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "<unparseable>".to_string())
}
