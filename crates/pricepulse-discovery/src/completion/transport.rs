use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;

use crate::error::DiscoveryError;

/// Chat-completions request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Asks the endpoint to constrain output to a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ResponseFormat {
    #[must_use]
    pub fn json_object() -> Self {
        Self {
            kind: "json_object",
        }
    }
}

/// One request/response exchange with a completion endpoint.
///
/// Implementations return the raw response body on a 2xx answer.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn post(&self, request: &CompletionRequest) -> Result<String, DiscoveryError>;
}

/// [`CompletionTransport`] that POSTs JSON over HTTPS with bearer auth.
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Creates a transport for `endpoint`.
    ///
    /// A missing `api_key` is accepted here; every call made through the
    /// transport then fails with [`DiscoveryError::NotConfigured`].
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidEndpoint`] if `endpoint` is not an
    /// absolute URL, or [`DiscoveryError::Http`] if the `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, DiscoveryError> {
        let endpoint = Url::parse(endpoint).map_err(|e| DiscoveryError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("pricepulse/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn post(&self, request: &CompletionRequest) -> Result<String, DiscoveryError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(DiscoveryError::NotConfigured(
                "OPENAI_API_KEY is not set".to_owned(),
            ));
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(DiscoveryError::RateLimited);
        }
        let body = response.text().await.map_err(classify_send_error)?;
        if !status.is_success() {
            return Err(DiscoveryError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn classify_send_error(err: reqwest::Error) -> DiscoveryError {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        DiscoveryError::Transport(err.to_string())
    } else {
        DiscoveryError::Http(err)
    }
}
