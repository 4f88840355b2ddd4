//! Rate-limited chat-completion client.
//!
//! [`CompletionClient`] holds a gate permit for the whole of a call,
//! including every retry, so no more than the gate's capacity of calls are
//! ever in flight.

mod transport;

use std::sync::Arc;

use pricepulse_core::AppConfig;

use crate::error::DiscoveryError;
use crate::gate::ConcurrencyGate;
use crate::prompt::prompt_chars;
use crate::retry::{RetryPolicy, RetryingTransport};

pub use transport::{
    ChatMessage, CompletionRequest, CompletionTransport, HttpTransport, ResponseFormat,
};

const EXTRACTOR_SYSTEM_PROMPT: &str =
    "You are a precise data extractor that returns only valid JSON.";

/// Per-call request profile.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub system_prompt: Option<&'static str>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub json_object: bool,
}

impl CompletionOptions {
    /// Product extraction: extractor system message, JSON-object output.
    #[must_use]
    pub fn product_extraction() -> Self {
        Self {
            system_prompt: Some(EXTRACTOR_SYSTEM_PROMPT),
            max_tokens: 4_000,
            temperature: 0.1,
            json_object: true,
        }
    }

    /// Competitor extraction: user message only, shorter answer budget.
    #[must_use]
    pub fn competitor_extraction() -> Self {
        Self {
            system_prompt: None,
            max_tokens: 2_000,
            temperature: 0.1,
            json_object: false,
        }
    }

    /// Free-form completion for ad-hoc prompts.
    #[must_use]
    pub fn raw() -> Self {
        Self {
            system_prompt: None,
            max_tokens: 4_000,
            temperature: 0.1,
            json_object: false,
        }
    }
}

pub struct CompletionClient {
    transport: Arc<dyn CompletionTransport>,
    gate: ConcurrencyGate,
    model: String,
}

impl CompletionClient {
    /// Wraps `transport` as-is. Use [`CompletionClient::with_retry`] to add
    /// back-off.
    #[must_use]
    pub fn new(
        transport: Arc<dyn CompletionTransport>,
        model: impl Into<String>,
        gate: ConcurrencyGate,
    ) -> Self {
        Self {
            transport,
            gate,
            model: model.into(),
        }
    }

    #[must_use]
    pub fn with_retry(
        transport: Arc<dyn CompletionTransport>,
        model: impl Into<String>,
        gate: ConcurrencyGate,
        policy: RetryPolicy,
    ) -> Self {
        Self::new(
            Arc::new(RetryingTransport::new(transport, policy)),
            model,
            gate,
        )
    }

    /// Builds the production client: HTTPS transport, retry policy and
    /// gate capacity all taken from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidEndpoint`] or [`DiscoveryError::Http`]
    /// if the transport cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, DiscoveryError> {
        let transport = HttpTransport::new(
            &config.openai_endpoint,
            config.openai_api_key.clone(),
            config.completion_timeout_secs,
        )?;
        Ok(Self::with_retry(
            Arc::new(transport),
            config.openai_model.clone(),
            ConcurrencyGate::new(config.completion_concurrency),
            RetryPolicy {
                max_retries: config.max_retries,
                backoff_base_ms: config.retry_backoff_base_ms,
            },
        ))
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Sends `prompt` and returns the raw response body.
    ///
    /// # Errors
    ///
    /// Returns the transport's error once retries are exhausted, or
    /// [`DiscoveryError::GateClosed`] if no permit could be obtained.
    pub async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, DiscoveryError> {
        let request = self.request_for(prompt, options);
        let _permit = self.gate.acquire().await?;
        tracing::debug!(
            model = %self.model,
            prompt_chars = prompt_chars(prompt),
            max_tokens = options.max_tokens,
            "sending completion request"
        );
        self.transport.post(&request).await
    }

    fn request_for(&self, prompt: &str, options: &CompletionOptions) -> CompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system_prompt {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));
        CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.json_object.then(ResponseFormat::json_object),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionTransport for Recorder {
        async fn post(&self, request: &CompletionRequest) -> Result<String, DiscoveryError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok("{}".to_owned())
        }
    }

    #[tokio::test]
    async fn product_profile_sends_system_message_and_json_format() {
        let recorder = Arc::new(Recorder::default());
        let client = CompletionClient::new(recorder.clone(), "gpt-4o-mini", ConcurrencyGate::new(5));
        client
            .complete("find products", &CompletionOptions::product_extraction())
            .await
            .unwrap();

        let seen = recorder.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].content, "find products");
        assert_eq!(request.max_tokens, 4_000);
        assert_eq!(request.response_format, Some(ResponseFormat::json_object()));
    }

    #[tokio::test]
    async fn competitor_profile_sends_user_message_only() {
        let recorder = Arc::new(Recorder::default());
        let client = CompletionClient::new(recorder.clone(), "m", ConcurrencyGate::new(5));
        client
            .complete("rivals?", &CompletionOptions::competitor_extraction())
            .await
            .unwrap();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0].messages, vec![ChatMessage::user("rivals?")]);
        assert_eq!(seen[0].max_tokens, 2_000);
        assert!(seen[0].response_format.is_none());
    }

    #[tokio::test]
    async fn permit_is_released_after_call() {
        let client = CompletionClient::new(Arc::new(Recorder::default()), "m", ConcurrencyGate::new(2));
        client.complete("x", &CompletionOptions::raw()).await.unwrap();
        assert_eq!(client.gate().available(), 2);
    }
}
