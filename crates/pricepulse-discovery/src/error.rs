use thiserror::Error;

/// Errors raised inside the discovery pipeline.
///
/// The public discovery operations recover from all of these locally; they
/// only surface through [`crate::DiscoveryPipeline::ask`] and as the
/// `error_message` of a failed batch item.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Client construction or a request failed inside `reqwest`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The completion endpoint could not be reached (connect, timeout, reset).
    #[error("completion transport failed: {0}")]
    Transport(String),

    /// The completion endpoint answered with a non-success status other than 429.
    #[error("completion API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The completion endpoint answered 429.
    #[error("completion API rate limited the request")]
    RateLimited,

    /// The model's answer could not be turned into the expected records.
    #[error("model output could not be parsed: {0}")]
    MalformedOutput(String),

    /// No API key is configured, so no completion call can be made.
    #[error("completion client is not configured: {0}")]
    NotConfigured(String),

    /// The configured completion endpoint is not a valid URL.
    #[error("invalid completion endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The concurrency gate was closed while waiting for a permit.
    #[error("concurrency gate closed")]
    GateClosed,
}
