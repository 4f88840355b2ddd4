//! LLM-backed product and competitor discovery for `PricePulse`.
//!
//! Fetches a company's website, asks a chat-completions model to extract
//! products with retailer prices (or the company's competitors), and repairs
//! and parses the answer into typed records. Paid calls are rate limited,
//! retried with back-off, cached and capped by a daily budget that degrades
//! to a fallback data set.

pub mod cache;
pub mod completion;
pub mod cost_guard;
pub mod error;
pub mod fetch;
pub mod gate;
pub mod orchestrator;
pub mod parse;
pub mod pipeline;
pub mod prompt;
pub mod retry;

mod site_url;

pub use cache::{CachedValue, ResultCache};
pub use completion::{
    ChatMessage, CompletionClient, CompletionOptions, CompletionRequest, CompletionTransport,
    HttpTransport,
};
pub use cost_guard::{CostGuard, FallbackReason, Verdict};
pub use error::DiscoveryError;
pub use fetch::{HttpPageFetcher, PageSource};
pub use gate::ConcurrencyGate;
pub use orchestrator::AnalysisOrchestrator;
pub use parse::{parse_content, parse_envelope, CompetitorCatalog, ParseOutcome, ProductCatalog};
pub use pipeline::{DiscoveryPipeline, PipelineSettings};
pub use prompt::{PromptBuilder, PromptKind};
pub use retry::{RetryPolicy, RetryingTransport};
pub use site_url::{domain_to_url, normalize_site_url};
