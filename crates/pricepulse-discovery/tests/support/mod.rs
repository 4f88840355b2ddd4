//! Hand-written page-source and transport doubles shared by the pipeline
//! and orchestrator tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use pricepulse_discovery::{
    CompletionClient, CompletionRequest, CompletionTransport, ConcurrencyGate, DiscoveryError,
    DiscoveryPipeline, PageSource, ResultCache,
};

pub const PRODUCTS_JSON: &str = r#"{"products": [{"productName": "Widget", "ourPrice": 10.00, "competitorPrices": [{"retailerName": "Amazon", "price": 9.50, "url": "https://amazon.com/widget"}]}]}"#;

pub const COMPETITORS_JSON: &str = r#"{"competitor_analysis": {"total_competitors_found": 1, "competitors": [{"company_name": "Rival Co", "website_url": "https://rival.example"}]}}"#;

pub fn completion_body(content: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

/// Serves the same markup for every URL, panicking for URLs containing
/// `panic_on` when set.
#[derive(Default)]
pub struct StaticPages {
    pub html: String,
    pub panic_on: Option<String>,
    pub fetches: AtomicUsize,
}

impl StaticPages {
    pub fn new(html: &str) -> Self {
        Self {
            html: html.to_owned(),
            ..Self::default()
        }
    }

    pub fn panicking_on(html: &str, needle: &str) -> Self {
        Self {
            html: html.to_owned(),
            panic_on: Some(needle.to_owned()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PageSource for StaticPages {
    async fn fetch(&self, url: &str) -> String {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(needle) = &self.panic_on {
            assert!(!url.contains(needle.as_str()), "page source exploded on {url}");
        }
        self.html.clone()
    }
}

type Reply = Box<dyn Fn(&CompletionRequest) -> Result<String, DiscoveryError> + Send + Sync>;

/// Transport answering every request through `reply` and recording prompts.
pub struct ScriptedTransport {
    reply: Reply,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(
        reply: impl Fn(&CompletionRequest) -> Result<String, DiscoveryError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            reply: Box::new(reply),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `content` wrapped in a completion envelope.
    pub fn answering(content: &'static str) -> Self {
        Self::new(move |_| Ok(completion_body(content)))
    }

    /// Answers product prompts with products and everything else with
    /// competitors.
    pub fn by_schema() -> Self {
        Self::new(|request| {
            let wants_products = request
                .messages
                .iter()
                .any(|m| m.content.contains("\"products\""));
            Ok(completion_body(if wants_products {
                PRODUCTS_JSON
            } else {
                COMPETITORS_JSON
            }))
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    async fn post(&self, request: &CompletionRequest) -> Result<String, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(user) = request.messages.iter().rev().find(|m| m.role == "user") {
            self.prompts.lock().unwrap().push(user.content.clone());
        }
        (self.reply)(request)
    }
}

pub fn pipeline(pages: Arc<StaticPages>, transport: Arc<ScriptedTransport>) -> DiscoveryPipeline {
    let completions = CompletionClient::new(transport, "gpt-4o-mini", ConcurrencyGate::new(5));
    DiscoveryPipeline::new(pages, completions, Arc::new(ResultCache::new()))
}
