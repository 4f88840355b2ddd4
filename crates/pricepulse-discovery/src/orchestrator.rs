//! Batch analysis of competitor domains.
//!
//! Each domain is one unit of work: fetch the competitor's site, extract its
//! products, time it. Units run under their own gate, separate from the
//! completion client's, and a unit that errors or panics becomes a failed
//! result instead of taking the batch down.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use futures::FutureExt;
use pricepulse_core::{CompetitorAnalysisResult, DiscoveredProduct};

use crate::cache::{self, CachedValue};
use crate::gate::ConcurrencyGate;
use crate::pipeline::{Discovery, DiscoveryPipeline};
use crate::site_url::domain_to_url;

/// Locale passed to product discovery for competitor sites.
const COMPETITOR_LOCALE: &str = "Unknown";

pub struct AnalysisOrchestrator {
    pipeline: Arc<DiscoveryPipeline>,
    gate: ConcurrencyGate,
}

impl AnalysisOrchestrator {
    /// Creates an orchestrator running at most `capacity` domains at once.
    #[must_use]
    pub fn new(pipeline: Arc<DiscoveryPipeline>, capacity: usize) -> Self {
        Self {
            pipeline,
            gate: ConcurrencyGate::new(capacity),
        }
    }

    #[must_use]
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Analyses every domain and returns one result per input, in input order.
    pub async fn analyze_many(&self, domains: &[String]) -> Vec<CompetitorAnalysisResult> {
        tracing::info!(count = domains.len(), "starting competitor analysis batch");
        let results = join_all(domains.iter().map(|domain| self.isolated_unit(domain))).await;
        let failed = results.iter().filter(|r| !r.success).count();
        tracing::info!(count = results.len(), failed, "competitor analysis batch complete");
        results
    }

    /// Analyses one competitor domain. Successful results are cached for the
    /// competitor TTL; failures and budget fallbacks are not.
    pub async fn analyze_single(&self, domain: &str) -> CompetitorAnalysisResult {
        let key = cache::competitor_products_key(domain);
        let cache = self.pipeline.cache();
        if let Some(cached) = cache.analysis(&key) {
            tracing::debug!(domain, "competitor analysis cache hit");
            return cached;
        }

        let started = Instant::now();
        let outcome = self
            .pipeline
            .extract_products(&domain_to_url(domain), COMPETITOR_LOCALE)
            .await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(Discovery::Found(products)) => {
                let result = CompetitorAnalysisResult::succeeded(domain, products, elapsed_ms);
                tracing::info!(
                    domain,
                    products = result.total_products(),
                    elapsed_ms,
                    "competitor analysed"
                );
                cache.set(
                    key,
                    CachedValue::Analysis(result.clone()),
                    self.pipeline.settings().competitor_ttl,
                );
                result
            }
            Ok(Discovery::Fallback(reason)) => {
                tracing::warn!(domain, %reason, "competitor analysis skipped");
                CompetitorAnalysisResult::succeeded(domain, Vec::new(), elapsed_ms)
            }
            Err(e) => {
                tracing::error!(domain, error = %e, "competitor analysis failed");
                CompetitorAnalysisResult::failed(domain, e.to_string())
            }
        }
    }

    /// Products found on a competitor's site; empty when analysis failed.
    pub async fn competitor_products(&self, domain: &str) -> Vec<DiscoveredProduct> {
        self.analyze_single(domain).await.products
    }

    async fn isolated_unit(&self, domain: &str) -> CompetitorAnalysisResult {
        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => return CompetitorAnalysisResult::failed(domain, e.to_string()),
        };
        match AssertUnwindSafe(self.analyze_single(domain))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(domain, panic = %message, "competitor analysis panicked");
                CompetitorAnalysisResult::failed(domain, format!("analysis panicked: {message}"))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
