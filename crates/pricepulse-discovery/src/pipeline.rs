//! End-to-end discovery: cache, budget, fetch, prompt, complete, parse.
//!
//! The public `discover_*` operations never fail. Fetch problems, transport
//! errors and unparseable output all end in an empty list; budget trips and
//! 429s end in the fallback data set. Only [`DiscoveryPipeline::ask`] and
//! [`DiscoveryPipeline::try_discover_products`] surface errors.

use std::sync::Arc;
use std::time::Duration;

use pricepulse_core::{AppConfig, DiscoveredCompetitor, DiscoveredProduct, FallbackCatalog};

use crate::cache::{self, CachedValue, ResultCache};
use crate::completion::{CompletionClient, CompletionOptions};
use crate::cost_guard::{CostGuard, FallbackReason, Verdict};
use crate::error::DiscoveryError;
use crate::fetch::{HttpPageFetcher, PageSource};
use crate::parse::{self, CompetitorCatalog, ExtractionSchema, ParseOutcome, ProductCatalog};
use crate::prompt::{prompt_chars, PromptBuilder, PromptKind};
use crate::site_url::normalize_site_url;

const DEFAULT_DAILY_CALL_CEILING: u32 = 10;
const DEFAULT_MAX_PROMPT_CHARS: usize = 150_000;

/// Cache lifetimes and the locale used when a caller passes none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub product_ttl: Duration,
    pub competitor_ttl: Duration,
    pub default_locale: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            product_ttl: cache::PRODUCT_TTL,
            competitor_ttl: cache::COMPETITOR_TTL,
            default_locale: "United States".to_owned(),
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            product_ttl: Duration::from_secs(config.product_cache_ttl_secs),
            competitor_ttl: Duration::from_secs(config.competitor_cache_ttl_secs),
            default_locale: config.default_locale.clone(),
        }
    }
}

/// Result of one extraction before fallback data is substituted.
pub(crate) enum Discovery<T> {
    Found(Vec<T>),
    Fallback(FallbackReason),
}

/// Record types the pipeline can store in the [`ResultCache`].
trait Cacheable: Sized + Clone {
    fn into_cached(items: Vec<Self>) -> CachedValue;
    fn from_cache(cache: &ResultCache, key: &str) -> Option<Vec<Self>>;
}

impl Cacheable for DiscoveredProduct {
    fn into_cached(items: Vec<Self>) -> CachedValue {
        CachedValue::Products(items)
    }

    fn from_cache(cache: &ResultCache, key: &str) -> Option<Vec<Self>> {
        cache.products(key)
    }
}

impl Cacheable for DiscoveredCompetitor {
    fn into_cached(items: Vec<Self>) -> CachedValue {
        CachedValue::Competitors(items)
    }

    fn from_cache(cache: &ResultCache, key: &str) -> Option<Vec<Self>> {
        cache.competitors(key)
    }
}

/// One extraction request, fully resolved.
struct Extraction<'a> {
    kind: PromptKind<'a>,
    url: &'a str,
    locale: &'a str,
    cache_key: String,
    ttl: Duration,
    options: CompletionOptions,
}

pub struct DiscoveryPipeline {
    pages: Arc<dyn PageSource>,
    completions: CompletionClient,
    prompts: PromptBuilder,
    cache: Arc<ResultCache>,
    guard: CostGuard,
    fallback: FallbackCatalog,
    settings: PipelineSettings,
}

impl DiscoveryPipeline {
    /// Assembles a pipeline with the built-in prompts, fallback data set and
    /// a daily ceiling of 10 calls. Use the `with_*` methods to adjust.
    #[must_use]
    pub fn new(
        pages: Arc<dyn PageSource>,
        completions: CompletionClient,
        cache: Arc<ResultCache>,
    ) -> Self {
        let guard = CostGuard::new(
            Arc::clone(&cache),
            DEFAULT_DAILY_CALL_CEILING,
            DEFAULT_MAX_PROMPT_CHARS,
        );
        Self {
            pages,
            completions,
            prompts: PromptBuilder::new(),
            cache,
            guard,
            fallback: FallbackCatalog::builtin(),
            settings: PipelineSettings::default(),
        }
    }

    /// Builds the production pipeline from environment configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] if either HTTP client cannot be built or
    /// the completion endpoint is not a valid URL.
    pub fn from_config(config: &AppConfig) -> Result<Self, DiscoveryError> {
        let pages = HttpPageFetcher::new(config.fetch_timeout_secs)?;
        let completions = CompletionClient::from_config(config)?;
        Ok(Self::new(Arc::new(pages), completions, Arc::new(ResultCache::new()))
            .with_budget(config.daily_call_ceiling, config.max_prompt_chars)
            .with_settings(PipelineSettings::from_config(config)))
    }

    #[must_use]
    pub fn with_budget(mut self, daily_call_ceiling: u32, max_prompt_chars: usize) -> Self {
        self.guard = CostGuard::new(Arc::clone(&self.cache), daily_call_ceiling, max_prompt_chars);
        self
    }

    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackCatalog) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    #[must_use]
    pub fn cost_guard(&self) -> &CostGuard {
        &self.guard
    }

    /// Products on `url` with competitor prices in `locale`.
    pub async fn discover_products(&self, url: &str, locale: &str) -> Vec<DiscoveredProduct> {
        self.try_discover_products(url, locale)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(url, error = %e, "product discovery failed");
                Vec::new()
            })
    }

    /// Like [`Self::discover_products`] but surfaces transport and parse
    /// failures. Budget fallbacks still resolve to an empty list.
    ///
    /// # Errors
    ///
    /// Returns the completion error once retries are exhausted, or
    /// [`DiscoveryError::MalformedOutput`] if the answer could not be parsed.
    pub async fn try_discover_products(
        &self,
        url: &str,
        locale: &str,
    ) -> Result<Vec<DiscoveredProduct>, DiscoveryError> {
        match self.extract_products(url, locale).await? {
            Discovery::Found(products) => Ok(products),
            Discovery::Fallback(_) => Ok(Vec::new()),
        }
    }

    pub(crate) async fn extract_products(
        &self,
        url: &str,
        locale: &str,
    ) -> Result<Discovery<DiscoveredProduct>, DiscoveryError> {
        let url = normalize_site_url(url);
        let locale = self.locale_or_default(locale);
        let job = Extraction {
            kind: PromptKind::ProductDiscovery,
            url: &url,
            locale,
            cache_key: cache::products_key(&url, locale),
            ttl: self.settings.product_ttl,
            options: CompletionOptions::product_extraction(),
        };
        self.extract::<ProductCatalog>(job).await
    }

    /// Product discovery steered by free-form `modification` instructions.
    pub async fn discover_products_with_modification(
        &self,
        url: &str,
        locale: &str,
        modification: &str,
    ) -> Vec<DiscoveredProduct> {
        let url = normalize_site_url(url);
        let locale = self.locale_or_default(locale);
        let job = Extraction {
            kind: PromptKind::ModifiedProductDiscovery { modification },
            url: &url,
            locale,
            cache_key: cache::modified_products_key(&url, locale, modification),
            ttl: self.settings.product_ttl,
            options: CompletionOptions::product_extraction(),
        };
        match self.extract::<ProductCatalog>(job).await {
            Ok(Discovery::Found(products)) => products,
            Ok(Discovery::Fallback(_)) => Vec::new(),
            Err(e) => {
                tracing::error!(url = %url, error = %e, "modified product discovery failed");
                Vec::new()
            }
        }
    }

    /// Competitors of the company behind `url`, operating in `locale`.
    ///
    /// Falls back to the curated data set when the budget is exhausted, the
    /// prompt is too large or the API rate-limits the call.
    pub async fn discover_competitors(&self, url: &str, locale: &str) -> Vec<DiscoveredCompetitor> {
        let url = normalize_site_url(url);
        let locale = self.locale_or_default(locale);
        let job = Extraction {
            kind: PromptKind::CompetitorDiscovery,
            url: &url,
            locale,
            cache_key: cache::competitors_key(&url, locale),
            ttl: self.settings.competitor_ttl,
            options: CompletionOptions::competitor_extraction(),
        };
        match self.extract::<CompetitorCatalog>(job).await {
            Ok(Discovery::Found(competitors)) => competitors,
            Ok(Discovery::Fallback(_)) => self.fallback.competitors_for(&url),
            Err(e) => {
                tracing::error!(url = %url, error = %e, "competitor discovery failed");
                Vec::new()
            }
        }
    }

    /// Sends `prompt` as-is and returns the assistant's reply text.
    ///
    /// # Errors
    ///
    /// Returns the completion error once retries are exhausted, or
    /// [`DiscoveryError::MalformedOutput`] if the response carries no message.
    pub async fn ask(&self, prompt: &str) -> Result<String, DiscoveryError> {
        let envelope = self.completions.complete(prompt, &CompletionOptions::raw()).await?;
        self.guard.record_call();
        parse::extract_message_content(&envelope).map_err(DiscoveryError::MalformedOutput)
    }

    fn locale_or_default<'a>(&'a self, locale: &'a str) -> &'a str {
        if locale.trim().is_empty() {
            &self.settings.default_locale
        } else {
            locale
        }
    }

    async fn extract<S>(&self, job: Extraction<'_>) -> Result<Discovery<S::Item>, DiscoveryError>
    where
        S: ExtractionSchema,
        S::Item: Cacheable,
    {
        if let Some(items) = <S::Item as Cacheable>::from_cache(&self.cache, &job.cache_key) {
            tracing::debug!(key = %job.cache_key, count = items.len(), "cache hit");
            return Ok(Discovery::Found(items));
        }

        if let Verdict::Fallback(reason) = self.guard.check_budget() {
            tracing::warn!(url = job.url, %reason, "serving fallback data");
            return Ok(Discovery::Fallback(reason));
        }

        let html = self.pages.fetch(job.url).await;
        let prompt = self.prompts.build(job.kind, job.url, job.locale, &html);

        if let Verdict::Fallback(reason) = self.guard.should_proceed(prompt_chars(&prompt)) {
            tracing::warn!(url = job.url, %reason, "serving fallback data");
            return Ok(Discovery::Fallback(reason));
        }

        let envelope = match self.completions.complete(&prompt, &job.options).await {
            Ok(envelope) => envelope,
            Err(DiscoveryError::RateLimited) => {
                let reason = FallbackReason::RateLimited;
                tracing::warn!(url = job.url, %reason, "serving fallback data");
                return Ok(Discovery::Fallback(reason));
            }
            Err(e) => return Err(e),
        };
        self.guard.record_call();

        match parse::parse_envelope::<S>(&envelope) {
            ParseOutcome::Parsed(items) => {
                tracing::info!(
                    url = job.url,
                    schema = S::NAME,
                    count = items.len(),
                    "extraction complete"
                );
                self.cache
                    .set(job.cache_key, <S::Item as Cacheable>::into_cached(items.clone()), job.ttl);
                Ok(Discovery::Found(items))
            }
            ParseOutcome::Failed { reason, .. } => Err(DiscoveryError::MalformedOutput(reason)),
        }
    }
}
