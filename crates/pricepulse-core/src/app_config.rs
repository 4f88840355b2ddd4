use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_endpoint: String,
    pub log_level: String,
    pub default_locale: String,
    pub fetch_timeout_secs: u64,
    pub completion_timeout_secs: u64,
    pub completion_concurrency: usize,
    pub analysis_concurrency: usize,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub daily_call_ceiling: u32,
    pub max_prompt_chars: usize,
    pub product_cache_ttl_secs: u64,
    pub competitor_cache_ttl_secs: u64,
    pub fallback_catalog_path: Option<PathBuf>,
    pub competitor_prompt_path: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_model", &self.openai_model)
            .field("openai_endpoint", &self.openai_endpoint)
            .field("log_level", &self.log_level)
            .field("default_locale", &self.default_locale)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("completion_timeout_secs", &self.completion_timeout_secs)
            .field("completion_concurrency", &self.completion_concurrency)
            .field("analysis_concurrency", &self.analysis_concurrency)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("daily_call_ceiling", &self.daily_call_ceiling)
            .field("max_prompt_chars", &self.max_prompt_chars)
            .field("product_cache_ttl_secs", &self.product_cache_ttl_secs)
            .field("competitor_cache_ttl_secs", &self.competitor_cache_ttl_secs)
            .field("fallback_catalog_path", &self.fallback_catalog_path)
            .field("competitor_prompt_path", &self.competitor_prompt_path)
            .finish()
    }
}
