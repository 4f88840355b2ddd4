use std::path::{Path, PathBuf};

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Read a prompt template override from disk.
///
/// # Errors
///
/// Returns [`ConfigError::FileIo`] if the file cannot be read, or
/// [`ConfigError::Validation`] if it is blank.
pub fn load_prompt_template(path: &Path) -> Result<String, ConfigError> {
    let template = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    if template.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "prompt template {} is empty",
            path.display()
        )));
    }
    Ok(template)
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let openai_api_key = optional("OPENAI_API_KEY");
    let openai_model = or_default("PRICEPULSE_OPENAI_MODEL", "gpt-4o-mini");
    let openai_endpoint = or_default(
        "PRICEPULSE_OPENAI_ENDPOINT",
        "https://api.openai.com/v1/chat/completions",
    );
    let log_level = or_default("PRICEPULSE_LOG_LEVEL", "info");
    let default_locale = or_default("PRICEPULSE_DEFAULT_LOCALE", "United States");

    let fetch_timeout_secs = parse_u64("PRICEPULSE_FETCH_TIMEOUT_SECS", "60")?;
    let completion_timeout_secs = parse_u64("PRICEPULSE_COMPLETION_TIMEOUT_SECS", "120")?;
    let completion_concurrency = parse_usize("PRICEPULSE_COMPLETION_CONCURRENCY", "5")?;
    let analysis_concurrency = parse_usize("PRICEPULSE_ANALYSIS_CONCURRENCY", "3")?;
    let max_retries = parse_u32("PRICEPULSE_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("PRICEPULSE_RETRY_BACKOFF_BASE_MS", "1000")?;
    let daily_call_ceiling = parse_u32("PRICEPULSE_DAILY_CALL_CEILING", "10")?;
    let max_prompt_chars = parse_usize("PRICEPULSE_MAX_PROMPT_CHARS", "150000")?;
    let product_cache_ttl_secs = parse_u64("PRICEPULSE_PRODUCT_CACHE_TTL_SECS", "1800")?;
    let competitor_cache_ttl_secs = parse_u64("PRICEPULSE_COMPETITOR_CACHE_TTL_SECS", "21600")?;

    let fallback_catalog_path = optional("PRICEPULSE_FALLBACK_CATALOG_PATH").map(PathBuf::from);
    let competitor_prompt_path = optional("PRICEPULSE_COMPETITOR_PROMPT_PATH").map(PathBuf::from);

    if completion_concurrency == 0 {
        return Err(ConfigError::Validation(
            "PRICEPULSE_COMPLETION_CONCURRENCY must be at least 1".to_string(),
        ));
    }
    if analysis_concurrency == 0 {
        return Err(ConfigError::Validation(
            "PRICEPULSE_ANALYSIS_CONCURRENCY must be at least 1".to_string(),
        ));
    }

    Ok(AppConfig {
        openai_api_key,
        openai_model,
        openai_endpoint,
        log_level,
        default_locale,
        fetch_timeout_secs,
        completion_timeout_secs,
        completion_concurrency,
        analysis_concurrency,
        max_retries,
        retry_backoff_base_ms,
        daily_call_ceiling,
        max_prompt_chars,
        product_cache_ttl_secs,
        competitor_cache_ttl_secs,
        fallback_catalog_path,
        competitor_prompt_path,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
