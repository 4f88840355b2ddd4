//! Sub-command handlers. Each prints its result as pretty JSON on stdout;
//! logs go to stderr.

use std::sync::Arc;

use pricepulse_core::{load_fallback_catalog, load_prompt_template, AppConfig};
use pricepulse_discovery::{AnalysisOrchestrator, DiscoveryPipeline, PromptBuilder};
use serde::Serialize;

/// Builds the pipeline, applying the optional fallback catalog and
/// competitor prompt files from `config`.
///
/// # Errors
///
/// Returns an error if an HTTP client cannot be built or a configured file
/// cannot be loaded.
pub(crate) fn build_pipeline(config: &AppConfig) -> anyhow::Result<DiscoveryPipeline> {
    let mut pipeline = DiscoveryPipeline::from_config(config)?;

    if let Some(path) = &config.fallback_catalog_path {
        let catalog = load_fallback_catalog(path)?;
        tracing::info!(path = %path.display(), domains = catalog.domains.len(), "loaded fallback catalog");
        pipeline = pipeline.with_fallback(catalog);
    }
    if let Some(path) = &config.competitor_prompt_path {
        let template = load_prompt_template(path)?;
        tracing::info!(path = %path.display(), "loaded competitor prompt template");
        pipeline = pipeline.with_prompts(PromptBuilder::new().with_competitor_template(template));
    }
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; discovery will return empty results");
    }

    Ok(pipeline)
}

pub(crate) async fn run_products(
    pipeline: &DiscoveryPipeline,
    url: &str,
    locale: Option<&str>,
) -> anyhow::Result<()> {
    let products = pipeline
        .discover_products(url, locale.unwrap_or_default())
        .await;
    print_json(&products)
}

pub(crate) async fn run_modify(
    pipeline: &DiscoveryPipeline,
    url: &str,
    locale: Option<&str>,
    instructions: &str,
) -> anyhow::Result<()> {
    let products = pipeline
        .discover_products_with_modification(url, locale.unwrap_or_default(), instructions)
        .await;
    print_json(&products)
}

pub(crate) async fn run_competitors(
    pipeline: &DiscoveryPipeline,
    url: &str,
    locale: Option<&str>,
) -> anyhow::Result<()> {
    let competitors = pipeline
        .discover_competitors(url, locale.unwrap_or_default())
        .await;
    print_json(&competitors)
}

/// Analyses `domains` as one batch. A failed domain shows up in the output
/// with `success: false`; it never fails the command.
pub(crate) async fn run_analyze(
    pipeline: Arc<DiscoveryPipeline>,
    concurrency: usize,
    domains: &[String],
    records: bool,
) -> anyhow::Result<()> {
    let orchestrator = AnalysisOrchestrator::new(pipeline, concurrency);
    let results = orchestrator.analyze_many(domains).await;

    if records {
        let analyses: Vec<_> = results
            .iter()
            .filter(|r| r.success)
            .flat_map(pricepulse_core::CompetitorAnalysisResult::to_product_analyses)
            .collect();
        return print_json(&analyses);
    }
    print_json(&results)
}

pub(crate) async fn run_ask(pipeline: &DiscoveryPipeline, prompt: &str) -> anyhow::Result<()> {
    let answer = pipeline.ask(prompt).await?;
    println!("{answer}");
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
