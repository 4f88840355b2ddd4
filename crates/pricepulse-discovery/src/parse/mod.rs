//! Turns raw completion output into typed records.
//!
//! Model output is JSON-ish at best: fenced, wrapped in prose, or carrying a
//! dangling comma. The repair steps in [`repair`] recover the object when
//! possible; otherwise the result is [`ParseOutcome::Failed`] and the
//! original text is logged. Nothing here panics or returns `Err`.

mod repair;

use pricepulse_core::{DiscoveredCompetitor, DiscoveredProduct};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub(crate) use repair::extract_message_content;

/// Outcome of parsing one completion.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed(Vec<T>),
    Failed { reason: String, raw: String },
}

impl<T> ParseOutcome<T> {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    /// Parsed records, or an empty slice on failure.
    #[must_use]
    pub fn items(&self) -> &[T] {
        match self {
            Self::Parsed(items) => items,
            Self::Failed { .. } => &[],
        }
    }

    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Parsed(items) => items,
            Self::Failed { .. } => Vec::new(),
        }
    }
}

/// Top-level JSON shape the model is asked to return.
pub trait ExtractionSchema: DeserializeOwned {
    type Item;

    /// Used in log lines.
    const NAME: &'static str;

    /// Every key the shape uses, in its canonical spelling.
    const KEYS: &'static [&'static str];

    fn into_items(self) -> Vec<Self::Item>;
}

/// `{"products": [...]}`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductCatalog {
    pub products: Vec<DiscoveredProduct>,
}

impl ExtractionSchema for ProductCatalog {
    type Item = DiscoveredProduct;
    const NAME: &'static str = "products";
    const KEYS: &'static [&'static str] = &[
        "products",
        "productName",
        "ourPrice",
        "competitorPrices",
        "retailerName",
        "price",
        "url",
    ];

    fn into_items(self) -> Vec<DiscoveredProduct> {
        self.products
    }
}

/// `{"competitor_analysis": {"total_competitors_found": n, "competitors": [...]}}`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompetitorCatalog {
    pub competitor_analysis: CompetitorAnalysis,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompetitorAnalysis {
    pub total_competitors_found: u32,
    pub competitors: Vec<DiscoveredCompetitor>,
}

impl ExtractionSchema for CompetitorCatalog {
    type Item = DiscoveredCompetitor;
    const NAME: &'static str = "competitors";
    const KEYS: &'static [&'static str] = &[
        "competitor_analysis",
        "total_competitors_found",
        "competitors",
        "company_name",
        "website_url",
        "description",
        "key_products_services",
        "competition_reason",
        "company_type",
        "market_position",
    ];

    fn into_items(self) -> Vec<DiscoveredCompetitor> {
        self.competitor_analysis.competitors
    }
}

/// Parses a full chat-completions response body.
#[must_use]
pub fn parse_envelope<S: ExtractionSchema>(envelope: &str) -> ParseOutcome<S::Item> {
    match repair::extract_message_content(envelope) {
        Ok(content) => parse_content::<S>(&content),
        Err(reason) => failed::<S, _>(reason, envelope),
    }
}

/// Parses the assistant message text.
#[must_use]
pub fn parse_content<S: ExtractionSchema>(content: &str) -> ParseOutcome<S::Item> {
    let unfenced = repair::strip_code_fences(content);
    let Some(object) = repair::slice_outer_object(unfenced) else {
        return failed::<S, _>("no JSON object in model output".to_owned(), content);
    };
    let flattened = repair::normalize_newlines(object);
    let cleaned = repair::strip_trailing_commas(&flattened);

    let value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(e) => return failed::<S, _>(format!("invalid JSON: {e}"), content),
    };
    let value = repair::drop_nulls(repair::fold_keys(value, S::KEYS));

    match serde_json::from_value::<S>(value) {
        Ok(schema) => ParseOutcome::Parsed(schema.into_items()),
        Err(e) => failed::<S, _>(format!("unexpected shape: {e}"), content),
    }
}

fn failed<S: ExtractionSchema, T>(reason: String, raw: &str) -> ParseOutcome<T> {
    tracing::warn!(schema = S::NAME, %reason, "could not parse model output");
    tracing::debug!(schema = S::NAME, raw, "raw model output");
    ParseOutcome::Failed {
        reason,
        raw: raw.to_owned(),
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
