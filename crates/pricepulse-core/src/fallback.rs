//! Deterministic competitor dataset served when the paid completion API is
//! skipped (daily ceiling reached, prompt too large, or rate limited).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::competitors::DiscoveredCompetitor;
use crate::ConfigError;

/// Curated competitors for URLs containing `pattern`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainFallback {
    #[serde(rename = "match")]
    pub pattern: String,
    pub competitors: Vec<DiscoveredCompetitor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackCatalog {
    #[serde(default)]
    pub domains: Vec<DomainFallback>,
    /// Served for any URL no entry in `domains` matches.
    #[serde(default)]
    pub generic: Vec<DiscoveredCompetitor>,
}

impl FallbackCatalog {
    /// The dataset compiled into the binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            domains: vec![DomainFallback {
                pattern: "apple.com".to_string(),
                competitors: vec![
                    competitor(
                        "Samsung",
                        "https://www.samsung.com",
                        "South Korean multinational electronics company",
                        "Galaxy smartphones, tablets, TVs, home appliances",
                        "Direct competitor in smartphones, tablets, and consumer electronics",
                        "enterprise",
                        "leader",
                    ),
                    competitor(
                        "Google",
                        "https://www.google.com",
                        "American multinational technology company",
                        "Android OS, Pixel phones, Google Cloud, AI services",
                        "Competes in mobile operating systems, cloud services, and AI",
                        "enterprise",
                        "leader",
                    ),
                    competitor(
                        "Microsoft",
                        "https://www.microsoft.com",
                        "American multinational technology corporation",
                        "Windows OS, Office 365, Azure cloud, Surface devices",
                        "Competes in software, cloud services, and productivity tools",
                        "enterprise",
                        "leader",
                    ),
                    competitor(
                        "Sony",
                        "https://www.sony.com",
                        "Japanese multinational conglomerate",
                        "PlayStation, Xperia phones, cameras, audio equipment",
                        "Competes in consumer electronics, gaming, and entertainment",
                        "enterprise",
                        "leader",
                    ),
                    competitor(
                        "Amazon",
                        "https://www.amazon.com",
                        "American multinational technology company",
                        "Echo devices, Fire tablets, AWS cloud, e-commerce",
                        "Competes in smart home devices, cloud services, and e-commerce",
                        "enterprise",
                        "leader",
                    ),
                ],
            }],
            generic: vec![
                competitor(
                    "Competitor 1",
                    "https://competitor1.com",
                    "Direct competitor in the same market",
                    "Similar products and services",
                    "Similar products and target market",
                    "enterprise",
                    "challenger",
                ),
                competitor(
                    "Competitor 2",
                    "https://competitor2.com",
                    "Another competitor in the industry",
                    "Competing products and solutions",
                    "Competes for the same customer base",
                    "mid-size",
                    "follower",
                ),
            ],
        }
    }

    /// Returns the first curated list whose pattern occurs in `url`
    /// (case-insensitive), or the generic list.
    #[must_use]
    pub fn competitors_for(&self, url: &str) -> Vec<DiscoveredCompetitor> {
        let url = url.to_lowercase();
        self.domains
            .iter()
            .find(|d| url.contains(&d.pattern.to_lowercase()))
            .map_or_else(|| self.generic.clone(), |d| d.competitors.clone())
    }
}

impl Default for FallbackCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Load and validate a fallback catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_fallback_catalog(path: &Path) -> Result<FallbackCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: FallbackCatalog = serde_yaml::from_str(&content)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

fn validate_catalog(catalog: &FallbackCatalog) -> Result<(), ConfigError> {
    for entry in &catalog.domains {
        if entry.pattern.trim().is_empty() {
            return Err(ConfigError::Validation(
                "fallback domain pattern must be non-empty".to_string(),
            ));
        }
        if entry.competitors.is_empty() {
            return Err(ConfigError::Validation(format!(
                "fallback entry '{}' has no competitors",
                entry.pattern
            )));
        }
    }
    Ok(())
}

fn competitor(
    name: &str,
    url: &str,
    description: &str,
    products: &str,
    reason: &str,
    company_type: &str,
    position: &str,
) -> DiscoveredCompetitor {
    DiscoveredCompetitor {
        company_name: name.to_string(),
        website_url: url.to_string(),
        description: description.to_string(),
        key_products_services: products.to_string(),
        competition_reason: reason.to_string(),
        company_type: company_type.to_string(),
        market_position: position.to_string(),
        is_selected: false,
    }
}
