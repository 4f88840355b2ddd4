//! Shared domain records and configuration for the `PricePulse` discovery
//! pipeline.

pub mod analysis;
pub mod app_config;
pub mod competitors;
pub mod config;
pub mod error;
pub mod fallback;
pub mod products;

pub use analysis::{CompetitorAnalysisResult, CompetitorProductAnalysis, Retailer};
pub use app_config::AppConfig;
pub use competitors::DiscoveredCompetitor;
pub use config::{load_app_config, load_app_config_from_env, load_prompt_template};
pub use error::ConfigError;
pub use fallback::{load_fallback_catalog, DomainFallback, FallbackCatalog};
pub use products::{CompetitorPrice, DiscoveredProduct};
