use serde::{Deserialize, Serialize};

/// A competitor company suggested by competitor discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveredCompetitor {
    pub company_name: String,
    pub website_url: String,
    pub description: String,
    pub key_products_services: String,
    pub competition_reason: String,
    /// `enterprise`, `mid-size`, `startup`, ...
    pub company_type: String,
    /// `leader`, `challenger`, `follower`, ...
    pub market_position: String,
    /// Set by the caller's confirmation step; never read from model output.
    #[serde(skip)]
    pub is_selected: bool,
}
