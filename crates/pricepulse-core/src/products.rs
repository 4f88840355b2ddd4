use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product found on a company website, with the prices other retailers
/// charge for it.
///
/// Field names on the wire are camelCase because that is the schema the
/// product-discovery prompt asks the model to emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredProduct {
    pub product_name: String,
    #[serde(default)]
    pub our_price: Option<Decimal>,
    /// Never absent: a product without retailer data carries an empty list.
    #[serde(default)]
    pub competitor_prices: Vec<CompetitorPrice>,
}

impl DiscoveredProduct {
    #[must_use]
    pub fn new(product_name: impl Into<String>, our_price: Option<Decimal>) -> Self {
        Self {
            product_name: product_name.into(),
            our_price,
            competitor_prices: Vec::new(),
        }
    }
}

/// One retailer's listing for a [`DiscoveredProduct`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorPrice {
    pub retailer_name: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub url: Option<String>,
}
