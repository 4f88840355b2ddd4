use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::products::DiscoveredProduct;

/// Outcome of analysing one competitor domain.
///
/// `success == false` means the analysis itself failed and `error_message`
/// says why; `success == true` with an empty `products` list means the
/// analysis ran and legitimately found nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorAnalysisResult {
    pub competitor_domain: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub products: Vec<DiscoveredProduct>,
    pub analysis_time_ms: u64,
    pub analyzed_at: DateTime<Utc>,
}

impl CompetitorAnalysisResult {
    #[must_use]
    pub fn succeeded(
        competitor_domain: impl Into<String>,
        products: Vec<DiscoveredProduct>,
        analysis_time_ms: u64,
    ) -> Self {
        Self {
            competitor_domain: competitor_domain.into(),
            success: true,
            error_message: None,
            products,
            analysis_time_ms,
            analyzed_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn failed(competitor_domain: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            competitor_domain: competitor_domain.into(),
            success: false,
            error_message: Some(error_message.into()),
            products: Vec::new(),
            analysis_time_ms: 0,
            analyzed_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn total_products(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn products_with_prices(&self) -> usize {
        self.prices().count()
    }

    /// Mean of the products' own prices, ignoring products without one.
    #[must_use]
    pub fn average_price(&self) -> Option<Decimal> {
        let count = self.products_with_prices();
        if count == 0 {
            return None;
        }
        let sum: Decimal = self.prices().sum();
        Some(sum / Decimal::from(count))
    }

    #[must_use]
    pub fn min_price(&self) -> Option<Decimal> {
        self.prices().min()
    }

    #[must_use]
    pub fn max_price(&self) -> Option<Decimal> {
        self.prices().max()
    }

    /// Converts the discovered products into analysis records, one retailer
    /// per competitor price, all stamped with `analyzed_at`.
    #[must_use]
    pub fn to_product_analyses(&self) -> Vec<CompetitorProductAnalysis> {
        self.products
            .iter()
            .map(|product| {
                let retailers = product
                    .competitor_prices
                    .iter()
                    .map(|cp| Retailer {
                        retailer_name: cp.retailer_name.clone(),
                        url: cp.url.clone(),
                        price: cp.price,
                        currency: None,
                        availability: None,
                        shipping_info: None,
                        rating: None,
                        reviews_count: None,
                        last_updated: self.analyzed_at,
                        is_active: true,
                    })
                    .collect();

                CompetitorProductAnalysis {
                    competitor_domain: self.competitor_domain.clone(),
                    product_name: product.product_name.clone(),
                    description: None,
                    price: product.our_price,
                    currency: None,
                    category: None,
                    image_url: None,
                    product_url: None,
                    discovered_at: self.analyzed_at,
                    last_updated: self.analyzed_at,
                    is_active: true,
                    retailers,
                }
            })
            .collect()
    }

    fn prices(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.products.iter().filter_map(|p| p.our_price)
    }
}

/// A competitor's product as tracked over time. Owns its retailer list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorProductAnalysis {
    pub competitor_domain: String,
    pub product_name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub discovered_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub is_active: bool,
    pub retailers: Vec<Retailer>,
}

impl CompetitorProductAnalysis {
    /// Marks the analysis and every retailer it owns inactive.
    pub fn deactivate(&mut self, at: DateTime<Utc>) {
        self.is_active = false;
        self.last_updated = at;
        for retailer in &mut self.retailers {
            retailer.is_active = false;
            retailer.last_updated = at;
        }
    }

    pub fn active_retailers(&self) -> impl Iterator<Item = &Retailer> {
        self.retailers.iter().filter(|r| r.is_active)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retailer {
    pub retailer_name: String,
    pub url: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub availability: Option<String>,
    pub shipping_info: Option<String>,
    pub rating: Option<String>,
    pub reviews_count: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub is_active: bool,
}
