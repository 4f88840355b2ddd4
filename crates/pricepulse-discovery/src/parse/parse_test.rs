use rust_decimal::Decimal;

use super::*;

const CLEAN_PRODUCTS: &str = r#"{
  "products": [
    {
      "productName": "iPhone 15 Pro 256GB",
      "ourPrice": 999.00,
      "competitorPrices": [
        {"retailerName": "Amazon", "price": 989.00, "url": "https://amazon.com/iphone"},
        {"retailerName": "Best Buy", "price": null, "url": "https://bestbuy.com/iphone"}
      ]
    },
    {
      "productName": "AirPods Pro",
      "ourPrice": 249.99,
      "competitorPrices": []
    }
  ]
}"#;

fn envelope(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

fn clean_items() -> Vec<DiscoveredProduct> {
    parse_content::<ProductCatalog>(CLEAN_PRODUCTS).into_items()
}

// -----------------------------------------------------------------------
// Well-formed output
// -----------------------------------------------------------------------

#[test]
fn clean_json_yields_every_record_in_order() {
    let outcome = parse_envelope::<ProductCatalog>(&envelope(CLEAN_PRODUCTS));
    assert!(outcome.is_ok());
    let items = outcome.items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].product_name, "iPhone 15 Pro 256GB");
    assert_eq!(items[0].our_price, Some(Decimal::new(999, 0)));
    assert_eq!(items[0].competitor_prices.len(), 2);
    assert_eq!(items[0].competitor_prices[0].retailer_name, "Amazon");
    assert_eq!(items[0].competitor_prices[1].price, None);
    assert_eq!(items[1].product_name, "AirPods Pro");
    assert_eq!(items[1].our_price, Some(Decimal::new(24999, 2)));
}

#[test]
fn missing_list_is_an_empty_success() {
    let outcome = parse_content::<ProductCatalog>("{}");
    assert_eq!(outcome, ParseOutcome::Parsed(Vec::new()));
}

#[test]
fn competitor_catalog_reads_nested_list() {
    let content = r#"{"competitor_analysis": {"total_competitors_found": 2, "competitors": [
        {"company_name": "Samsung", "website_url": "https://www.samsung.com", "market_position": "leader"},
        {"company_name": "Google", "website_url": "https://store.google.com", "description": null}
    ]}}"#;
    let items = parse_content::<CompetitorCatalog>(content).into_items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].company_name, "Samsung");
    assert_eq!(items[0].market_position, "leader");
    assert_eq!(items[1].description, "");
}

// -----------------------------------------------------------------------
// Defect tolerance
// -----------------------------------------------------------------------

#[test]
fn fenced_output_matches_clean_output() {
    let fenced = format!("```json\n{CLEAN_PRODUCTS}\n```");
    let outcome = parse_envelope::<ProductCatalog>(&envelope(&fenced));
    assert_eq!(outcome.into_items(), clean_items());
}

#[test]
fn trailing_comma_matches_clean_output() {
    let with_comma = CLEAN_PRODUCTS.replace("\"competitorPrices\": []\n    }", "\"competitorPrices\": [],\n    }");
    assert_ne!(with_comma, CLEAN_PRODUCTS);
    let outcome = parse_content::<ProductCatalog>(&with_comma);
    assert_eq!(outcome.into_items(), clean_items());
}

#[test]
fn surrounding_prose_matches_clean_output() {
    let chatty = format!("Here are the products I found:\n{CLEAN_PRODUCTS}\nLet me know if you need more.");
    let outcome = parse_content::<ProductCatalog>(&chatty);
    assert_eq!(outcome.into_items(), clean_items());
}

#[test]
fn keys_match_regardless_of_case_and_underscores() {
    let content = r#"{"Products": [{"product_name": "Widget", "OURPRICE": 5, "competitor_prices": [{"RetailerName": "Target"}]}]}"#;
    let items = parse_content::<ProductCatalog>(content).into_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_name, "Widget");
    assert_eq!(items[0].our_price, Some(Decimal::new(5, 0)));
    assert_eq!(items[0].competitor_prices[0].retailer_name, "Target");
}

// -----------------------------------------------------------------------
// Fail-closed
// -----------------------------------------------------------------------

#[test]
fn truncated_json_fails_closed() {
    let truncated = &CLEAN_PRODUCTS[..CLEAN_PRODUCTS.len() / 2];
    let outcome = parse_content::<ProductCatalog>(truncated);
    assert!(!outcome.is_ok());
    assert!(outcome.items().is_empty());
}

#[test]
fn structurally_invalid_json_keeps_original_text() {
    let raw = "```json\n{\"products\": [{\"productName\": }]}\n```";
    match parse_content::<ProductCatalog>(raw) {
        ParseOutcome::Failed { raw: kept, .. } => assert_eq!(kept, raw),
        ParseOutcome::Parsed(items) => panic!("expected failure, got {items:?}"),
    }
}

#[test]
fn wrong_shape_fails_closed() {
    let outcome = parse_content::<ProductCatalog>(r#"{"products": "none"}"#);
    assert!(!outcome.is_ok());
}

#[test]
fn envelope_without_content_fails_closed() {
    let outcome = parse_envelope::<ProductCatalog>(r#"{"choices": []}"#);
    assert!(matches!(outcome, ParseOutcome::Failed { .. }));
    assert!(outcome.items().is_empty());
}

#[test]
fn non_json_envelope_fails_closed() {
    let outcome = parse_envelope::<CompetitorCatalog>("502 Bad Gateway");
    assert!(!outcome.is_ok());
}
