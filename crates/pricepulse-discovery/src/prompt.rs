//! Extraction prompt templates.
//!
//! Every prompt states the task with its locale constraint, spells out the
//! exact JSON shape the model must return, and ends with a capped excerpt of
//! the page HTML.

use std::borrow::Cow;

/// HTML excerpt cap for product prompts, in characters.
pub const PRODUCT_HTML_CAP: usize = 120_000;
/// HTML excerpt cap for competitor prompts, in characters.
pub const COMPETITOR_HTML_CAP: usize = 50_000;

/// Marker appended when the excerpt had to be hard-cut.
const ELLIPSIS: &str = "...";

const PRODUCT_SCHEMA_EXAMPLE: &str = r#"Return ONLY this JSON format:
{
  "products": [
    {
      "productName": "iPhone 15 Pro 256GB",
      "ourPrice": 999.00,
      "competitorPrices": [
        {
          "retailerName": "Amazon",
          "price": 989.00,
          "url": "https://amazon.com/iphone-15-pro-256gb"
        },
        {
          "retailerName": "Best Buy",
          "price": 999.00,
          "url": "https://bestbuy.com/iphone-15-pro"
        }
      ]
    }
  ]
}
"#;

const PRODUCT_SCHEMA_COMPACT: &str = r#"Return ONLY valid JSON per this schema and nothing else:
{
  "products": [
    { "productName": "string", "ourPrice": number | null, "competitorPrices": [{ "retailerName": "string", "price": number | null, "url": "string" }] }
  ]
}
"#;

const DEFAULT_COMPETITOR_TEMPLATE: &str = r#"Identify the main competitors of the company behind {url}, operating in {locale}.
Use the website content below to understand what the company sells and who it sells to.

ANALYSIS REQUIREMENTS:
- Return between 5 and 10 direct or close competitors
- Prefer companies that sell comparable products to the same customers in {locale}
- Give each competitor's primary website URL
- Explain in one sentence why each company competes with {url}
- company_type is one of: enterprise, mid-size, startup
- market_position is one of: leader, challenger, follower, niche

Return ONLY this JSON format:
{
  "competitor_analysis": {
    "total_competitors_found": 2,
    "competitors": [
      {
        "company_name": "Samsung",
        "website_url": "https://www.samsung.com",
        "description": "South Korean multinational electronics company",
        "key_products_services": "Galaxy smartphones, tablets, TVs",
        "competition_reason": "Direct competitor in smartphones and tablets",
        "company_type": "enterprise",
        "market_position": "leader"
      },
      {
        "company_name": "Google",
        "website_url": "https://store.google.com",
        "description": "American multinational technology company",
        "key_products_services": "Pixel phones, Nest devices",
        "competition_reason": "Competes in phones and smart home devices",
        "company_type": "enterprise",
        "market_position": "challenger"
      }
    ]
  }
}"#;

/// Which extraction prompt to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind<'a> {
    ProductDiscovery,
    /// Product discovery steered by free-form instructions from the user.
    ModifiedProductDiscovery { modification: &'a str },
    CompetitorDiscovery,
}

impl PromptKind<'_> {
    /// Maximum number of HTML characters embedded for this kind.
    #[must_use]
    pub fn html_cap(&self) -> usize {
        match self {
            Self::ProductDiscovery | Self::ModifiedProductDiscovery { .. } => PRODUCT_HTML_CAP,
            Self::CompetitorDiscovery => COMPETITOR_HTML_CAP,
        }
    }
}

/// Renders extraction prompts. Output depends only on the inputs.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    competitor_template: Option<String>,
}

impl PromptBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the built-in competitor-discovery template. `{url}` and
    /// `{locale}` placeholders are substituted at render time.
    #[must_use]
    pub fn with_competitor_template(mut self, template: impl Into<String>) -> Self {
        self.competitor_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn build(&self, kind: PromptKind<'_>, url: &str, locale: &str, html: &str) -> String {
        let snippet = truncate_html(html, kind.html_cap());
        match kind {
            PromptKind::ProductDiscovery => product_prompt(url, locale, &snippet),
            PromptKind::ModifiedProductDiscovery { modification } => {
                modified_prompt(url, locale, modification, &snippet)
            }
            PromptKind::CompetitorDiscovery => {
                let template = self
                    .competitor_template
                    .as_deref()
                    .unwrap_or(DEFAULT_COMPETITOR_TEMPLATE);
                let instructions = template.replace("{url}", url).replace("{locale}", locale);
                format!("{instructions}\n\nWebsite HTML Content:\n{snippet}")
            }
        }
    }
}

fn product_prompt(url: &str, locale: &str, snippet: &str) -> String {
    let mut prompt = format!(
        "Identify all products on {url} and find top 20 retailers that sell the same products within {locale}. \
         Return JSON formatted table with following: product name, our price, price for each retailer and URL \
         of the product purchase page of given retailer.\n\n"
    );
    prompt.push_str("ANALYSIS REQUIREMENTS:\n");
    prompt.push_str("- Extract ALL products found on the website\n");
    prompt.push_str("- For each product, identify the current price on this website (our price)\n");
    prompt.push_str(&format!(
        "- Find up to 20 major retailers in {locale} that sell the same products\n"
    ));
    prompt.push_str("- Include competitor prices from retailers like Amazon, Best Buy, Walmart, Target, etc.\n");
    prompt.push_str("- Provide product URLs for each retailer when available\n\n");
    prompt.push_str("PRICE EXTRACTION:\n");
    prompt.push_str("- Look for price text like '$999', '$1,299', 'Starting at $599'\n");
    prompt.push_str("- Look for 'From $X' or 'Starting at $X'\n");
    prompt.push_str("- Look for price ranges like '$999-$1,299'\n");
    prompt.push_str("- Extract numbers as DECIMAL (e.g., 999.00 for '$999')\n");
    prompt.push_str("- If no price found, set to null\n");
    prompt.push_str("- IMPORTANT: All prices must be numbers, not strings\n\n");
    prompt.push_str("RETAILER RESEARCH:\n");
    prompt.push_str(&format!("- Focus on major retailers in {locale}\n"));
    prompt.push_str("- Include online retailers (Amazon, eBay, etc.)\n");
    prompt.push_str("- Include brick-and-mortar chains (Best Buy, Walmart, Target, etc.)\n");
    prompt.push_str("- Include specialty retailers when relevant\n\n");
    prompt.push_str(PRODUCT_SCHEMA_EXAMPLE);
    prompt.push_str(&format!("\nHTML Content from {url}:\n"));
    prompt.push_str(snippet);
    prompt
}

fn modified_prompt(url: &str, locale: &str, modification: &str, snippet: &str) -> String {
    let mut prompt = format!(
        "Apply these modified parameters: {modification}. From the provided HTML snippet of {url} \
         (company location: {locale}), extract products.\n"
    );
    prompt.push_str(PRODUCT_SCHEMA_COMPACT);
    prompt.push_str("HTML:\n");
    prompt.push_str(snippet);
    prompt
}

/// Prompt size as the cost guard and the logs measure it: Unicode scalar
/// values, not bytes.
#[must_use]
pub(crate) fn prompt_chars(prompt: &str) -> usize {
    prompt.chars().count()
}

/// Caps `html` at `cap` characters without cutting mid-tag or mid-word when
/// possible.
///
/// The capped text is searched backward for the last `>`, `.` or space. If
/// cutting just after that character keeps at least 80 % of the capped
/// length, the excerpt ends there; otherwise the capped text is returned
/// with `...` appended.
#[must_use]
pub fn truncate_html(html: &str, cap: usize) -> Cow<'_, str> {
    let Some((cut, _)) = html.char_indices().nth(cap) else {
        return Cow::Borrowed(html);
    };
    let limited = &html[..cut];

    // Breakpoints are single-byte ASCII, so `idx + 1` is a char boundary.
    match limited.rfind(|c| matches!(c, '>' | '.' | ' ')) {
        Some(idx) if limited[..=idx].chars().count() * 5 >= cap * 4 => {
            Cow::Borrowed(&html[..=idx])
        }
        _ => Cow::Owned(format!("{limited}{ELLIPSIS}")),
    }
}
