//! Website URL normalization shared by fetching and cache keys.

/// Normalizes user-supplied website input into an absolute URL.
///
/// Trims whitespace and prefixes `https://` when no scheme is present. When
/// the result parses as a URL, its canonical serialization is returned
/// (lower-cased host, `/` for an empty path) so equivalent inputs map to the
/// same cache key.
///
/// ```
/// use pricepulse_discovery::normalize_site_url;
///
/// assert_eq!(normalize_site_url(" Apple.com "), "https://apple.com/");
/// assert_eq!(normalize_site_url("http://shop.example/a"), "http://shop.example/a");
/// ```
#[must_use]
pub fn normalize_site_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let has_scheme = ["http://", "https://"].iter().any(|scheme| {
        trimmed
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });

    let absolute = if has_scheme {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    reqwest::Url::parse(&absolute).map_or(absolute, |url| url.to_string())
}

/// Builds the URL fetched for a bare competitor domain.
#[must_use]
pub fn domain_to_url(domain: &str) -> String {
    normalize_site_url(domain)
}
