//! Repair steps applied to model output before deserialization.
//!
//! Each step is a pure function over text or a JSON value so it can be
//! tested on its own. [`super::parse_content`] chains them in order.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid trailing-comma regex"));

/// Pulls `choices[0].message.content` out of a chat-completions envelope.
pub(crate) fn extract_message_content(envelope: &str) -> Result<String, String> {
    let value: Value = serde_json::from_str(envelope)
        .map_err(|e| format!("completion envelope is not JSON: {e}"))?;
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|content| !content.trim().is_empty())
        .map(str::to_owned)
        .ok_or_else(|| "completion envelope has no message content".to_owned())
}

/// Removes a leading ```` ```json ```` / ```` ``` ```` line and a trailing fence.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.strip_prefix("json").unwrap_or(rest);
        body = body.strip_prefix("JSON").unwrap_or(body);
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Slices from the first `{` through the last `}`, dropping surrounding prose.
pub(crate) fn slice_outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub(crate) fn normalize_newlines(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Drops a comma that directly precedes a closing `}` or `]`.
pub(crate) fn strip_trailing_commas(text: &str) -> Cow<'_, str> {
    TRAILING_COMMA.replace_all(text, "$1")
}

/// Renames object keys to their canonical spelling when they match one of
/// `canonical` ignoring ASCII case and underscores.
pub(crate) fn fold_keys(value: Value, canonical: &[&str]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| {
                    let folded = canonical
                        .iter()
                        .find(|c| same_key(c, &key))
                        .map_or(key, |c| (*c).to_owned());
                    (folded, fold_keys(inner, canonical))
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| fold_keys(item, canonical))
                .collect(),
        ),
        other => other,
    }
}

fn same_key(a: &str, b: &str) -> bool {
    let squash = |s: &str| {
        s.chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect::<String>()
    };
    squash(a) == squash(b)
}

/// Removes `null` members and array elements so field defaults apply.
pub(crate) fn drop_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, drop_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(drop_nulls)
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_content_from_envelope() {
        let envelope = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#;
        assert_eq!(extract_message_content(envelope).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn envelope_without_choices_is_an_error() {
        assert!(extract_message_content(r#"{"choices":[]}"#).is_err());
        assert!(extract_message_content("<html>gateway</html>").is_err());
    }

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_code_fences("```\n{}\n```  "), "{}");
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn slices_between_outer_braces() {
        let text = "Sure! Here you go: {\"a\":{\"b\":2}} Hope this helps.";
        assert_eq!(slice_outer_object(text), Some("{\"a\":{\"b\":2}}"));
    }

    #[test]
    fn slice_requires_both_braces_in_order() {
        assert_eq!(slice_outer_object("no json here"), None);
        assert_eq!(slice_outer_object("} backwards {"), None);
    }

    #[test]
    fn newlines_become_spaces() {
        assert_eq!(normalize_newlines("{\r\n\"a\":1\n}"), "{  \"a\":1 }");
    }

    #[test]
    fn trailing_comma_before_brace_is_removed() {
        assert_eq!(strip_trailing_commas("{\"a\":1, }"), "{\"a\":1 }");
    }

    #[test]
    fn trailing_comma_before_bracket_is_removed() {
        assert_eq!(strip_trailing_commas("[1,2,]"), "[1,2]");
    }

    #[test]
    fn interior_commas_are_kept() {
        assert_eq!(strip_trailing_commas("{\"a\":1,\"b\":2}"), "{\"a\":1,\"b\":2}");
    }

    #[test]
    fn folds_keys_ignoring_case_and_underscores() {
        let value = json!({"PRODUCTS": [{"Product_Name": "x", "other": 1}]});
        let folded = fold_keys(value, &["products", "productName"]);
        assert_eq!(folded, json!({"products": [{"productName": "x", "other": 1}]}));
    }

    #[test]
    fn drops_null_members_recursively() {
        let value = json!({"a": null, "b": {"c": null, "d": 1}, "e": [null, 2]});
        assert_eq!(drop_nulls(value), json!({"b": {"d": 1}, "e": [2]}));
    }
}
