//! Boundary adapters turning collaborator text into typed values.
//!
//! Each adapter parses strictly and reports failure as a degradation rather
//! than an error; callers substitute the documented defaults.

pub mod characteristics;
pub mod market;
pub mod segments;

use serde_json::{Map, Value};

/// Strips a surrounding markdown code fence, if any.
pub(crate) fn unfence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

pub(crate) fn looks_like_json(text: &str) -> bool {
    let text = unfence(text);
    text.starts_with('{') || text.starts_with('[')
}

pub(crate) fn json_value(text: &str) -> Option<Value> {
    serde_json::from_str(unfence(text)).ok()
}

pub(crate) fn json_object(text: &str) -> Option<Map<String, Value>> {
    match json_value(text)? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Reads a JSON number or a numeric string such as `"1,000,000"`.
pub(crate) fn number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().replace([',', '_'], "").parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.trim().to_string()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
            .filter(|item| !item.is_empty())
            .collect(),
        Some(Value::String(text)) => text
            .split(['、', ','])
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unfence_strips_code_blocks() {
        assert_eq!(unfence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(unfence("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn number_accepts_numeric_strings() {
        assert_eq!(number(&json!(0.25)), Some(0.25));
        assert_eq!(number(&json!("1,000,000")), Some(1_000_000.0));
        assert_eq!(number(&json!("abc")), None);
        assert_eq!(number(&json!(null)), None);
    }

    #[test]
    fn string_list_reads_arrays_and_delimited_text() {
        assert_eq!(
            string_list(Some(&json!(["製造業", " ", "小売業"]))),
            vec!["製造業".to_string(), "小売業".to_string()]
        );
        assert_eq!(
            string_list(Some(&json!("製造業、小売業"))),
            vec!["製造業".to_string(), "小売業".to_string()]
        );
    }
}
