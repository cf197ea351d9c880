//! Header-list normalization.
//!
//! NetLog headers show up in two shapes depending on the event: an ordered
//! JSON array of `"Name: value"` strings, or a JSON object mapping header
//! name to value. Everything downstream of ingest wants one shape, so this
//! normalizes both into `Vec<String>` of `"Name: value"` entries, in
//! whatever order the source presented them.

use serde_json::Value;

/// Normalize a `params` headers field (array-of-strings or object form) to
/// a flat list of `"Name: value"` strings. Returns an empty vector for any
/// other shape (missing, null, scalar).
pub fn normalize_headers(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {}", value_to_header_string(v)))
            .collect(),
        _ => Vec::new(),
    }
}

fn value_to_header_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_form_passes_through() {
        let headers = json!(["Host: example.com", "Accept: */*"]);
        assert_eq!(
            normalize_headers(&headers),
            vec!["Host: example.com".to_string(), "Accept: */*".to_string()]
        );
    }

    #[test]
    fn object_form_is_flattened_preserving_order() {
        let headers = json!({":method": "GET", ":path": "/index.html"});
        assert_eq!(
            normalize_headers(&headers),
            vec![
                ":method: GET".to_string(),
                ":path: /index.html".to_string(),
            ]
        );
    }

    #[test]
    fn missing_headers_yield_empty_list() {
        assert_eq!(normalize_headers(&Value::Null), Vec::<String>::new());
    }
}
