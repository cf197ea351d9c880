use netlog_wire::coerce_id;
use serde_json::Value;

/// Pull a source-id reference out of a params object.
///
/// NetLog parameter blocks reference other sources either as a nested
/// `{"id": <id>, "type": <code>}` object or, for a few legacy fields, as a
/// bare scalar id. Tries each of `keys` in order and returns the first one
/// present.
pub(crate) fn ref_id(params: &Value, keys: &[&str]) -> Option<i64> {
    for key in keys {
        if let Some(value) = params.get(*key) {
            let id_value = value.get("id").unwrap_or(value);
            if let Ok(id) = coerce_id(id_value) {
                return Some(id);
            }
        }
    }
    None
}

/// `source_dependency` is the one reference field nearly every handler
/// reads to back-link its entity onto another (spec GLOSSARY).
pub(crate) fn source_dependency_id(params: &Value) -> Option<i64> {
    ref_id(params, &["source_dependency"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_nested_id_object() {
        let params = json!({"source_dependency": {"id": "7", "type": 1}});
        assert_eq!(source_dependency_id(&params), Some(7));
    }

    #[test]
    fn reads_bare_scalar_fallback_key() {
        let params = json!({"socket": 9});
        assert_eq!(ref_id(&params, &["socket"]), Some(9));
    }

    #[test]
    fn missing_key_is_none() {
        assert_eq!(source_dependency_id(&json!({})), None);
    }
}
