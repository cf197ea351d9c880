use crate::error::DecodeError;
use serde_json::Value;

/// Coerce a NetLog `source.id` value to an integer.
///
/// NetLog ids are opaque but always numeric in spirit. They arrive either
/// as a JSON number or as a JSON string. A string id is tried as decimal
/// first, then as hex (without a `0x` prefix) — a strict superset of the
/// original Python's `int(id, 16)`-always-for-strings behavior, since it
/// also accepts the numeric ids Chrome emits directly.
pub fn coerce_id(value: &Value) -> Result<i64, DecodeError> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| DecodeError::NotNumeric {
            value: n.to_string(),
        }),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(n);
            }
            i64::from_str_radix(trimmed.trim_start_matches("0x"), 16).map_err(|_| {
                DecodeError::NotNumeric {
                    value: s.clone(),
                }
            })
        }
        other => Err(DecodeError::NotNumeric {
            value: other.to_string(),
        }),
    }
}

/// Coerce a NetLog timestamp-ish field (`time`, `source.start_time`) to an
/// integer. These are always base-10, but Chrome sometimes serializes them
/// as JSON strings (they can exceed the safe-integer range in JS), so both
/// forms are accepted.
pub fn coerce_int(value: &Value) -> Result<i64, DecodeError> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| DecodeError::NotNumeric {
            value: n.to_string(),
        }),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| DecodeError::NotNumeric {
            value: s.clone(),
        }),
        other => Err(DecodeError::NotNumeric {
            value: other.to_string(),
        }),
    }
}
