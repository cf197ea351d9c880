use std::collections::HashMap;

use serde_json::Value;

/// Inverted lookup tables built from the NetLog `"constants"` preamble.
///
/// Chrome's constants object has one entry per symbol group (`logEventTypes`,
/// `logSourceType`, `logEventPhase`, and several others the correlator never
/// reads); each entry whose value is itself a mapping gets inverted from
/// `name -> code` to `code -> name`, group by group.
#[derive(Debug, Clone, Default)]
pub struct ConstantTables {
    tables: HashMap<String, HashMap<i64, String>>,
}

const EVENT_TYPES: &str = "logEventTypes";
const SOURCE_TYPE: &str = "logSourceType";
const EVENT_PHASE: &str = "logEventPhase";

impl ConstantTables {
    pub fn from_value(constants: &Value) -> Self {
        let mut tables = HashMap::new();
        if let Value::Object(groups) = constants {
            for (group, mapping) in groups {
                let Value::Object(mapping) = mapping else {
                    continue;
                };
                let inverted = mapping
                    .iter()
                    .filter_map(|(name, code)| Some((code.as_i64()?, name.clone())))
                    .collect();
                tables.insert(group.clone(), inverted);
            }
        } else {
            tracing::warn!("constants preamble was not a JSON object; all codes will be unresolved");
        }
        Self { tables }
    }

    pub fn event_type(&self, code: i64) -> Option<&str> {
        self.lookup(EVENT_TYPES, code)
    }

    pub fn source_type(&self, code: i64) -> Option<&str> {
        self.lookup(SOURCE_TYPE, code)
    }

    pub fn event_phase(&self, code: i64) -> Option<&str> {
        self.lookup(EVENT_PHASE, code)
    }

    fn lookup(&self, table: &str, code: i64) -> Option<&str> {
        self.tables.get(table)?.get(&code).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "logEventTypes": {"URL_REQUEST": 1, "SOCKET": 2},
            "logSourceType": {"URL_REQUEST": 10, "SOCKET": 11},
            "logEventPhase": {"PHASE_BEGIN": 1, "PHASE_END": 2, "PHASE_NONE": 0},
            "clientInfo": {"name": "chrome"},
        })
    }

    #[test]
    fn inverts_load_bearing_tables() {
        let tables = ConstantTables::from_value(&sample());
        assert_eq!(tables.event_type(1), Some("URL_REQUEST"));
        assert_eq!(tables.source_type(11), Some("SOCKET"));
        assert_eq!(tables.event_phase(0), Some("PHASE_NONE"));
    }

    #[test]
    fn unknown_code_is_none() {
        let tables = ConstantTables::from_value(&sample());
        assert_eq!(tables.event_type(999), None);
    }

    #[test]
    fn non_mapping_entries_are_not_retained_as_tables() {
        let tables = ConstantTables::from_value(&sample());
        assert_eq!(tables.lookup("clientInfo", 0), None);
    }
}
