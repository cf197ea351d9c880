use serde_json::Value;

use crate::dispatch::DispatchedEvent;
use crate::store::EntityStore;

/// `DISK_CACHE_ENTRY` — records the URL key's first-observed timestamp so
/// a connection that never fires can still be synthesized as a failed
/// request in post-processing if the same URL shows up here.
pub(crate) fn handle(store: &mut EntityStore, ev: &DispatchedEvent) {
    let url = ev
        .params
        .get("key")
        .or_else(|| ev.params.get("url"))
        .and_then(Value::as_str);
    if let Some(url) = url {
        store.record_disk_cache_hint(url.to_string(), ev.time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Phase;
    use serde_json::json;

    #[test]
    fn records_first_observed_timestamp_only() {
        let mut store = EntityStore::new();
        let first = DispatchedEvent {
            event_name: "DISK_CACHE_ENTRY".into(),
            source_kind: None,
            phase: Phase::None,
            source_id: 1,
            time: 10,
            params: json!({"key": "https://example.com/"}),
        };
        let second = DispatchedEvent {
            time: 20,
            ..first.clone()
        };
        handle(&mut store, &first);
        handle(&mut store, &second);
        assert_eq!(
            store.disk_cache_hints["https://example.com/"].start,
            10
        );
    }
}
