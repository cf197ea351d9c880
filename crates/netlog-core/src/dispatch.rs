use netlog_wire::{coerce_id, coerce_int};
use serde_json::Value;

use crate::constants::ConstantTables;

/// Event lifecycle marker, resolved from the `logEventPhase` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Begin,
    End,
    None,
}

impl Phase {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "PHASE_BEGIN" => Some(Phase::Begin),
            "PHASE_END" => Some(Phase::End),
            "PHASE_NONE" => Some(Phase::None),
            _ => None,
        }
    }
}

/// A raw NetLog line after symbol resolution and id coercion, ready to be
/// routed to an entity handler.
#[derive(Debug, Clone)]
pub struct DispatchedEvent {
    pub event_name: String,
    /// `None` when `source.type` didn't resolve to a known symbol — an
    /// unknown source kind, not a decode failure (spec §4.C).
    pub source_kind: Option<String>,
    pub phase: Phase,
    pub source_id: i64,
    pub time: i64,
    pub params: Value,
}

/// Resolve a raw decoded event line against the constants tables.
///
/// Returns `None` when the event, source, or phase code has no symbol
/// (component B: "missing symbols cause the dispatcher to drop the
/// event") or when the envelope is missing a required field — both are
/// `UnknownCode`/`LineDecodeError` conditions, logged by the caller and
/// otherwise silently dropped.
pub fn dispatch(tables: &ConstantTables, raw: &Value) -> Option<DispatchedEvent> {
    let type_code = raw.get("type")?.as_i64()?;
    let event_name = tables.event_type(type_code)?.to_string();

    let phase_code = raw.get("phase")?.as_i64()?;
    let phase = Phase::from_symbol(tables.event_phase(phase_code)?)?;

    let source = raw.get("source")?;
    let source_kind = source
        .get("type")
        .and_then(Value::as_i64)
        .and_then(|code| tables.source_type(code))
        .map(str::to_owned);

    let source_id = coerce_id(source.get("id")?).ok()?;
    let time = coerce_int(raw.get("time")?).ok()?;
    let params = raw.get("params").cloned().unwrap_or(Value::Null);

    Some(DispatchedEvent {
        event_name,
        source_kind,
        phase,
        source_id,
        time,
        params,
    })
}

/// Which entity handler owns a dispatched event.
///
/// `HOST_RESOLVER_IMPL_*` event names route to DNS regardless of the
/// originating source kind — the one routing exception named in spec §4.C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Dns,
    ConnectJob,
    StreamJob,
    Socket,
    UdpSocket,
    Http2Session,
    QuicSession,
    UrlRequest,
    DiskCache,
}

pub fn route(event_name: &str, source_kind: Option<&str>) -> Option<HandlerKind> {
    if event_name.starts_with("HOST_RESOLVER") {
        return Some(HandlerKind::Dns);
    }
    match source_kind? {
        "CONNECT_JOB" | "SSL_CONNECT_JOB" | "TRANSPORT_CONNECT_JOB" => {
            Some(HandlerKind::ConnectJob)
        }
        "HTTP_STREAM_JOB" => Some(HandlerKind::StreamJob),
        "SOCKET" => Some(HandlerKind::Socket),
        "UDP_SOCKET" => Some(HandlerKind::UdpSocket),
        "HTTP2_SESSION" => Some(HandlerKind::Http2Session),
        "QUIC_SESSION" => Some(HandlerKind::QuicSession),
        "URL_REQUEST" => Some(HandlerKind::UrlRequest),
        "DISK_CACHE_ENTRY" => Some(HandlerKind::DiskCache),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tables() -> ConstantTables {
        ConstantTables::from_value(&json!({
            "logEventTypes": {"URL_REQUEST_DELEGATE": 5},
            "logSourceType": {"URL_REQUEST": 10},
            "logEventPhase": {"PHASE_BEGIN": 1},
        }))
    }

    #[test]
    fn dispatches_known_event() {
        let raw = json!({
            "type": 5,
            "phase": 1,
            "time": "100",
            "source": {"type": 10, "id": "7"},
            "params": {"k": "v"},
        });
        let ev = dispatch(&tables(), &raw).unwrap();
        assert_eq!(ev.event_name, "URL_REQUEST_DELEGATE");
        assert_eq!(ev.source_kind.as_deref(), Some("URL_REQUEST"));
        assert_eq!(ev.phase, Phase::Begin);
        assert_eq!(ev.source_id, 7);
        assert_eq!(ev.time, 100);
    }

    #[test]
    fn unknown_event_type_drops() {
        let raw = json!({"type": 999, "phase": 1, "time": "1", "source": {"type": 10, "id": "1"}});
        assert!(dispatch(&tables(), &raw).is_none());
    }

    #[test]
    fn unknown_source_kind_is_not_a_drop() {
        let raw = json!({"type": 5, "phase": 1, "time": "1", "source": {"type": 999, "id": "1"}});
        let ev = dispatch(&tables(), &raw).unwrap();
        assert_eq!(ev.source_kind, None);
    }

    #[test]
    fn host_resolver_routes_regardless_of_source_kind() {
        assert_eq!(
            route("HOST_RESOLVER_IMPL_REQUEST", Some("URL_REQUEST")),
            Some(HandlerKind::Dns)
        );
    }

    #[test]
    fn unrouteable_source_kind_is_ignored() {
        assert_eq!(route("SOME_EVENT", Some("DISK_ENTRY_THING")), None);
        assert_eq!(route("SOME_EVENT", None), None);
    }
}
