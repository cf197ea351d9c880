use netlog_model::{headers::normalize_headers, Chunk, QuicSession, QuicStream};
use serde_json::Value;

use crate::dispatch::DispatchedEvent;
use crate::store::EntityStore;

/// `QUIC_SESSION` — "analogous per-stream bookkeeping" to HTTP/2 (spec
/// §4.E), minus push promises and the settings table, which QUIC doesn't
/// have an equivalent of here.
pub(crate) fn handle(store: &mut EntityStore, ev: &DispatchedEvent) {
    let session = store.quic_session(ev.source_id);
    apply_params(session, &ev.params);

    match ev.event_name.as_str() {
        "QUIC_SESSION_PACKET_SENT" => {
            session.connect_start.get_or_insert(ev.time);
        }
        "QUIC_SESSION_VERSION_NEGOTIATED" => {
            session.connect_end = Some(ev.time);
        }
        "CERT_VERIFIER_REQUEST" => {
            if session.connect_end.is_some_and(|end| ev.time >= end) {
                session.tls_start.get_or_insert(ev.time);
                session.tls_end = Some(ev.time);
            }
        }
        "QUIC_SESSION_SEND_HEADERS" => {
            if let Some(stream_id) = stream_id(&ev.params) {
                let stream = stream_mut(store, ev.source_id, stream_id);
                stream.start.get_or_insert(ev.time);
                stream.request_headers = normalize_headers(&ev.params["headers"]);
            }
        }
        "QUIC_SESSION_RECV_HEADERS" => {
            if let Some(stream_id) = stream_id(&ev.params) {
                let stream = stream_mut(store, ev.source_id, stream_id);
                stream.first_byte.get_or_insert(ev.time);
                stream.response_headers = normalize_headers(&ev.params["headers"]);
            }
        }
        "QUIC_SESSION_RECV_DATA" => {
            if let Some(stream_id) = stream_id(&ev.params) {
                let bytes = ev.params.get("size").and_then(Value::as_i64).unwrap_or(0);
                let stream = stream_mut(store, ev.source_id, stream_id);
                stream.bytes_in += bytes;
                stream.chunks.push(Chunk { ts: ev.time, bytes });
                stream.end = Some(ev.time);
            }
        }
        _ => {}
    }
}

fn apply_params(session: &mut QuicSession, params: &Value) {
    if let Some(host) = params.get("host").and_then(Value::as_str) {
        session.host = Some(host.to_string());
    }
    if let Some(port) = params.get("port").and_then(Value::as_i64) {
        session.port = Some(port);
    }
    if let Some(peer) = params.get("peer_address").and_then(Value::as_str) {
        session.peer_address = Some(peer.to_string());
    }
    if let Some(addr) = params.get("self_address").and_then(Value::as_str) {
        session.self_address = Some(addr.to_string());
    }
    if let Some(v) = params.get("version").and_then(Value::as_str) {
        session.version = Some(v.to_string());
    }
}

fn stream_mut<'s>(store: &'s mut EntityStore, session_id: i64, stream_id: i64) -> &'s mut QuicStream {
    store
        .quic_session(session_id)
        .streams
        .entry(stream_id)
        .or_default()
}

fn stream_id(params: &Value) -> Option<i64> {
    params
        .get("stream_id")
        .or_else(|| params.get("id"))
        .and_then(Value::as_i64)
}
