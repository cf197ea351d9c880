use netlog_model::{headers::normalize_headers, Chunk, Http2Stream};
use serde_json::Value;

use crate::dispatch::DispatchedEvent;
use crate::store::EntityStore;
use crate::util::ref_id;

/// `HTTP2_SESSION`.
pub(crate) fn handle(store: &mut EntityStore, ev: &DispatchedEvent) {
    match ev.event_name.as_str() {
        "HTTP2_SESSION_INITIALIZED" => {
            let socket_id = ref_id(&ev.params, &["source_dependency", "socket"]);
            let session = store.h2_session(ev.source_id);
            if let Some(host) = ev.params.get("host").and_then(Value::as_str) {
                session.host = Some(host.to_string());
            }
            if let Some(proto) = ev.params.get("protocol").and_then(Value::as_str) {
                session.protocol = Some(proto.to_string());
            }
            session.socket = socket_id;
            if let Some(socket_id) = socket_id {
                store.sockets.entry(socket_id).and_modify(|s| {
                    s.h2_session = Some(ev.source_id);
                });
            }
        }
        "HTTP2_SESSION_RECV_SETTING" => {
            if let Some((name, value)) = parse_setting(&ev.params) {
                store
                    .h2_session(ev.source_id)
                    .server_settings
                    .insert(name, value);
            }
        }
        "HTTP2_SESSION_RECV_PUSH_PROMISE" => handle_push_promise(store, ev),
        "HTTP2_STREAM_ADOPTED_PUSH_STREAM" => handle_adopted_push_stream(store, ev),
        "HTTP2_STREAM_SEND_HEADERS" => {
            if let Some(stream_id) = stream_id(&ev.params) {
                let stream = stream_mut(store, ev.source_id, stream_id);
                stream.start.get_or_insert(ev.time);
                stream.request_headers = normalize_headers(&ev.params["headers"]);
            }
        }
        "HTTP2_STREAM_RECV_HEADERS" => {
            if let Some(stream_id) = stream_id(&ev.params) {
                let stream = stream_mut(store, ev.source_id, stream_id);
                stream.first_byte.get_or_insert(ev.time);
                stream.response_headers = normalize_headers(&ev.params["headers"]);
            }
        }
        "HTTP2_STREAM_SEND_PRIORITY" => {
            if let Some(stream_id) = stream_id(&ev.params) {
                let stream = stream_mut(store, ev.source_id, stream_id);
                stream.exclusive = ev.params.get("exclusive").and_then(Value::as_bool);
                stream.parent_stream_id = ev.params.get("parent_stream_id").and_then(Value::as_i64);
                stream.weight = ev.params.get("weight").and_then(Value::as_i64);
            }
        }
        "HTTP2_SESSION_RECV_DATA" => {
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

fn stream_mut<'s>(store: &'s mut EntityStore, session_id: i64, stream_id: i64) -> &'s mut Http2Stream {
    store
        .h2_session(session_id)
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

/// `"id": "N (name)"` -> `(name, N)` — see spec §4.E.
fn parse_setting(params: &Value) -> Option<(String, i64)> {
    let raw = params.get("id")?.as_str()?;
    let (value_str, rest) = raw.split_once(' ')?;
    let value: i64 = value_str.parse().ok()?;
    let name = rest.trim_start_matches('(').trim_end_matches(')');
    Some((name.to_string(), value))
}

fn pseudo_header(headers: &Value, name: &str) -> Option<String> {
    match headers {
        Value::Object(map) => map.get(name).and_then(Value::as_str).map(str::to_owned),
        Value::Array(items) => items.iter().find_map(|v| {
            let s = v.as_str()?;
            s.strip_prefix(&format!("{name}: ")).map(str::to_owned)
        }),
        _ => None,
    }
}

/// Push-promise URLs are truncated at the first `#`, matching the
/// original's `.split('#', 1)[0]` (SPEC_FULL §5).
fn strip_fragment(url: String) -> String {
    match url.split_once('#') {
        Some((prefix, _)) => prefix.to_string(),
        None => url,
    }
}

fn synthesize_push_url(headers: &Value) -> Option<String> {
    let scheme = pseudo_header(headers, ":scheme")?;
    let authority = pseudo_header(headers, ":authority")?;
    let path = pseudo_header(headers, ":path").unwrap_or_default();
    Some(strip_fragment(format!("{scheme}://{authority}{path}")))
}

fn handle_push_promise(store: &mut EntityStore, ev: &DispatchedEvent) {
    let Some(promised_stream_id) = ev
        .params
        .get("promised_stream_id")
        .or_else(|| ev.params.get("id"))
        .and_then(Value::as_i64)
    else {
        return;
    };
    let headers = ev.params.get("headers").cloned().unwrap_or(Value::Null);
    let Some(url) = synthesize_push_url(&headers) else {
        return;
    };

    let request_headers = normalize_headers(&headers);
    let session_socket = store.h2_session(ev.source_id).socket;

    let phantom_id = store.next_synthetic_id();
    let request = store.url_request(phantom_id, ev.time);
    request.url = Some(url.clone());
    request.pushed = true;
    request.h2_session = Some(ev.source_id);
    request.stream_id = Some(promised_stream_id);
    request.request_headers = request_headers.clone();
    request.protocol = Some("HTTP/2".to_string());
    request.start = Some(ev.time);
    if let Some(socket_id) = session_socket {
        request.socket = Some(socket_id);
    }

    let stream = stream_mut(store, ev.source_id, promised_stream_id);
    stream.url = Some(url);
    stream.pushed = true;
    stream.url_request = Some(phantom_id);
    stream.request_headers = request_headers;
}

/// Finds the regular `UrlRequest` the browser created for the same URL the
/// push promise already covers, and marks it `phantom` so it's excluded
/// from output — the real data lives on the pushed stream instead.
fn handle_adopted_push_stream(store: &mut EntityStore, ev: &DispatchedEvent) {
    let Some(stream_id) = stream_id(&ev.params) else {
        return;
    };
    let Some(url) = store
        .h2_sessions
        .get(&ev.source_id)
        .and_then(|s| s.streams.get(&stream_id))
        .and_then(|s| s.url.clone())
    else {
        return;
    };
    let duplicate_id = store
        .url_requests
        .iter()
        .find(|(_, req)| !req.pushed && req.url.as_deref() == Some(url.as_str()))
        .map(|(id, _)| *id);
    if let Some(id) = duplicate_id {
        if let Some(req) = store.url_requests.get_mut(&id) {
            req.phantom = true;
        }
    }
}
