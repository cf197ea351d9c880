use netlog_model::{headers::normalize_headers, Chunk, UrlRequest};
use serde_json::Value;

use crate::dispatch::DispatchedEvent;
use crate::store::EntityStore;

/// `URL_REQUEST`.
pub(crate) fn handle(store: &mut EntityStore, ev: &DispatchedEvent) {
    // Re-keys first (invariant 6): once moved, `ev.source_id` no longer
    // names the live entity, so no other branch applies to this event.
    if ev.event_name == "URL_REQUEST_REDIRECTED" {
        store.rekey_url_request(ev.source_id);
        return;
    }

    let request = store.url_request(ev.source_id, ev.time);
    apply_common_params(request, &ev.params);

    match ev.event_name.as_str() {
        "HTTP_TRANSACTION_SEND_REQUEST" => {
            request.start.get_or_insert(ev.time);
        }
        "HTTP_TRANSACTION_SEND_REQUEST_HEADERS" => {
            request.request_headers = normalize_headers(&ev.params["headers"]);
            request.start.get_or_insert(ev.time);
        }
        "HTTP_TRANSACTION_HTTP2_SEND_REQUEST_HEADERS" => {
            request.request_headers = normalize_headers(&ev.params["headers"]);
            request.protocol = Some("HTTP/2".to_string());
            request.start.get_or_insert(ev.time);
        }
        "HTTP_TRANSACTION_QUIC_SEND_REQUEST_HEADERS" => {
            request.request_headers = normalize_headers(&ev.params["headers"]);
            request.protocol = Some("QUIC".to_string());
            request.start.get_or_insert(ev.time);
        }
        "HTTP_TRANSACTION_READ_RESPONSE_HEADERS" => {
            request.first_byte.get_or_insert(ev.time);
            request.end = Some(ev.time);
            request.response_headers = normalize_headers(&ev.params["headers"]);
        }
        "HTTP_TRANSACTION_READ_EARLY_HINTS_RESPONSE_HEADERS" => {
            request.early_hints_headers = normalize_headers(&ev.params["headers"]);
        }
        "URL_REQUEST_JOB_BYTES_READ" => {
            let bytes = byte_count(&ev.params);
            request.has_raw_bytes = true;
            request.bytes_in += bytes;
            request.chunks.push(Chunk { ts: ev.time, bytes });
        }
        "URL_REQUEST_JOB_FILTERED_BYTES_READ" => {
            let bytes = byte_count(&ev.params);
            request.uncompressed_bytes_in = Some(request.uncompressed_bytes_in.unwrap_or(0) + bytes);
            // Only the raw wire counter should contribute to bytes_in once
            // it starts reporting; until then the decoded count stands in.
            if !request.has_raw_bytes {
                request.bytes_in += bytes;
                request.chunks.push(Chunk { ts: ev.time, bytes });
            }
        }
        _ => {}
    }
}

fn byte_count(params: &Value) -> i64 {
    params.get("byte_count").and_then(Value::as_i64).unwrap_or(0)
}

fn apply_common_params(request: &mut UrlRequest, params: &Value) {
    if let Some(priority) = params.get("priority").and_then(Value::as_str) {
        request.priority = Some(priority.to_string());
    }
    if let Some(method) = params.get("method").and_then(Value::as_str) {
        request.method = Some(method.to_string());
    }
    if let Some(url) = params.get("url").and_then(Value::as_str) {
        request.url = Some(strip_fragment(url));
    }
    if let Some(line) = params.get("line").and_then(Value::as_str) {
        request.line = Some(line.to_string());
    }
    if let Some(stream_id) = params.get("stream_id").and_then(Value::as_i64) {
        request.stream_id = Some(stream_id);
    }
}

fn strip_fragment(url: &str) -> String {
    match url.split_once('#') {
        Some((prefix, _)) => prefix.to_string(),
        None => url.to_string(),
    }
}
