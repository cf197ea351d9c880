use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use netlog_model::{Chunk, RequestRecord, Socket, UrlRequest};
use regex::Regex;

use crate::store::EntityStore;

/// `.../<host>:<port>` — the group-name pattern a stream-job's connection
/// group is built from, used to recover a hostname for failed-host
/// synthesis (spec §5).
static GROUP_HOST_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^.*/([^:]+):\d+$").unwrap());

/// Status Chrome's network stack reports for a connection that never
/// attached a socket (spec §4.F step 6).
const FAILED_HOST_STATUS: i64 = 12029;

/// A url request plus the fields post-processing joins onto it from its
/// socket/session/DNS attribution, before the final ms-normalization pass.
struct Working {
    id: i64,
    request: UrlRequest,
    connect_start: Option<i64>,
    connect_end: Option<i64>,
    ssl_start: Option<i64>,
    ssl_end: Option<i64>,
    dns_start: Option<i64>,
    dns_end: Option<i64>,
    server_address: Option<String>,
    client_address: Option<String>,
    certificates: Option<Vec<String>>,
    tls_version: Option<String>,
    tls_next_proto: Option<String>,
    tls_cipher_suite: Option<String>,
    tls_resumed: Option<bool>,
    http2_server_settings: Option<HashMap<String, i64>>,
}

impl Working {
    fn new(id: i64, request: UrlRequest) -> Self {
        Self {
            id,
            request,
            connect_start: None,
            connect_end: None,
            ssl_start: None,
            ssl_end: None,
            dns_start: None,
            dns_end: None,
            server_address: None,
            client_address: None,
            certificates: None,
            tls_version: None,
            tls_next_proto: None,
            tls_cipher_suite: None,
            tls_resumed: None,
            http2_server_settings: None,
        }
    }
}

struct DnsWindow {
    host: String,
    start: i64,
    end: i64,
    used: bool,
}

/// Join the entity graph into request records (spec §4.F, 10 steps).
pub fn process(store: &EntityStore) -> Vec<RequestRecord> {
    let mut working: Vec<Working> = store
        .url_requests_in_order()
        .map(|(id, req)| Working::new(id, req.clone()))
        .collect();

    mark_net_originated(&mut working);
    synthesize_urls(&mut working, store);
    repair_orphan_streams(&mut working, store);
    backfill_from_h2(&mut working, store);
    filter_phantoms(&mut working);
    synthesize_failed_hosts(&mut working, store);

    working.sort_by_key(|w| w.request.start.unwrap_or(w.request.created));

    attribute_sockets(&mut working, store);
    attribute_dns(&mut working, store);

    normalize_and_emit(working)
}

/// Step 1.
fn mark_net_originated(working: &mut [Working]) {
    for w in working {
        if w.request.start.is_some() {
            w.request.from_net = true;
        }
    }
}

/// Step 2.
fn synthesize_urls(working: &mut [Working], store: &EntityStore) {
    for w in working {
        if w.request.url.is_some() {
            continue;
        }
        let socket = w.request.socket.and_then(|id| store.sockets.get(&id));
        w.request.url = synthesize_url(&w.request, socket);
    }
}

fn synthesize_url(request: &UrlRequest, socket: Option<&Socket>) -> Option<String> {
    if request.request_headers.is_empty() {
        return None;
    }
    let host = get_header(&request.request_headers, ":authority")
        .or_else(|| get_header(&request.request_headers, ":host"))?;
    let path = get_header(&request.request_headers, ":path")
        .or_else(|| line_path(request.line.as_deref()))
        .unwrap_or_else(|| "/".to_string());
    let scheme = get_header(&request.request_headers, ":scheme")
        .or_else(|| line_scheme(request.line.as_deref()))
        .unwrap_or_else(|| {
            let has_certs = socket.is_some_and(|s| !s.certificates.is_empty());
            if has_certs { "https" } else { "http" }.to_string()
        });
    Some(format!("{scheme}://{host}{path}"))
}

fn line_scheme(line: Option<&str>) -> Option<String> {
    let uri = line?.split_whitespace().nth(1)?;
    uri.contains("://")
        .then(|| uri.split("://").next().unwrap().to_string())
}

fn line_path(line: Option<&str>) -> Option<String> {
    let uri = line?.split_whitespace().nth(1)?;
    match uri.find("://") {
        Some(idx) => {
            let after_authority = &uri[idx + 3..];
            let slash = after_authority.find('/').unwrap_or(after_authority.len());
            Some(after_authority[slash..].to_string())
        }
        None => Some(uri.to_string()),
    }
}

/// Step 3.
fn repair_orphan_streams(working: &mut [Working], store: &EntityStore) {
    for w in working {
        if w.request.h2_session.is_some() {
            continue;
        }
        let Some(stream_id) = w.request.stream_id else {
            continue;
        };
        let Some(request_host) = w.request.url.as_deref().and_then(url_host) else {
            continue;
        };
        let request_path = w.request.url.as_deref().and_then(url_path);

        for (&session_id, session) in &store.h2_sessions {
            if session.host.as_deref().map(host_only) != Some(host_only(request_host)) {
                continue;
            }
            let Some(stream) = session.streams.get(&stream_id) else {
                continue;
            };
            let stream_path = get_header(&stream.request_headers, ":path");
            if stream_path.is_some() && stream_path == request_path {
                w.request.h2_session = Some(session_id);
                w.request.socket = w.request.socket.or(session.socket);
                break;
            }
        }
    }
}

/// Step 4.
fn backfill_from_h2(working: &mut [Working], store: &EntityStore) {
    for w in working {
        let Some(session_id) = w.request.h2_session else {
            continue;
        };
        let Some(session) = store.h2_sessions.get(&session_id) else {
            continue;
        };
        w.request.socket = w.request.socket.or(session.socket);

        let Some(stream_id) = w.request.stream_id else {
            continue;
        };
        let Some(stream) = session.streams.get(&stream_id) else {
            continue;
        };
        if !stream.request_headers.is_empty() {
            w.request.request_headers = stream.request_headers.clone();
        }
        if !stream.response_headers.is_empty() {
            w.request.response_headers = stream.response_headers.clone();
        }
        if w.request.priority.is_none() {
            if let Some(weight) = stream.weight {
                w.request.priority = Some(priority_bucket(weight).to_string());
            }
        }
        if let Some(first_byte) = stream.first_byte {
            w.request.first_byte.get_or_insert(first_byte);
        }
        if let Some(end) = stream.end {
            w.request.end.get_or_insert(end);
        }
        if stream.bytes_in > w.request.bytes_in {
            w.request.bytes_in = stream.bytes_in;
            w.request.chunks = stream.chunks.clone();
        }
    }
}

fn priority_bucket(weight: i64) -> &'static str {
    if weight >= 256 {
        "HIGHEST"
    } else if weight >= 220 {
        "MEDIUM"
    } else if weight >= 183 {
        "LOW"
    } else if weight >= 147 {
        "LOWEST"
    } else {
        "IDLE"
    }
}

/// Step 5.
fn filter_phantoms(working: &mut Vec<Working>) {
    working.retain(|w| {
        !w.request.phantom
            && !w.request.request_headers.is_empty()
            && w.request
                .url
                .as_deref()
                .is_none_or(|u| !is_local_harness_url(u))
    });
}

fn is_local_harness_url(url: &str) -> bool {
    url.starts_with("http://127.0.0.1") || url.starts_with("http://192.168.10.")
}

/// Step 6.
fn synthesize_failed_hosts(working: &mut Vec<Working>, store: &EntityStore) {
    let known_hosts: HashSet<String> = working
        .iter()
        .filter_map(|w| w.request.url.as_deref())
        .filter_map(url_host)
        .map(|h| host_only(h).to_string())
        .collect();

    let mut next_id = working.iter().map(|w| w.id).min().unwrap_or(0).min(0) - 1;

    for job in store.stream_jobs.values() {
        if job.socket.is_some() {
            continue;
        }
        let Some(group) = &job.group else { continue };
        let Some(caps) = GROUP_HOST_RE.captures(group) else {
            continue;
        };
        let host = caps[1].to_string();
        if known_hosts.contains(&host) {
            continue;
        }
        let hint = store
            .disk_cache_hints
            .iter()
            .find(|(url, _)| url_host(url).map(host_only) == Some(host.as_str()));
        let Some((hint_url, hint)) = hint else { continue };

        let mut request = UrlRequest::new(job.created);
        request.url = Some(hint_url.clone());
        request.status = Some(FAILED_HOST_STATUS);
        request.start = Some(job.socket_start.unwrap_or(hint.start));
        request.end = job.socket_end.or(job.socket_start).or(Some(hint.start));
        request.request_headers = vec![format!(":authority: {host}")];

        let id = next_id;
        next_id -= 1;
        working.push(Working::new(id, request));
    }
}

/// Step 8.
fn attribute_sockets(working: &mut [Working], store: &EntityStore) {
    let mut claimed: HashSet<i64> = HashSet::new();
    for w in working.iter_mut() {
        let Some(socket_id) = w.request.socket else {
            continue;
        };
        let Some(socket) = store.sockets.get(&socket_id) else {
            continue;
        };
        w.server_address = socket.address.clone();
        w.client_address = socket.source_address.clone();

        if claimed.contains(&socket_id) {
            continue;
        }
        claimed.insert(socket_id);

        w.connect_start = socket.connect_start;
        w.connect_end = socket.connect_end;
        w.ssl_start = socket.ssl_start;
        w.ssl_end = socket.ssl_end;
        w.certificates = (!socket.certificates.is_empty()).then(|| socket.certificates.clone());
        w.tls_version = socket.tls_version.clone();
        w.tls_next_proto = socket.tls_next_proto.clone();
        w.tls_cipher_suite = socket.tls_cipher_suite.clone();
        w.tls_resumed = socket.tls_resumed;

        let h2_id = socket.h2_session.or(w.request.h2_session);
        if let Some(session) = h2_id.and_then(|id| store.h2_sessions.get(&id)) {
            if !session.server_settings.is_empty() {
                w.http2_server_settings = Some(session.server_settings.clone());
            }
        }
    }
}

/// Step 9.
fn attribute_dns(working: &mut [Working], store: &EntityStore) {
    let mut windows: Vec<DnsWindow> = Vec::new();
    for job in store.dns_jobs.values() {
        let Some(host) = &job.host else { continue };
        if let (Some(start), Some(end)) = (job.start, job.end) {
            windows.push(DnsWindow {
                host: host.clone(),
                start,
                end,
                used: false,
            });
        }
        for &(start, end) in &job.times {
            windows.push(DnsWindow {
                host: host.clone(),
                start,
                end,
                used: false,
            });
        }
    }

    for w in working.iter_mut() {
        let Some(connect_start) = w.connect_start else {
            continue;
        };
        if let Some(host) = w.request.url.as_deref().and_then(url_host) {
            if let Some((start, end)) = attribute(&mut windows, host_only(host), connect_start) {
                w.dns_start = Some(start);
                w.dns_end = Some(end);
            }
        }
    }
    for w in working.iter_mut() {
        if w.dns_start.is_some() {
            continue;
        }
        let Some(start_time) = w.request.start else {
            continue;
        };
        if let Some(host) = w.request.url.as_deref().and_then(url_host) {
            if let Some((start, end)) = attribute(&mut windows, host_only(host), start_time) {
                w.dns_start = Some(start);
                w.dns_end = Some(end);
            }
        }
    }
}

fn attribute(windows: &mut [DnsWindow], host: &str, at_or_before: i64) -> Option<(i64, i64)> {
    windows
        .iter_mut()
        .filter(|w| !w.used && w.host == host && w.end <= at_or_before)
        .max_by_key(|w| w.end - w.start)
        .map(|w| {
            w.used = true;
            (w.start, w.end)
        })
}

/// Step 10, plus the final RequestRecord projection.
fn normalize_and_emit(working: Vec<Working>) -> Vec<RequestRecord> {
    let mut min_time: Option<i64> = None;
    for w in &working {
        for t in [
            w.dns_start,
            w.dns_end,
            w.connect_start,
            w.connect_end,
            w.ssl_start,
            w.ssl_end,
            w.request.start,
            Some(w.request.created),
            w.request.first_byte,
            w.request.end,
        ]
        .into_iter()
        .flatten()
        {
            min_time = Some(min_time.map_or(t, |m| m.min(t)));
        }
    }
    let Some(min_time) = min_time else {
        return Vec::new();
    };
    let norm = move |t: Option<i64>| t.map(|v| (v - min_time) / 1000);

    working
        .into_iter()
        .map(|w| {
            let start = norm(w.request.start).unwrap_or_else(|| (w.request.created - min_time) / 1000);
            let end = norm(w.request.end).unwrap_or(start);
            RequestRecord {
                id: w.id,
                url: w.request.url.unwrap_or_default(),
                method: w.request.method,
                protocol: w.request.protocol,
                priority: w.request.priority,
                start,
                end,
                first_byte: norm(w.request.first_byte),
                connect_start: norm(w.connect_start),
                connect_end: norm(w.connect_end),
                ssl_start: norm(w.ssl_start),
                ssl_end: norm(w.ssl_end),
                dns_start: norm(w.dns_start),
                dns_end: norm(w.dns_end),
                request_headers: w.request.request_headers,
                response_headers: w.request.response_headers,
                bytes_in: w.request.bytes_in,
                uncompressed_bytes_in: w.request.uncompressed_bytes_in,
                chunks: w
                    .request
                    .chunks
                    .into_iter()
                    .map(|c| Chunk {
                        ts: (c.ts - min_time) / 1000,
                        bytes: c.bytes,
                    })
                    .collect(),
                server_address: w.server_address,
                client_address: w.client_address,
                certificates: w.certificates,
                tls_version: w.tls_version,
                tls_next_proto: w.tls_next_proto,
                tls_cipher_suite: w.tls_cipher_suite,
                tls_resumed: w.tls_resumed,
                http2_server_settings: w.http2_server_settings,
                stream_id: w.request.stream_id,
                pushed: w.request.pushed.then_some(true),
                status: w.request.status,
            }
        })
        .collect()
}

fn get_header(headers: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}: ");
    headers.iter().find_map(|h| h.strip_prefix(&prefix).map(str::to_owned))
}

fn url_host(url: &str) -> Option<&str> {
    let rest = url.split_once("://")?.1;
    Some(rest.split(['/', '?', '#']).next().unwrap_or(rest))
}

fn url_path(url: &str) -> Option<String> {
    let rest = url.split_once("://")?.1;
    match rest.find('/') {
        Some(idx) => Some(rest[idx..].to_string()),
        None => Some("/".to_string()),
    }
}

fn host_only(host: &str) -> &str {
    host.split(':').next().unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use netlog_model::SocketKind;

    fn request(created: i64, url: &str) -> UrlRequest {
        let mut r = UrlRequest::new(created);
        r.url = Some(url.to_string());
        r.request_headers = vec![":method: GET".to_string()];
        r.start = Some(created);
        r.end = Some(created + 10);
        r
    }

    #[test]
    fn single_request_over_fresh_socket_gets_full_timing() {
        let mut store = EntityStore::new();
        store.dns_job(1).host = Some("example.com".into());
        store.dns_job(1).start = Some(1_000);
        store.dns_job(1).end = Some(2_000);

        let socket = store.socket(2, SocketKind::Tcp);
        socket.connect_start = Some(2_000);
        socket.connect_end = Some(3_000);

        let req = store.url_request(3, 3_000);
        *req = request(3_000, "http://example.com/");
        req.socket = Some(2);

        let records = store.run_post_process();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.dns_start, Some(0));
        assert_eq!(record.dns_end, Some(1));
        assert_eq!(record.connect_start, Some(1));
        assert_eq!(record.connect_end, Some(2));
        assert!(record.start <= record.first_byte.unwrap_or(record.start));
    }

    #[test]
    fn second_request_on_shared_socket_has_no_connect_timings() {
        let mut store = EntityStore::new();
        let socket = store.socket(1, SocketKind::Tcp);
        socket.connect_start = Some(100);
        socket.connect_end = Some(200);
        socket.address = Some("1.2.3.4:443".into());

        let first = store.url_request(2, 200);
        *first = request(200, "http://example.com/a");
        first.socket = Some(1);

        let second = store.url_request(3, 300);
        *second = request(300, "http://example.com/b");
        second.socket = Some(1);

        let records = store.run_post_process();
        assert_eq!(records.len(), 2);
        let claimed_count = records.iter().filter(|r| r.connect_start.is_some()).count();
        assert_eq!(claimed_count, 1);
        assert!(records.iter().all(|r| r.server_address.is_some()));
    }

    #[test]
    fn phantom_push_placeholder_is_dropped_leaving_one_record() {
        let mut store = EntityStore::new();
        let session = store.h2_session(1);
        session.host = Some("example.com".into());

        // Regular browser-issued request, later marked phantom.
        let dup = store.url_request(2, 0);
        *dup = request(0, "https://example.com/app.js");
        dup.phantom = true;

        // Pushed placeholder, carrying real headers.
        let pushed = store.url_request(3, 0);
        *pushed = request(0, "https://example.com/app.js");
        pushed.pushed = true;
        pushed.h2_session = Some(1);

        let records = store.run_post_process();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pushed, Some(true));
    }

    #[test]
    fn failed_host_synthesizes_one_record_with_status_12029() {
        let mut store = EntityStore::new();
        store.record_disk_cache_hint("https://foo.example/".into(), 500);
        let job = store.stream_job(1, 400);
        job.group = Some("ssl/foo.example:443".into());
        job.socket_start = Some(450);
        job.socket_end = Some(900);

        let records = store.run_post_process();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, Some(12029));
        assert_eq!(records[0].url, "https://foo.example/");
    }

    #[test]
    fn empty_store_without_any_timing_yields_empty_output() {
        let store = EntityStore::new();
        assert!(store.run_post_process().is_empty());
    }

    #[test]
    fn local_harness_pages_are_filtered_out() {
        let mut store = EntityStore::new();
        let req = store.url_request(1, 0);
        *req = request(0, "http://127.0.0.1/ping");
        assert!(store.run_post_process().is_empty());
    }
}
