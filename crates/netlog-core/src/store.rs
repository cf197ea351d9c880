use std::collections::HashMap;

use netlog_model::{
    ConnectJob, DiskCacheUrlHint, DnsJob, H2Session, QuicSession, RequestRecord, Socket,
    SocketKind, StreamJob, UrlRequest,
};
use serde_json::Value;

use crate::constants::ConstantTables;
use crate::dispatch::{self, HandlerKind};
use crate::handlers;
use crate::post;

/// The cross-indexed in-memory entity graph (spec §4.D).
///
/// Every cross-reference between entities (`socket`, `h2_session`, `dns`,
/// `url_request`, ...) is a bare id, never a pointer — that's what lets
/// [`clear_requests`](Self::clear_requests) drop request-scoped entities
/// wholesale without having to untangle ownership between sockets,
/// sessions, and requests.
#[derive(Debug, Default)]
pub struct EntityStore {
    constants: ConstantTables,

    pub(crate) dns_jobs: HashMap<i64, DnsJob>,
    pub(crate) connect_jobs: HashMap<i64, ConnectJob>,
    pub(crate) stream_jobs: HashMap<i64, StreamJob>,
    pub(crate) sockets: HashMap<i64, Socket>,
    pub(crate) h2_sessions: HashMap<i64, H2Session>,
    pub(crate) quic_sessions: HashMap<i64, QuicSession>,
    pub(crate) url_requests: HashMap<i64, UrlRequest>,
    /// Insertion order of `url_requests`, for the stable iteration order
    /// post-processing relies on (spec §4.D). Entries whose id has since
    /// been re-keyed away (redirect) are filtered out on read.
    url_request_order: Vec<i64>,
    pub(crate) disk_cache_hints: HashMap<String, DiskCacheUrlHint>,

    /// Synthetic ids for push-promise phantoms and redirect re-keying,
    /// allocated downward from -1 so they never collide with a producer
    /// id (NetLog source ids are always non-negative).
    next_synthetic_id: i64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            next_synthetic_id: -1,
            ..Self::default()
        }
    }

    pub fn load_constants(&mut self, constants: &Value) {
        self.constants = ConstantTables::from_value(constants);
    }

    /// Decode, route, and apply one raw NetLog event line.
    ///
    /// Non-fatal conditions (unresolved codes, unroutable source kinds,
    /// dangling `source_dependency` references inside handlers) are logged
    /// and otherwise silently absorbed, per spec §7.
    pub fn handle_event(&mut self, raw: &Value) {
        let Some(event) = dispatch::dispatch(&self.constants, raw) else {
            tracing::debug!(?raw, "dropping event with unresolved code or bad envelope");
            return;
        };
        let Some(kind) = dispatch::route(&event.event_name, event.source_kind.as_deref()) else {
            tracing::debug!(
                event = %event.event_name,
                source_kind = ?event.source_kind,
                "no handler for source kind; ignoring"
            );
            return;
        };
        match kind {
            HandlerKind::Dns => handlers::dns::handle(self, &event),
            HandlerKind::ConnectJob => handlers::connect_job::handle(self, &event),
            HandlerKind::StreamJob => handlers::stream_job::handle(self, &event),
            HandlerKind::Socket => handlers::socket::handle(self, &event, SocketKind::Tcp),
            HandlerKind::UdpSocket => handlers::socket::handle(self, &event, SocketKind::Udp),
            HandlerKind::Http2Session => handlers::h2::handle(self, &event),
            HandlerKind::QuicSession => handlers::quic::handle(self, &event),
            HandlerKind::UrlRequest => handlers::url_request::handle(self, &event),
            HandlerKind::DiskCache => handlers::disk_cache::handle(self, &event),
        }
    }

    /// Wipe request-scoped entities but keep constants and the long-lived
    /// socket/session state that persists across recording windows
    /// (connection reuse is the whole point of keeping it).
    pub fn clear_requests(&mut self) {
        self.url_requests.clear();
        self.url_request_order.clear();
        self.stream_jobs.clear();
        self.connect_jobs.clear();
        self.dns_jobs.clear();
        self.disk_cache_hints.clear();
        for session in self.h2_sessions.values_mut() {
            session.streams.clear();
        }
        for session in self.quic_sessions.values_mut() {
            session.streams.clear();
        }
    }

    /// Join the entity graph into the output request records (spec §4.F).
    pub fn run_post_process(&self) -> Vec<RequestRecord> {
        post::process(self)
    }

    pub(crate) fn next_synthetic_id(&mut self) -> i64 {
        let id = self.next_synthetic_id;
        self.next_synthetic_id -= 1;
        id
    }

    pub(crate) fn dns_job(&mut self, id: i64) -> &mut DnsJob {
        self.dns_jobs.entry(id).or_default()
    }

    pub(crate) fn connect_job(&mut self, id: i64, created: i64) -> &mut ConnectJob {
        self.connect_jobs
            .entry(id)
            .or_insert_with(|| ConnectJob {
                created,
                ..Default::default()
            })
    }

    pub(crate) fn stream_job(&mut self, id: i64, created: i64) -> &mut StreamJob {
        self.stream_jobs.entry(id).or_insert_with(|| StreamJob {
            created,
            ..Default::default()
        })
    }

    pub(crate) fn socket(&mut self, id: i64, kind: SocketKind) -> &mut Socket {
        self.sockets.entry(id).or_insert_with(|| Socket::new(kind))
    }

    pub(crate) fn h2_session(&mut self, id: i64) -> &mut H2Session {
        self.h2_sessions.entry(id).or_default()
    }

    pub(crate) fn quic_session(&mut self, id: i64) -> &mut QuicSession {
        self.quic_sessions.entry(id).or_default()
    }

    /// Get-or-create a URL request, recording first-seen order.
    pub(crate) fn url_request(&mut self, id: i64, created: i64) -> &mut UrlRequest {
        if !self.url_requests.contains_key(&id) {
            self.url_requests.insert(id, UrlRequest::new(created));
            self.url_request_order.push(id);
        }
        self.url_requests.get_mut(&id).expect("just inserted")
    }

    /// Re-key a URL request under a fresh synthetic id (redirect handling,
    /// invariant 6), returning the new id. The old id is freed for the
    /// follow-up request the browser will emit next.
    pub(crate) fn rekey_url_request(&mut self, old_id: i64) -> Option<i64> {
        let request = self.url_requests.remove(&old_id)?;
        let new_id = self.next_synthetic_id();
        self.url_requests.insert(new_id, request);
        if let Some(slot) = self.url_request_order.iter_mut().find(|i| **i == old_id) {
            *slot = new_id;
        }
        Some(new_id)
    }

    pub(crate) fn record_disk_cache_hint(&mut self, url: String, start: i64) {
        self.disk_cache_hints
            .entry(url)
            .or_insert(DiskCacheUrlHint { start });
    }

    /// Url requests in first-seen order, skipping any id that was re-keyed
    /// away and never replaced with a new entry in that storage slot.
    pub(crate) fn url_requests_in_order(&self) -> impl Iterator<Item = (i64, &UrlRequest)> {
        self.url_request_order
            .iter()
            .filter_map(|id| self.url_requests.get(id).map(|req| (*id, req)))
    }
}
