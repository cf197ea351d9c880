use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Chunk, RawTime, SourceId};

/// A DNS resolution job (`HOST_RESOLVER_IMPL_JOB` and friends).
///
/// `start`/`end` bracket the whole job (earliest BEGIN, latest END); `times`
/// holds the individual attempt windows the handler falls back to when the
/// REQUEST-level markers never arrive, and is the raw material the
/// post-processor aggregates into per-host DNS windows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnsJob {
    pub host: Option<String>,
    pub start: Option<RawTime>,
    pub end: Option<RawTime>,
    pub address_list: Vec<String>,
    pub times: Vec<(RawTime, RawTime)>,
}

impl DnsJob {
    /// `end - start`, if both ends of the window are known.
    pub fn elapsed(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(s), Some(e)) => Some(e - s),
            _ => None,
        }
    }
}

/// A `CONNECT_JOB` / `SSL_CONNECT_JOB` / `TRANSPORT_CONNECT_JOB`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectJob {
    pub created: RawTime,
    pub connect_start: Option<RawTime>,
    pub connect_end: Option<RawTime>,
    pub group: Option<String>,
    pub dns: Option<SourceId>,
    pub socket: Option<SourceId>,
}

/// An `HTTP_STREAM_JOB`: selects or creates the socket/session a request
/// ultimately rides on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamJob {
    pub created: RawTime,
    pub group: Option<String>,
    pub socket_start: Option<RawTime>,
    pub socket_end: Option<RawTime>,
    pub socket: Option<SourceId>,
    pub url_request: Option<SourceId>,
    pub h2_session: Option<SourceId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketKind {
    Tcp,
    Udp,
}

/// A `SOCKET` or `UDP_SOCKET` entity.
///
/// `claimed` is flipped by at most one request during post-processing
/// (invariant 3): the claiming request inherits the one-time connection
/// timings; everyone else on the socket gets address/group only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Socket {
    pub kind: SocketKind,
    pub address: Option<String>,
    pub source_address: Option<String>,
    pub group: Option<String>,
    pub connect_start: Option<RawTime>,
    pub connect_end: Option<RawTime>,
    pub ssl_start: Option<RawTime>,
    pub ssl_end: Option<RawTime>,
    pub bytes_in: i64,
    pub bytes_out: i64,
    pub chunks_in: Vec<Chunk>,
    pub chunks_out: Vec<Chunk>,
    pub certificates: Vec<String>,
    pub tls_version: Option<String>,
    pub tls_resumed: Option<bool>,
    pub tls_next_proto: Option<String>,
    pub tls_cipher_suite: Option<String>,
    pub h2_session: Option<SourceId>,
    pub claimed: bool,
}

impl Socket {
    pub fn new(kind: SocketKind) -> Self {
        Self {
            kind,
            address: None,
            source_address: None,
            group: None,
            connect_start: None,
            connect_end: None,
            ssl_start: None,
            ssl_end: None,
            bytes_in: 0,
            bytes_out: 0,
            chunks_in: Vec::new(),
            chunks_out: Vec::new(),
            certificates: Vec::new(),
            tls_version: None,
            tls_resumed: None,
            tls_next_proto: None,
            tls_cipher_suite: None,
            h2_session: None,
            claimed: false,
        }
    }
}

/// One stream within an [`H2Session`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Http2Stream {
    pub start: Option<RawTime>,
    pub first_byte: Option<RawTime>,
    pub end: Option<RawTime>,
    pub bytes_in: i64,
    pub chunks: Vec<Chunk>,
    pub request_headers: Vec<String>,
    pub response_headers: Vec<String>,
    pub exclusive: Option<bool>,
    pub parent_stream_id: Option<i64>,
    pub weight: Option<i64>,
    pub url: Option<String>,
    pub url_request: Option<SourceId>,
    pub pushed: bool,
}

/// An `HTTP2_SESSION`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct H2Session {
    pub host: Option<String>,
    pub protocol: Option<String>,
    pub socket: Option<SourceId>,
    pub server_settings: HashMap<String, i64>,
    pub streams: HashMap<i64, Http2Stream>,
}

/// One stream within a [`QuicSession`]; mirrors [`Http2Stream`] minus the
/// HTTP/2-specific priority tuple, which QUIC streams don't carry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuicStream {
    pub start: Option<RawTime>,
    pub first_byte: Option<RawTime>,
    pub end: Option<RawTime>,
    pub bytes_in: i64,
    pub chunks: Vec<Chunk>,
    pub request_headers: Vec<String>,
    pub response_headers: Vec<String>,
    pub url: Option<String>,
    pub url_request: Option<SourceId>,
    pub pushed: bool,
}

/// A `QUIC_SESSION`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuicSession {
    pub host: Option<String>,
    pub port: Option<i64>,
    pub version: Option<String>,
    pub peer_address: Option<String>,
    pub self_address: Option<String>,
    pub connect_start: Option<RawTime>,
    pub connect_end: Option<RawTime>,
    pub tls_start: Option<RawTime>,
    pub tls_end: Option<RawTime>,
    pub streams: HashMap<i64, QuicStream>,
}

/// A `URL_REQUEST`, the unit the post-processor ultimately emits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlRequest {
    pub created: RawTime,
    pub start: Option<RawTime>,
    pub first_byte: Option<RawTime>,
    pub end: Option<RawTime>,
    pub method: Option<String>,
    pub url: Option<String>,
    pub priority: Option<String>,
    pub request_headers: Vec<String>,
    pub response_headers: Vec<String>,
    pub early_hints_headers: Vec<String>,
    pub line: Option<String>,
    pub protocol: Option<String>,
    pub bytes_in: i64,
    pub uncompressed_bytes_in: Option<i64>,
    pub chunks: Vec<Chunk>,
    pub has_raw_bytes: bool,
    pub stream_id: Option<i64>,
    pub socket: Option<SourceId>,
    pub h2_session: Option<SourceId>,
    pub group: Option<String>,
    pub from_net: bool,
    pub phantom: bool,
    pub pushed: bool,
    pub status: Option<i64>,
}

impl UrlRequest {
    pub fn new(created: RawTime) -> Self {
        Self {
            created,
            ..Default::default()
        }
    }
}

/// A URL observed by the disk cache, recorded so a connection that never
/// fires can still be synthesized as a failed request if the same URL
/// appears here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DiskCacheUrlHint {
    pub start: RawTime,
}
