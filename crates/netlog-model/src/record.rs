use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Chunk;

/// One fully-joined request, as emitted in the per-recording-window output
/// array. All timing fields are milliseconds relative to the inferred
/// `start_time` of the window (spec §4.F step 10) — nothing here is in the
/// producer's native microsecond units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: i64,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    pub start: i64,
    pub end: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_byte: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_end: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_end: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_end: Option<i64>,
    #[serde(default)]
    pub request_headers: Vec<String>,
    #[serde(default)]
    pub response_headers: Vec<String>,
    pub bytes_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncompressed_bytes_in: Option<i64>,
    #[serde(default)]
    pub chunks: Vec<Chunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificates: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_next_proto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_cipher_suite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_resumed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http2_server_settings: Option<HashMap<String, i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pushed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
}
