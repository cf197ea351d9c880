//! In-memory entity shapes for the NetLog correlator.
//!
//! All timestamps here are in the producer's native microsecond units
//! (spec invariant: only the final normalization pass rewrites them to
//! milliseconds relative to an inferred start time). Every cross-reference
//! (`socket`, `h2_session`, `dns`, `url_request`, ...) is a bare numeric id
//! handle rather than a pointer, so the store stays trivially clearable and
//! free of ownership cycles between sockets, sessions, and requests.

mod chunk;
mod entities;
pub mod headers;
mod record;

pub use chunk::Chunk;
pub use entities::{
    ConnectJob, DiskCacheUrlHint, DnsJob, H2Session, Http2Stream, QuicSession, QuicStream, Socket,
    SocketKind, StreamJob, UrlRequest,
};
pub use record::RequestRecord;

/// Opaque producer-assigned identifier, scoped to one entity kind.
pub type SourceId = i64;

/// Microsecond timestamp in producer-native units, prior to normalization.
pub type RawTime = i64;
