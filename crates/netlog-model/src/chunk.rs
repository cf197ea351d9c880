use serde::{Deserialize, Serialize};

use crate::RawTime;

/// One timestamped read/write on a socket or stream, used for both byte
/// accounting and (eventually) bandwidth-over-time plots downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub ts: RawTime,
    pub bytes: i64,
}
