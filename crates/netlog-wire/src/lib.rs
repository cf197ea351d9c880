//! Wire-level decoding for Chrome NetLog's line-framed JSON stream.
//!
//! A NetLog capture is not one JSON document: it is a constants preamble,
//! an `"events": [` marker, and then one JSON object per line until the
//! stream closes. [`framer::LineFramer`] turns that byte stream into typed
//! frames; [`ids`] holds the small numeric-coercion helpers the original
//! Chrome/wptagent pipeline leans on throughout.

mod error;
mod framer;
mod ids;

pub use error::DecodeError;
pub use framer::{Frame, LineFramer};
pub use ids::{coerce_id, coerce_int};
