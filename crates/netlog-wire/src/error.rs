use thiserror::Error;

/// Failure decoding a single line of a NetLog capture.
///
/// Per-line decode failures are recoverable: the caller logs and skips the
/// line rather than aborting the whole capture (see spec §7).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed json on line {line}: {source}")]
    Json {
        line: u64,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected a number or numeric string, got {value}")]
    NotNumeric { value: String },
}
