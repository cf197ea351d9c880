use std::path::PathBuf;

use thiserror::Error;

/// Failures at the stream-runner/output-writer boundary (spec §7, kind 4
/// `IOError`): FIFO create/read and output write/compression errors are
/// logged by the caller; this type is what gets logged.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to create fifo at {path}: {source}")]
    Fifo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open netlog pipe: {0}")]
    Open(#[source] std::io::Error),
    #[error("failed to encode request output: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write request output: {0}")]
    Write(#[source] std::io::Error),
}
