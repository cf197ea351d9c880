use thiserror::Error;

/// Failures that abort an operation outright, as opposed to the
/// per-event `UnknownCode`/`DanglingReference` conditions, which are
/// logged and silently dropped in place (spec §7) rather than surfaced
/// as `Result::Err`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("constants preamble is not a JSON object")]
    InvalidConstants,
}
