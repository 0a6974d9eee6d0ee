// crates/core/src/error.rs
use thiserror::Error;

/// Errors surfaced while interpreting a decoded stream frame.
///
/// These never tear the stream down; callers log the frame and keep
/// consuming.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("malformed step_update payload: {source}")]
    MalformedPayload {
        #[source]
        source: serde_json::Error,
    },
}
