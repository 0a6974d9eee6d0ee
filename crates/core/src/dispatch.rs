// crates/core/src/dispatch.rs
//! Frame payload parsing and per-record routing.
//!
//! Only one frame type carries semantic content: `step_update`, whose
//! payload holds an ordered `events` array. Everything else on the stream
//! (heartbeats, summaries) yields an empty batch.

use crate::decoder::Frame;
use crate::error::DispatchError;
use crate::event::{StepEvent, StepUpdate};

/// The one frame type the aggregator consumes.
pub const STEP_UPDATE_EVENT: &str = "step_update";

/// Parse a frame into the pipeline-event records it carries, in array order.
///
/// A payload that fails to parse fails this frame alone
/// ([`DispatchError::MalformedPayload`]); callers log it and keep the stream
/// alive. A record inside a well-formed payload that fails to deserialize is
/// dropped by itself; its siblings still dispatch.
pub fn parse_step_update(frame: &Frame) -> Result<Vec<StepEvent>, DispatchError> {
    if frame.event != STEP_UPDATE_EVENT {
        return Ok(Vec::new());
    }

    let update: StepUpdate = serde_json::from_str(&frame.data)
        .map_err(|source| DispatchError::MalformedPayload { source })?;

    let mut events = Vec::with_capacity(update.events.len());
    for record in update.events {
        match serde_json::from_value::<StepEvent>(record.clone()) {
            Ok(mut event) => {
                event.record = record;
                events.push(event);
            }
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed pipeline event record");
            }
        }
    }
    Ok(events)
}
