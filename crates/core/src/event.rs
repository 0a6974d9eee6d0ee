// crates/core/src/event.rs
//! Wire types for the agent's `step_update` stream.
//!
//! Each frame carries an `events` array of pipeline-event records. The
//! envelope fields every record shares are typed here; stage-specific fields
//! stay in the raw record so stages carry their payload opaquely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The six pipeline phases a thought passes through.
///
/// Variant order follows the pipeline, so ordered stage maps iterate in
/// execution order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    ThoughtStart,
    SnapshotAndContext,
    MultiPerspectiveDecisionResults,
    ActionSelectionResult,
    ConscienceCheckResult,
    /// Execution result. Some agent builds emit the long spelling.
    #[serde(alias = "action_execution_result")]
    ActionResult,
}

/// Payload of a `step_update` frame.
#[derive(Debug, Clone, Deserialize)]
pub struct StepUpdate {
    /// Individual pipeline-event records, dispatched in array order.
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
}

/// One record from a `step_update` frame's `events` array.
#[derive(Debug, Clone, Deserialize)]
pub struct StepEvent {
    pub event_type: StageKind,
    #[serde(default)]
    pub thought_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub task_description: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Executed action on an `action_result` record, possibly qualified
    /// (e.g. `SPEAK.task_complete`).
    #[serde(default)]
    pub action_executed: Option<String>,
    /// Set on records belonging to a recursive re-evaluation pass.
    #[serde(default)]
    pub is_recursive: Option<bool>,
    /// The complete record as received. Populated by the dispatcher; kept
    /// as the opaque stage payload.
    #[serde(skip)]
    pub record: serde_json::Value,
}

impl StepEvent {
    /// Test/support constructor: an event with just the envelope identity.
    pub fn new(event_type: StageKind, task_id: &str, thought_id: &str) -> Self {
        Self {
            event_type,
            thought_id: Some(thought_id.to_string()),
            task_id: Some(task_id.to_string()),
            task_description: None,
            timestamp: None,
            action_executed: None,
            is_recursive: None,
            record: serde_json::Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_kind_parses_snake_case() {
        let kind: StageKind = serde_json::from_str("\"thought_start\"").unwrap();
        assert_eq!(kind, StageKind::ThoughtStart);
        let kind: StageKind = serde_json::from_str("\"conscience_check_result\"").unwrap();
        assert_eq!(kind, StageKind::ConscienceCheckResult);
    }

    #[test]
    fn action_result_accepts_both_spellings() {
        let short: StageKind = serde_json::from_str("\"action_result\"").unwrap();
        let long: StageKind = serde_json::from_str("\"action_execution_result\"").unwrap();
        assert_eq!(short, StageKind::ActionResult);
        assert_eq!(long, StageKind::ActionResult);
    }

    #[test]
    fn unknown_stage_kind_fails_to_parse() {
        assert!(serde_json::from_str::<StageKind>("\"coffee_break\"").is_err());
    }

    #[test]
    fn step_event_parses_with_optional_fields_missing() {
        let event: StepEvent = serde_json::from_str(
            "{\"event_type\":\"thought_start\",\"task_id\":\"A\",\"thought_id\":\"X\"}",
        )
        .unwrap();
        assert_eq!(event.event_type, StageKind::ThoughtStart);
        assert_eq!(event.task_id.as_deref(), Some("A"));
        assert_eq!(event.thought_id.as_deref(), Some("X"));
        assert!(event.timestamp.is_none());
        assert!(event.task_description.is_none());
    }

    #[test]
    fn step_event_parses_timestamp() {
        let event: StepEvent = serde_json::from_str(
            "{\"event_type\":\"action_result\",\"task_id\":\"A\",\"thought_id\":\"X\",\"timestamp\":\"2026-03-01T12:00:00Z\"}",
        )
        .unwrap();
        assert_eq!(
            event.timestamp.unwrap().to_rfc3339(),
            "2026-03-01T12:00:00+00:00"
        );
    }
}
