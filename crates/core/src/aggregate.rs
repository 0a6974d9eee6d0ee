// crates/core/src/aggregate.rs
//! The task arena: builds the Task → Thought → Stage tree from dispatched
//! pipeline events.
//!
//! Events arrive unordered and interleaved across tasks. The arena creates
//! entities lazily on first reference and never deletes them; they live for
//! the session and reset only on full reconnect. The arena has a single
//! owner (the dashboard store's write half); readers consume cloned
//! snapshots, and the `version` counter tells them when to re-read.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event::{StageKind, StepEvent};

/// Display palette cycled over tasks in creation order. Purely cosmetic,
/// never persisted.
pub const TASK_COLORS: [&str; 8] = [
    "#3b82f6", "#10b981", "#f59e0b", "#8b5cf6", "#ec4899", "#14b8a6", "#f97316", "#6366f1",
];

/// Executed actions that terminate a task.
const TERMINAL_ACTIONS: [&str; 2] = ["task_complete", "task_reject"];

/// One pipeline phase. Stages are only ever inserted fully formed; there is
/// no partial-stage state, so `completed` is true from insertion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub kind: StageKind,
    pub completed: bool,
    /// The full event record, shape depending on the stage kind.
    pub data: serde_json::Value,
}

/// One reasoning pass within a task.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    pub thought_id: String,
    /// At most one stage per kind; a later event of the same kind
    /// overwrites. Recursive re-evaluation passes reuse the kinds, so the
    /// second pass replaces the first here.
    pub stages: BTreeMap<StageKind, Stage>,
    /// Sticky: set once any stage record reports a recursive pass.
    pub is_recursive: bool,
}

impl Thought {
    fn new(thought_id: &str) -> Self {
        Self {
            thought_id: thought_id.to_string(),
            stages: BTreeMap::new(),
            is_recursive: false,
        }
    }
}

/// One unit of agent work, tracked end-to-end through the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    /// May stay empty until an early event supplies a description.
    pub description: String,
    pub color_tag: &'static str,
    /// Monotonic: set by a terminal action result, never cleared.
    pub completed: bool,
    /// Timestamp of the first event seen for this task; immutable.
    pub first_timestamp: DateTime<Utc>,
    /// Whether this client submitted the message that opened the task.
    /// Decided once, at creation time.
    pub is_ours: bool,
    /// Discovery order, unique by thought ID.
    pub thoughts: Vec<Thought>,
}

/// In-memory arena of every task observed this session.
#[derive(Debug, Default)]
pub struct TaskArena {
    tasks: HashMap<String, Task>,
    /// Creation-order counter driving palette assignment.
    color_cursor: usize,
    /// Bumped on every mutation that changed the tree.
    version: u64,
}

impl TaskArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Cloned snapshot of every task, oldest first.
    pub fn snapshot(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.values().cloned().collect();
        tasks.sort_by_key(|t| t.first_timestamp);
        tasks
    }

    /// Apply one pipeline event, mutating the tree.
    ///
    /// `ours` is the set of task IDs this client's submissions opened;
    /// membership is tested once, when the task is created. Events without
    /// both a non-empty task ID and thought ID are dropped (a no-op, not an
    /// error). Returns whether the tree changed.
    pub fn apply(&mut self, event: &StepEvent, ours: &HashSet<String>) -> bool {
        let (Some(task_id), Some(thought_id)) = (
            non_empty(event.task_id.as_deref()),
            non_empty(event.thought_id.as_deref()),
        ) else {
            tracing::debug!(kind = ?event.event_type, "dropping event without task/thought id");
            return false;
        };

        if !self.tasks.contains_key(task_id) {
            let color_tag = TASK_COLORS[self.color_cursor % TASK_COLORS.len()];
            self.color_cursor += 1;
            let is_ours = ours.contains(task_id);
            self.tasks.insert(
                task_id.to_string(),
                Task {
                    task_id: task_id.to_string(),
                    description: String::new(),
                    color_tag,
                    completed: false,
                    first_timestamp: event.timestamp.unwrap_or_else(Utc::now),
                    is_ours,
                    thoughts: Vec::new(),
                },
            );
            tracing::debug!(task_id, is_ours, "task created");
        }
        let Some(task) = self.tasks.get_mut(task_id) else {
            return false;
        };

        if task.description.is_empty() {
            if let Some(description) = non_empty(event.task_description.as_deref()) {
                task.description = description.to_string();
            }
        }

        let idx = match task
            .thoughts
            .iter()
            .position(|t| t.thought_id == thought_id)
        {
            Some(idx) => idx,
            None => {
                task.thoughts.push(Thought::new(thought_id));
                task.thoughts.len() - 1
            }
        };
        let thought = &mut task.thoughts[idx];

        if event.is_recursive == Some(true) {
            thought.is_recursive = true;
        }
        thought.stages.insert(
            event.event_type,
            Stage {
                kind: event.event_type,
                completed: true,
                data: event.record.clone(),
            },
        );

        if event.event_type == StageKind::ActionResult && !task.completed {
            if let Some(action) = event.action_executed.as_deref() {
                if is_terminal_action(action) {
                    task.completed = true;
                    tracing::debug!(task_id, action, "task reached terminal action");
                }
            }
        }

        self.version += 1;
        true
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Whether an executed action terminates its task. The action may be
/// qualified (`SPEAK.task_complete`); only the segment after the last `.`
/// counts.
fn is_terminal_action(action: &str) -> bool {
    let name = action.rsplit('.').next().unwrap_or(action);
    TERMINAL_ACTIONS.iter().any(|t| name.eq_ignore_ascii_case(t))
}
