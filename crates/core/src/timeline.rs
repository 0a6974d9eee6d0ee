// crates/core/src/timeline.rs
//! Chronological projection of conversation history and observed tasks.
//!
//! The projection owns no state: it is recomputed from the current history,
//! arena, and registry whenever either source changes. History polling and
//! the event stream are unordered relative to each other, so a just-sent
//! message whose task has not arrived yet simply renders without one until
//! the next recompute.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Task, TaskArena};
use crate::correlate::SubmissionRegistry;

/// A conversation message from the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub is_agent: bool,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// One row of the merged timeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineItem {
    /// A chat message, carrying its originating task when this client sent
    /// the message and the ack has been correlated.
    Message {
        message: ChatMessage,
        task: Option<Task>,
    },
    /// A task not attached to any message (system-originated, or ours but
    /// not yet linked).
    Task { task: Task },
}

impl TimelineItem {
    /// Sort key for the chronological merge.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TimelineItem::Message { message, .. } => message.timestamp,
            TimelineItem::Task { task } => task.first_timestamp,
        }
    }
}

/// Merge messages and unattached tasks into one ascending timeline.
///
/// A task attaches to at most one message; tasks attached to none appear
/// standalone exactly once. Ties keep construction order (stable sort).
pub fn project_timeline(
    messages: &[ChatMessage],
    arena: &TaskArena,
    registry: &SubmissionRegistry,
) -> Vec<TimelineItem> {
    let mut attached: HashSet<String> = HashSet::new();
    let mut items: Vec<TimelineItem> = Vec::with_capacity(messages.len() + arena.len());

    for message in messages {
        let task = match registry.task_for_message(&message.id) {
            Some(task_id) if !attached.contains(task_id) => match arena.get(task_id) {
                Some(task) => {
                    attached.insert(task_id.to_string());
                    Some(task.clone())
                }
                // Correlated but not yet observed on the stream.
                None => None,
            },
            _ => None,
        };
        items.push(TimelineItem::Message {
            message: message.clone(),
            task,
        });
    }

    // Standalone tasks, anchored to first_timestamp before the stable merge
    // (the arena map has no inherent order).
    let mut standalone: Vec<&Task> = arena
        .tasks()
        .filter(|t| !attached.contains(t.task_id.as_str()))
        .collect();
    standalone.sort_by_key(|t| t.first_timestamp);
    items.extend(
        standalone
            .into_iter()
            .map(|task| TimelineItem::Task { task: task.clone() }),
    );

    items.sort_by_key(TimelineItem::timestamp);
    items
}
