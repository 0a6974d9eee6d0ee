// crates/client/src/store.rs
//! Single authoritative dashboard state with a subscribe/notify contract.
//!
//! All mutation funnels through the store: the stream task applies event
//! batches, the poller replaces history, the submission path registers
//! acks. Readers clone snapshots under the read lock or await the watch
//! channel, which publishes a change sequence number after each effective
//! mutation. One write lock covers a whole stream batch, so a batch is
//! atomic with respect to rendering and rollup reads.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};

use reason_view_core::aggregate::{Task, TaskArena};
use reason_view_core::correlate::SubmissionRegistry;
use reason_view_core::event::StepEvent;
use reason_view_core::impact::{aggregate_impact, compute_impact, ImpactConfig, ImpactRollup};
use reason_view_core::timeline::{project_timeline, ChatMessage, TimelineItem};

#[derive(Debug, Default)]
struct StoreInner {
    arena: TaskArena,
    registry: SubmissionRegistry,
    history: Vec<ChatMessage>,
}

/// Shared handle to the dashboard state; clone freely across tasks.
#[derive(Clone)]
pub struct DashboardStore {
    inner: Arc<RwLock<StoreInner>>,
    notify: Arc<watch::Sender<u64>>,
}

impl DashboardStore {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            notify: Arc::new(notify),
        }
    }

    /// Await-able change signal. The value is a change sequence number.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    fn publish(&self) {
        self.notify.send_modify(|v| *v += 1);
    }

    /// Apply one decoded batch under a single write lock.
    ///
    /// Returns how many events mutated the tree. Dropped events (missing
    /// IDs) change nothing and publish nothing.
    pub async fn apply_events(&self, events: &[StepEvent]) -> usize {
        let applied = {
            let mut guard = self.inner.write().await;
            let StoreInner {
                arena, registry, ..
            } = &mut *guard;
            let mut applied = 0;
            for event in events {
                if arena.apply(event, registry.ours()) {
                    applied += 1;
                }
            }
            applied
        };
        if applied > 0 {
            self.publish();
        }
        applied
    }

    /// Record a submission acknowledgment.
    pub async fn register_submission(&self, task_id: &str, message_id: &str) {
        {
            let mut guard = self.inner.write().await;
            guard.registry.register(task_id, message_id);
        }
        self.publish();
    }

    /// Replace the polled conversation history. An identical poll result
    /// publishes nothing.
    pub async fn set_history(&self, messages: Vec<ChatMessage>) {
        let changed = {
            let mut guard = self.inner.write().await;
            if guard.history == messages {
                false
            } else {
                guard.history = messages;
                true
            }
        };
        if changed {
            self.publish();
        }
    }

    /// Current arena version.
    pub async fn version(&self) -> u64 {
        self.inner.read().await.arena.version()
    }

    /// Cloned snapshot of every observed task, oldest first.
    pub async fn tasks(&self) -> Vec<Task> {
        self.inner.read().await.arena.snapshot()
    }

    /// Project the merged timeline from the current state.
    pub async fn timeline(&self) -> Vec<TimelineItem> {
        let guard = self.inner.read().await;
        project_timeline(&guard.history, &guard.arena, &guard.registry)
    }

    /// Impact rollup for one task, if it has data.
    pub async fn impact(&self, task_id: &str, config: &ImpactConfig) -> Option<ImpactRollup> {
        let guard = self.inner.read().await;
        guard
            .arena
            .get(task_id)
            .and_then(|task| compute_impact(task, config))
    }

    /// Dashboard-wide impact totals across every task with data.
    pub async fn total_impact(&self, config: &ImpactConfig) -> Option<ImpactRollup> {
        let guard = self.inner.read().await;
        aggregate_impact(guard.arena.tasks(), config)
    }
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new()
    }
}
