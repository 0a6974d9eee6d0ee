// crates/client/src/poller.rs
//! Fixed-interval conversation-history poller.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::AgentClient;
use crate::store::DashboardStore;

/// Poll the history endpoint on the configured interval until cancelled.
///
/// Transient fetch errors are non-fatal and do not back the interval off;
/// the next tick simply tries again. No ordering is assumed relative to
/// the event stream; the store's projection tolerates either source
/// landing first.
pub async fn run_history_poller(
    store: DashboardStore,
    client: AgentClient,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(client.config().poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("history poller cancelled");
                return;
            }
            _ = ticker.tick() => {
                match client.fetch_history().await {
                    Ok(messages) => {
                        debug!(count = messages.len(), "history poll");
                        store.set_history(messages).await;
                    }
                    Err(e) => warn!(error = %e, "history poll failed (non-fatal)"),
                }
            }
        }
    }
}
