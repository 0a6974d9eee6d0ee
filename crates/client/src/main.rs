// crates/client/src/main.rs
//! reason-view binary.
//!
//! Connects to an agent backend, maintains the live task tree from the
//! event stream, polls conversation history, and logs timeline snapshots
//! as the state changes. Rendering proper lives in the web frontend; this
//! binary is the headless surface over the same engine.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use reason_view_client::{run_history_poller, run_stream, AgentClient, AgentConfig, DashboardStore};
use reason_view_core::impact::ImpactConfig;

#[derive(Debug, Parser)]
#[command(name = "reason-view", about = "Live view of an agent's reasoning pipeline")]
struct Args {
    /// Agent backend base URL.
    #[arg(long, env = "AGENT_URL", default_value = "http://127.0.0.1:8080/api")]
    agent_url: String,

    /// Bearer token for the authenticated endpoints.
    #[arg(long, env = "AGENT_TOKEN")]
    token: Option<String>,

    /// Channel to observe and interact on.
    #[arg(long, env = "AGENT_CHANNEL", default_value = "dashboard")]
    channel: String,

    /// History poll interval in seconds.
    #[arg(long, default_value_t = 3)]
    poll_secs: u64,
}

/// Keep one stream connection alive, reconnecting with capped backoff.
/// The library runs a single connection; the retry policy lives here.
async fn stream_with_reconnect(
    store: DashboardStore,
    config: AgentConfig,
    cancel: CancellationToken,
) {
    let mut backoff = Duration::from_secs(1);
    loop {
        match run_stream(store.clone(), config.clone(), cancel.clone()).await {
            Ok(()) => {
                if cancel.is_cancelled() {
                    return;
                }
                tracing::info!("stream closed, reconnecting");
                backoff = Duration::from_secs(1);
            }
            Err(e) => {
                tracing::warn!(backoff_secs = backoff.as_secs(), error = %e, "stream failed, will reconnect");
            }
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(backoff) => {}
        }
        backoff = (backoff * 2).min(Duration::from_secs(30));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = AgentConfig {
        base_url: args.agent_url,
        api_token: args.token,
        channel_id: args.channel,
        poll_interval: Duration::from_secs(args.poll_secs.max(1)),
        ..AgentConfig::default()
    };

    let store = DashboardStore::new();
    let client = AgentClient::new(config.clone());
    let cancel = CancellationToken::new();
    let impact_config = ImpactConfig::default();

    let poller = tokio::spawn(run_history_poller(
        store.clone(),
        client.clone(),
        cancel.clone(),
    ));
    let stream = tokio::spawn(stream_with_reconnect(
        store.clone(),
        config,
        cancel.clone(),
    ));

    let mut changes = store.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                cancel.cancel();
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let timeline = store.timeline().await;
                let tasks = store.tasks().await;
                let completed = tasks.iter().filter(|t| t.completed).count();
                match store.total_impact(&impact_config).await {
                    Some(total) => tracing::info!(
                        items = timeline.len(),
                        tasks = tasks.len(),
                        completed,
                        carbon_g = total.carbon_grams,
                        water_ml = total.water_ml,
                        tokens = total.tokens,
                        "timeline updated"
                    ),
                    None => tracing::info!(
                        items = timeline.len(),
                        tasks = tasks.len(),
                        completed,
                        "timeline updated (no impact data)"
                    ),
                }
            }
        }
    }

    let _ = poller.await;
    let _ = stream.await;
    Ok(())
}
