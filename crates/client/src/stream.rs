// crates/client/src/stream.rs
//! Event-stream consumer: connect, decode, dispatch, apply.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use reason_view_core::decoder::FrameDecoder;
use reason_view_core::dispatch::parse_step_update;

use crate::api::ClientError;
use crate::config::AgentConfig;
use crate::store::DashboardStore;

/// Consume the agent's event stream until end-of-stream, transport
/// failure, or cancellation.
///
/// Frames decoded from one transport chunk are dispatched and applied as a
/// single store batch before the next read, so concurrent readers never
/// observe half a batch. Cancellation is a clean exit and is never logged
/// as an error. The library runs exactly one connection; reconnect policy
/// belongs to the caller.
pub async fn run_stream(
    store: DashboardStore,
    config: AgentConfig,
    cancel: CancellationToken,
) -> Result<(), ClientError> {
    let http = reqwest::Client::new();
    let mut request = http.get(config.stream_url());
    if let Some(token) = &config.api_token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(ClientError::Status {
            endpoint: "stream",
            status: response.status(),
        });
    }
    info!(url = %config.stream_url(), "event stream connected");

    let mut chunks = response.bytes_stream();
    let mut decoder = FrameDecoder::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("event stream cancelled");
                return Ok(());
            }
            chunk = chunks.next() => {
                match chunk {
                    Some(Ok(bytes)) => {
                        let mut batch = Vec::new();
                        for frame in decoder.feed(&bytes) {
                            match parse_step_update(&frame) {
                                Ok(events) => batch.extend(events),
                                Err(e) => {
                                    warn!(event = %frame.event, error = %e, "discarding malformed frame");
                                }
                            }
                        }
                        if !batch.is_empty() {
                            let applied = store.apply_events(&batch).await;
                            debug!(events = batch.len(), applied, "applied stream batch");
                        }
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "event stream transport failure");
                        return Err(ClientError::Transport(e));
                    }
                    None => {
                        info!("event stream ended");
                        return Ok(());
                    }
                }
            }
        }
    }
}
