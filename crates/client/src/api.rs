// crates/client/src/api.rs
//! Typed client for the agent's interact and history endpoints.

use serde::Deserialize;
use thiserror::Error;

use reason_view_core::timeline::ChatMessage;

use crate::config::AgentConfig;

/// Errors from the request/response API paths.
///
/// A rejected submission is NOT an error: it is a normal terminal outcome,
/// surfaced as [`SubmitOutcome::Rejected`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status} from {endpoint}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },
}

/// Result of submitting a message to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The agent accepted the message and opened a task for it.
    Accepted { task_id: String, message_id: String },
    /// The agent declined, with the server-supplied reason.
    Rejected {
        reason: String,
        detail: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    accepted: bool,
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

/// Thin typed client over the agent's REST surface.
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    config: AgentConfig,
}

impl AgentClient {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Submit free text on the configured channel.
    ///
    /// On acceptance the ack carries the `(task_id, message_id)` pair the
    /// caller should register with the store so the task is recognized as
    /// ours when it shows up on the stream.
    pub async fn submit_message(&self, message: &str) -> Result<SubmitOutcome, ClientError> {
        let response = self
            .authorize(self.http.post(self.config.interact_url()))
            .json(&serde_json::json!({
                "message": message,
                "channel_id": self.config.channel_id,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                endpoint: "interact",
                status: response.status(),
            });
        }

        let body: SubmitResponse = response.json().await?;
        if body.accepted {
            Ok(SubmitOutcome::Accepted {
                task_id: body.task_id.unwrap_or_default(),
                message_id: body.message_id.unwrap_or_default(),
            })
        } else {
            Ok(SubmitOutcome::Rejected {
                reason: body.reason.unwrap_or_else(|| "rejected".into()),
                detail: body.detail,
            })
        }
    }

    /// Fetch the most recent messages on the configured channel, oldest
    /// first.
    pub async fn fetch_history(&self) -> Result<Vec<ChatMessage>, ClientError> {
        let limit = self.config.history_limit.to_string();
        let response = self
            .authorize(self.http.get(self.config.history_url()))
            .query(&[
                ("channel_id", self.config.channel_id.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                endpoint: "history",
                status: response.status(),
            });
        }

        let body: HistoryResponse = response.json().await?;
        Ok(body.messages)
    }
}
