// crates/client/src/config.rs
//! Connection settings for the agent backend.

use std::time::Duration;

/// Where and how to reach the agent's API and event stream.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the agent backend (e.g. `http://127.0.0.1:8080/api`).
    pub base_url: String,
    /// Bearer token for the authenticated endpoints. None = unauthenticated.
    pub api_token: Option<String>,
    /// Channel this dashboard session observes and interacts on.
    pub channel_id: String,
    /// Fixed history polling interval. Transient poll errors do not back
    /// this off.
    pub poll_interval: Duration,
    /// Number of recent messages fetched per poll.
    pub history_limit: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("AGENT_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080/api".into()),
            api_token: std::env::var("AGENT_TOKEN").ok(),
            channel_id: std::env::var("AGENT_CHANNEL").unwrap_or_else(|_| "dashboard".into()),
            poll_interval: Duration::from_secs(3),
            history_limit: 50,
        }
    }
}

impl AgentConfig {
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn stream_url(&self) -> String {
        format!("{}/v1/agent/stream", self.base())
    }

    pub fn interact_url(&self) -> String {
        format!("{}/v1/agent/interact", self.base())
    }

    pub fn history_url(&self) -> String {
        format!("{}/v1/agent/history", self.base())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_tolerate_trailing_slash() {
        let config = AgentConfig {
            base_url: "http://localhost:8080/api/".into(),
            ..AgentConfig::default()
        };
        assert_eq!(config.stream_url(), "http://localhost:8080/api/v1/agent/stream");
        assert_eq!(
            config.interact_url(),
            "http://localhost:8080/api/v1/agent/interact"
        );
        assert_eq!(
            config.history_url(),
            "http://localhost:8080/api/v1/agent/history"
        );
    }
}
