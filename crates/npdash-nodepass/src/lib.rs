//! Async client for the NodePass agent API
//!
//! Instance state changes are PATCHed to
//! `{url}{api_path}/instances/{instance_id}` with an `X-API-Key` header.
//! A single attempt is bounded by a timeout; on a connect-level failure the
//! attempt is repeated through clients pinned to one IP family, so dual-stack
//! agents stay reachable when one family is broken. HTTP errors and timeouts
//! are never retried.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Default bound on a single control attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Control action understood by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceAction {
    Start,
    Stop,
    Restart,
}

impl InstanceAction {
    /// Parse the exact wire form; anything else (case variants included) is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "restart" => Some(Self::Restart),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }
}

impl fmt::Display for InstanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection details of one agent.
#[derive(Debug, Clone)]
pub struct AgentEndpoint {
    /// Base URL (e.g. `http://10.0.0.5:3000`)
    pub url: String,
    /// API path prefix (e.g. `/api/v1`)
    pub api_path: String,
    /// API key credential
    pub api_key: String,
}

/// NodePass client errors
#[derive(Debug, Error)]
pub enum NodePassError {
    /// Agent answered with a non-success status.
    #[error("NodePass API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Transport-level fault: connection refused, DNS failure, timeout.
    #[error("NodePass transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Success status but the body was not valid JSON.
    #[error("NodePass response error: {message}")]
    Deserialization { message: String, body: String },

    /// API key contains bytes that cannot go into a header.
    #[error("invalid API key header value")]
    InvalidApiKey,

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

#[derive(Serialize)]
struct ActionBody {
    action: InstanceAction,
}

/// Async client for NodePass agents.
///
/// System proxy settings are honored through the underlying HTTP client's
/// environment support. One instance is shared across all agents; credentials
/// travel per call.
pub struct NodePassClient {
    http: reqwest::Client,
    /// Family-pinned clients for the dual-stack fallback path.
    http_v4: reqwest::Client,
    http_v6: reqwest::Client,
    timeout: Duration,
}

impl NodePassClient {
    /// Create a client with the default timeout.
    pub fn new() -> Result<Self, NodePassError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(NodePassError::ClientBuild)?;
        let http_v4 = reqwest::Client::builder()
            .local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
            .build()
            .map_err(NodePassError::ClientBuild)?;
        let http_v6 = reqwest::Client::builder()
            .local_address(IpAddr::V6(Ipv6Addr::UNSPECIFIED))
            .build()
            .map_err(NodePassError::ClientBuild)?;

        Ok(Self {
            http,
            http_v4,
            http_v6,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Request a state change for an instance and return the agent's payload.
    ///
    /// The payload is loosely structured and passed through uninterpreted.
    /// HTTP errors and transport faults come back as the same failure class;
    /// callers do not need to distinguish them.
    pub async fn update_instance(
        &self,
        endpoint: &AgentEndpoint,
        instance_id: &str,
        action: InstanceAction,
    ) -> Result<Value, NodePassError> {
        let url = format!(
            "{}{}/instances/{}",
            endpoint.url, endpoint.api_path, instance_id
        );

        let mut api_key =
            HeaderValue::from_str(&endpoint.api_key).map_err(|_| NodePassError::InvalidApiKey)?;
        api_key.set_sensitive(true);

        debug!("PATCH {url} action={action}");

        match self.attempt(&self.http, &url, &api_key, action).await {
            Err(NodePassError::Transport(ref err)) if err.is_connect() => {
                warn!("Direct connection to agent failed ({err}), retrying pinned to IPv4");

                match self.attempt(&self.http_v4, &url, &api_key, action).await {
                    Err(NodePassError::Transport(ref err)) if err.is_connect() => {
                        warn!("IPv4 attempt failed ({err}), retrying pinned to IPv6");
                        self.attempt(&self.http_v6, &url, &api_key, action).await
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    async fn attempt(
        &self,
        http: &reqwest::Client,
        url: &str,
        api_key: &HeaderValue,
        action: InstanceAction,
    ) -> Result<Value, NodePassError> {
        let resp = http
            .patch(url)
            .header("X-API-Key", api_key)
            .json(&ActionBody { action })
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NodePassError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..body.len().min(200)];
            NodePassError::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }
}
