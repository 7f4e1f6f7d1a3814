use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Endpoint summary exposed alongside a tunnel (credentials stay server-side)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EndpointSummary {
    /// Endpoint identifier
    pub id: i64,
    /// Display name of the agent
    pub name: String,
    /// Base URL of the agent
    pub url: String,
}

/// Tunnel information
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Tunnel {
    /// Tunnel id; rendered as a string when it exceeds the safe-integer range
    #[schema(value_type = Object)]
    pub id: serde_json::Value,
    /// Display name
    pub name: String,
    /// Instance handle on the agent, if the process has been materialized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    /// Owning endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointSummary>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Request to change a tunnel's running state
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateTunnelStatusRequest {
    /// One of `start`, `stop`, `restart`
    pub action: String,
}

/// Successful state change
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateTunnelStatusResponse {
    pub success: bool,
    /// Tunnel id; rendered as a string when it exceeds the safe-integer range
    #[schema(value_type = Object)]
    pub tunnel: serde_json::Value,
    /// Agent payload, passed through uninterpreted
    #[serde(rename = "nodepassData")]
    #[schema(value_type = Object)]
    pub nodepass_data: serde_json::Value,
}

/// Remote control call failure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusFailure {
    pub success: bool,
    /// Failure category
    pub error: String,
    /// Underlying fault description
    pub message: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Machine-readable error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Either failure body of the status operation
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum StatusErrorBody {
    Simple(ErrorResponse),
    Remote(StatusFailure),
}

/// Operation log entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OperationLogEntry {
    pub id: i64,
    #[serde(rename = "tunnelId")]
    pub tunnel_id: i64,
    /// Tunnel name as it was at write time
    #[serde(rename = "tunnelName")]
    pub tunnel_name: String,
    /// start | stop | restart
    pub action: String,
    /// success | error
    pub status: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Page of operation log entries
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OperationLogList {
    pub logs: Vec<OperationLogEntry>,
    /// Total count (without pagination)
    pub total: usize,
    /// Current page offset
    pub offset: usize,
    /// Page size limit
    pub limit: usize,
}

/// Query parameters for the operation log listing
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OperationLogQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}
