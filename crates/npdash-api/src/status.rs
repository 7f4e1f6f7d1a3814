//! Tunnel status-change orchestration
//!
//! The sequence is strictly ordered: validate → resolve → remote call →
//! record → respond. Validation and lookup failures short-circuit with no
//! audit entry; once the remote call has been attempted, exactly one entry is
//! written whatever the outcome. The agent is the sole authority on running
//! state, so nothing here mutates the tunnel row.

use npdash_db::entities::tunnel_operation_log::{OperationAction, OperationStatus};
use npdash_db::entities::{endpoint, tunnel, tunnel_operation_log};
use npdash_nodepass::{AgentEndpoint, InstanceAction, NodePassClient, NodePassError};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

/// Raw, unvalidated inputs of the status-change operation.
#[derive(Debug)]
pub struct StatusRequest<'a> {
    pub id: &'a str,
    pub action: &'a str,
}

/// Outcome of a successful status change.
#[derive(Debug)]
pub struct StatusSuccess {
    pub tunnel_id: i64,
    /// Agent payload, passed through uninterpreted.
    pub payload: Value,
}

/// Failure modes of the status-change operation
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("invalid tunnel id")]
    InvalidId,

    #[error("invalid action, only start, stop and restart are supported")]
    InvalidAction,

    #[error("tunnel not found")]
    TunnelNotFound,

    #[error("tunnel has no endpoint")]
    MissingEndpoint,

    #[error("tunnel has no instance id")]
    MissingInstanceId,

    /// Remote call failed; an error entry is already in the operation log.
    #[error("failed to call NodePass API: {0}")]
    RemoteCall(NodePassError),

    #[error("unexpected failure: {0}")]
    Unexpected(#[from] sea_orm::DbErr),
}

/// Relay a state-change action to the agent that owns the tunnel's process
/// and record the outcome in the operation log.
pub async fn change_tunnel_status<C: ConnectionTrait>(
    db: &C,
    nodepass: &NodePassClient,
    request: StatusRequest<'_>,
) -> Result<StatusSuccess, StatusError> {
    let tunnel_id: i64 = request.id.parse().map_err(|_| StatusError::InvalidId)?;
    let action = InstanceAction::parse(request.action).ok_or(StatusError::InvalidAction)?;

    // One logical lookup for the tunnel and its owning endpoint
    let (tunnel, ep) = tunnel::Entity::find_by_id(tunnel_id)
        .find_also_related(endpoint::Entity)
        .one(db)
        .await?
        .ok_or(StatusError::TunnelNotFound)?;

    let ep = ep.ok_or(StatusError::MissingEndpoint)?;

    // An empty instance id is as unusable as a missing one
    let instance_id = tunnel
        .instance_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(StatusError::MissingInstanceId)?;

    let agent = AgentEndpoint {
        url: ep.url,
        api_path: ep.api_path,
        api_key: ep.api_key,
    };

    info!(
        "Calling NodePass API for tunnel {} ({}): {}{}/instances/{}",
        tunnel_id, action, agent.url, agent.api_path, instance_id
    );

    match nodepass.update_instance(&agent, instance_id, action).await {
        Ok(payload) => {
            record_outcome(
                db,
                &tunnel,
                action,
                OperationStatus::Success,
                format!("Tunnel {} succeeded", action),
            )
            .await?;

            Ok(StatusSuccess {
                tunnel_id: tunnel.id,
                payload,
            })
        }
        Err(cause) => {
            error!(
                "NodePass API call failed for tunnel {} ({}) at {}: {}",
                tunnel_id, action, agent.url, cause
            );

            record_outcome(
                db,
                &tunnel,
                action,
                OperationStatus::Error,
                format!("Tunnel {} failed: {}", action, cause),
            )
            .await?;

            Err(StatusError::RemoteCall(cause))
        }
    }
}

fn log_action(action: InstanceAction) -> OperationAction {
    match action {
        InstanceAction::Start => OperationAction::Start,
        InstanceAction::Stop => OperationAction::Stop,
        InstanceAction::Restart => OperationAction::Restart,
    }
}

/// Append one operation log entry. Called exactly once per invocation that
/// reaches the remote call, success or failure.
async fn record_outcome<C: ConnectionTrait>(
    db: &C,
    tunnel: &tunnel::Model,
    action: InstanceAction,
    status: OperationStatus,
    message: String,
) -> Result<(), sea_orm::DbErr> {
    let entry = tunnel_operation_log::ActiveModel {
        tunnel_id: Set(tunnel.id),
        tunnel_name: Set(tunnel.name.clone()),
        action: Set(log_action(action)),
        status: Set(status),
        message: Set(message),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    entry.insert(db).await?;

    Ok(())
}
