use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, error, info};

use npdash_db::entities::{endpoint, tunnel, tunnel_operation_log};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};

use crate::models::*;
use crate::normalize::{normalize_id, normalize_precision};
use crate::status::{self, StatusError, StatusRequest};
use crate::AppState;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get a specific tunnel by ID
#[utoipa::path(
    get,
    path = "/api/tunnels/{id}",
    params(
        ("id" = i64, Path, description = "Tunnel ID")
    ),
    responses(
        (status = 200, description = "Tunnel information", body = Tunnel),
        (status = 404, description = "Tunnel not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "tunnels"
)]
pub async fn get_tunnel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Getting tunnel: {}", id);

    let found = tunnel::Entity::find_by_id(id)
        .find_also_related(endpoint::Entity)
        .one(&state.db)
        .await
        .map_err(db_error)?;

    if let Some((t, ep)) = found {
        let tunnel = Tunnel {
            id: normalize_id(t.id),
            name: t.name,
            instance_id: t.instance_id,
            endpoint: ep.map(|ep| EndpointSummary {
                id: ep.id,
                name: ep.name,
                url: ep.url,
            }),
            created_at: t.created_at,
        };

        // Endpoint ids share the tunnel id's width problem
        let body = serde_json::to_value(&tunnel).map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Serialization error: {}", e),
                    code: None,
                }),
            )
        })?;

        Ok(Json(normalize_precision(body)))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Tunnel '{}' not found", id),
                code: Some("TUNNEL_NOT_FOUND".to_string()),
            }),
        ))
    }
}

/// List operation log entries for a tunnel
#[utoipa::path(
    get,
    path = "/api/tunnels/{id}/logs",
    params(
        ("id" = i64, Path, description = "Tunnel ID"),
        ("offset" = Option<usize>, Query, description = "Pagination offset (default: 0)"),
        ("limit" = Option<usize>, Query, description = "Pagination limit (default: 100, max: 1000)")
    ),
    responses(
        (status = 200, description = "Operation log entries, newest first", body = OperationLogList),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "tunnels"
)]
pub async fn list_tunnel_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<OperationLogQuery>,
) -> Result<Json<OperationLogList>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Listing operation logs for tunnel: {}", id);

    use tunnel_operation_log::Column;

    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);

    let paginator = tunnel_operation_log::Entity::find()
        .filter(Column::TunnelId.eq(id))
        .order_by_desc(Column::CreatedAt)
        .paginate(&state.db, limit as u64);

    let total = paginator.num_items().await.map_err(db_error)? as usize;

    let page_num = offset / limit;
    let rows = paginator
        .fetch_page(page_num as u64)
        .await
        .map_err(db_error)?;

    let logs: Vec<OperationLogEntry> = rows
        .into_iter()
        .map(|row| OperationLogEntry {
            id: row.id,
            tunnel_id: row.tunnel_id,
            tunnel_name: row.tunnel_name,
            action: row.action.as_str().to_string(),
            status: row.status.as_str().to_string(),
            message: row.message,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(OperationLogList {
        logs,
        total,
        offset,
        limit,
    }))
}

/// Change a tunnel's running state through its NodePass agent
#[utoipa::path(
    patch,
    path = "/api/tunnels/{id}/status",
    params(
        ("id" = String, Path, description = "Tunnel ID")
    ),
    request_body = UpdateTunnelStatusRequest,
    responses(
        (status = 200, description = "State change accepted by the agent", body = UpdateTunnelStatusResponse),
        (status = 400, description = "Invalid id, invalid action, or tunnel not actionable", body = ErrorResponse),
        (status = 404, description = "Tunnel not found", body = ErrorResponse),
        (status = 500, description = "Remote call failed or unexpected error", body = StatusFailure)
    ),
    tag = "tunnels"
)]
pub async fn update_tunnel_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTunnelStatusRequest>,
) -> Result<Json<UpdateTunnelStatusResponse>, (StatusCode, Json<StatusErrorBody>)> {
    info!("Updating tunnel status: id={} action={}", id, body.action);

    let request = StatusRequest {
        id: &id,
        action: &body.action,
    };

    match status::change_tunnel_status(&state.db, &state.nodepass, request).await {
        Ok(success) => Ok(Json(UpdateTunnelStatusResponse {
            success: true,
            tunnel: normalize_id(success.tunnel_id),
            nodepass_data: normalize_precision(success.payload),
        })),
        Err(err) => Err(status_error_response(err)),
    }
}

/// Map core failure variants to the external failure contract.
fn status_error_response(err: StatusError) -> (StatusCode, Json<StatusErrorBody>) {
    match err {
        StatusError::InvalidId
        | StatusError::InvalidAction
        | StatusError::MissingEndpoint
        | StatusError::MissingInstanceId => (
            StatusCode::BAD_REQUEST,
            Json(StatusErrorBody::Simple(ErrorResponse {
                error: err.to_string(),
                code: None,
            })),
        ),

        StatusError::TunnelNotFound => (
            StatusCode::NOT_FOUND,
            Json(StatusErrorBody::Simple(ErrorResponse {
                error: err.to_string(),
                code: None,
            })),
        ),

        StatusError::RemoteCall(cause) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(StatusErrorBody::Remote(StatusFailure {
                success: false,
                error: "failed to call NodePass API".to_string(),
                message: cause.to_string(),
            })),
        ),

        StatusError::Unexpected(_) => {
            error!("Tunnel status update failed: {}", err);

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusErrorBody::Simple(ErrorResponse {
                    error: "failed to update tunnel status".to_string(),
                    code: None,
                })),
            )
        }
    }
}

fn db_error(e: sea_orm::DbErr) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Database error: {}", e),
            code: None,
        }),
    )
}
