//! TunnelOperationLog entity
//!
//! Append-only audit trail of tunnel control actions. Rows denormalize the
//! tunnel name at write time and carry no foreign key so the trail survives
//! the tunnel it describes. Never updated or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Control action relayed to the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OperationAction {
    #[sea_orm(string_value = "start")]
    Start,

    #[sea_orm(string_value = "stop")]
    Stop,

    #[sea_orm(string_value = "restart")]
    Restart,
}

impl OperationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }
}

/// Outcome of a control action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OperationStatus {
    #[sea_orm(string_value = "success")]
    Success,

    #[sea_orm(string_value = "error")]
    Error,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tunnel_operation_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub tunnel_id: i64,

    /// Tunnel name as it was at write time
    pub tunnel_name: String,

    pub action: OperationAction,

    pub status: OperationStatus,

    /// Human-readable description of the outcome
    #[sea_orm(column_type = "Text")]
    pub message: String,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
