//! Tunnel entity
//!
//! A tunnel is a managed process on a NodePass agent. The agent is the sole
//! authority on its running state; this table only tracks identity and the
//! instance handle used to address it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tunnels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Display name of the tunnel
    pub name: String,

    /// Endpoint (agent) that owns this tunnel's process
    pub endpoint_id: i64,

    /// Instance handle on the agent; absent until the process is materialized
    pub instance_id: Option<String>,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Tunnel belongs to an endpoint
    #[sea_orm(
        belongs_to = "super::endpoint::Entity",
        from = "Column::EndpointId",
        to = "super::endpoint::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Endpoint,
}

impl Related<super::endpoint::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Endpoint.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
