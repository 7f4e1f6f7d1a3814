//! Endpoint entity for storing NodePass agent connection details

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "endpoints")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Display name of the agent
    pub name: String,

    /// Base URL of the NodePass agent (e.g. `http://10.0.0.5:3000`)
    pub url: String,

    /// API path prefix on the agent (e.g. `/api/v1`)
    pub api_path: String,

    /// API key credential for the agent
    pub api_key: String,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Tunnels managed through this endpoint
    #[sea_orm(has_many = "super::tunnel::Entity")]
    Tunnel,
}

impl Related<super::tunnel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tunnel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
