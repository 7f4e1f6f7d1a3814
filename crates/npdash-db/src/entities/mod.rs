//! Database entities

pub mod endpoint;
pub mod tunnel;
pub mod tunnel_operation_log;

pub use endpoint::Entity as Endpoint;
pub use tunnel::Entity as Tunnel;
pub use tunnel_operation_log::Entity as TunnelOperationLog;

pub mod prelude {
    pub use super::endpoint::Entity as Endpoint;
    pub use super::tunnel::Entity as Tunnel;
    pub use super::tunnel_operation_log::Entity as TunnelOperationLog;
}
