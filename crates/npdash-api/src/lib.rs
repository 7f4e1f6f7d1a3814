pub mod handlers;
pub mod models;
pub mod normalize;
pub mod status;

use axum::{
    routing::{get, patch},
    Router,
};
use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use sea_orm::DatabaseConnection;

pub use npdash_nodepass::NodePassClient;

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub nodepass: NodePassClient,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "npdash API",
        version = "0.1.0",
        description = "REST API for the NodePass tunnel dashboard",
        contact(
            name = "NodePass Dash Team",
            email = "team@npdash.dev"
        )
    ),
    paths(
        handlers::health_check,
        handlers::get_tunnel,
        handlers::list_tunnel_logs,
        handlers::update_tunnel_status,
    ),
    components(
        schemas(
            models::EndpointSummary,
            models::Tunnel,
            models::UpdateTunnelStatusRequest,
            models::UpdateTunnelStatusResponse,
            models::StatusFailure,
            models::OperationLogEntry,
            models::OperationLogList,
            models::HealthResponse,
            models::ErrorResponse,
        )
    ),
    tags(
        (name = "tunnels", description = "Tunnel state and audit endpoints"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS (for development)
    pub enable_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            enable_cors: true,
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, db: DatabaseConnection, nodepass: NodePassClient) -> Self {
        let state = Arc::new(AppState { db, nodepass });

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        let api_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route("/api/tunnels/{id}", get(handlers::get_tunnel))
            .route("/api/tunnels/{id}/logs", get(handlers::list_tunnel_logs))
            .route(
                "/api/tunnels/{id}/status",
                patch(handlers::update_tunnel_status),
            )
            .with_state(self.state.clone());

        // SwaggerUi automatically creates a route for /api/openapi.json
        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(api_router);

        let mut router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            // No cookie auth on this API, so the permissive layer is enough
            router = router.layer(CorsLayer::permissive());
        }

        router
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        // Ensure OpenAPI spec can be generated without panics
        let _api_doc = ApiDoc::openapi();
    }
}
