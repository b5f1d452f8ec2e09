use axum::{
    routing::{any_service, get},
    Router,
};
use std::sync::Arc;

use crate::infra::runtime::mcp_transport;
use crate::tools::wiki::tool_router::factory_from_env;

/// `/healthz` plus the streamable MCP endpoint at `/mcp`.
pub fn build_app() -> Router {
    let session_mgr = Arc::new(mcp_transport::LocalSessionManager::default());
    let mcp_service = mcp_transport::make_streamable_http_service(factory_from_env, session_mgr);

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route_service("/mcp", any_service(mcp_service))
}
