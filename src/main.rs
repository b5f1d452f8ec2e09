use std::net::SocketAddr;

use wikipedia_mcp_gateway::infra;
use wikipedia_mcp_gateway::infra::config::Config;
use wikipedia_mcp_gateway::tools::wiki::tool_router::factory_from_env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    infra::logging::init();

    let cfg = Config::from_env();
    tracing::info!(
        mode = %cfg.mode,
        port = cfg.port,
        wikipedia = %cfg.wikipedia_base_url,
        "BOOT wikipedia-mcp-gateway"
    );

    // Stdio mode (default): MCP over stdin/stdout ONLY, no HTTP listener.
    if cfg.mode == "stdio" {
        infra::runtime::mcp_transport::serve_stdio(factory_from_env)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        return Ok(());
    }

    let app = infra::http_app::build_app();
    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    tracing::info!(%addr, "serving streamable HTTP");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
