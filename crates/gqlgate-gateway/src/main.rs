//! gqlgate gateway
//!
//! - Explorer page: GET /
//! - Execution endpoint: GET/POST/OPTIONS /query (+ WebSocket upgrade)
//! - Config: $GQLGATE_CONFIG (default gqlgate.yaml, optional), $PORT override

use tracing_subscriber::{fmt, EnvFilter};

use gqlgate_core::error::{GqlGateError, Result};
use gqlgate_gateway::{app_state, config, router};

const DEFAULT_CONFIG_PATH: &str = "gqlgate.yaml";

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "gqlgate-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::var("GQLGATE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut cfg = config::load_optional(&path)?;
    if let Ok(port) = std::env::var("PORT") {
        cfg.gateway.apply_port_override(&port)?;
    }

    let listen = cfg.gateway.listen_addr();
    let port = cfg.gateway.port;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .map_err(|e| GqlGateError::Internal(format!("bind {listen} failed: {e}")))?;

    tracing::info!(%listen, "gqlgate-gateway starting");
    tracing::info!("connect to http://localhost:{port}/ for GraphQL playground");

    axum::serve(listener, app)
        .await
        .map_err(|e| GqlGateError::Internal(format!("server failed: {e}")))
}
