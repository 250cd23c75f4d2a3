use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use letta_relay::agent::LettaManager;
use letta_relay::config::{AgentProfile, Settings};
use letta_relay::routes;
use letta_relay::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("letta_relay=debug,tower_http=debug")),
        )
        .init();

    let settings = Settings::from_env()?;
    let profile = AgentProfile::resolve(settings.agent_config_path.as_deref())?;
    info!("Letta server expected at {}", settings.letta_base_url);

    // The agent must exist before the listener is bound.
    let manager = LettaManager::connect(&settings).await?;

    let sources = manager
        .list_tool_sources()
        .await
        .context("failed to list MCP servers")?;
    info!("Available MCP servers: {:?}", sources);

    let tool_ids = manager
        .register_tools(&profile.tool_source)
        .await
        .with_context(|| format!("failed to register tools from '{}'", profile.tool_source))?;

    let agent = manager
        .create_agent(&profile, tool_ids)
        .await
        .context("failed to create agent")?;
    info!("Agent {} ready", agent.id());

    let app_state = AppState::new(Arc::new(agent));
    let app = routes::app(app_state, &settings.cors_origins());

    let addr = settings.bind_address();
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
