//! Main Entrypoint for a Courier Agent Server
//!
//! This binary is responsible for:
//! 1. Parsing command-line overrides and loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Building the session store, LLM client, tools and dispatcher for one agent.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use clap::Parser;
use courier_api::{config::Config, router::create_router, state::AppState};
use courier_core::agents::AgentKind;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(version, about = "Serve one Courier agent over HTTP")]
struct Cli {
    /// Agent to serve: summarizer, speaker or reddit_scout. Defaults to AGENT_KIND.
    #[arg(long)]
    agent: Option<AgentKind>,
    /// Address to bind, e.g. 127.0.0.1:8003. Defaults to BIND_ADDRESS.
    #[arg(long)]
    bind_address: Option<SocketAddr>,
    /// Log level (trace, debug, info, warn, error). Defaults to RUST_LOG.
    #[arg(long)]
    log_level: Option<Level>,
}

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let cli = Cli::parse();
    let mut config = Config::from_env_for(cli.agent).context("Failed to load configuration")?;
    if let Some(bind_address) = cli.bind_address {
        config.bind_address = bind_address;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!(agent = %config.agent, "Configuration loaded. Initializing agent...");

    // --- 3. Initialize Shared Services ---
    let app_state = Arc::new(
        AppState::from_config(&config)
            .await
            .context("Failed to initialize agent")?,
    );

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        agent = %config.agent,
        model = %config.chat_model,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
