//! zero-server: user CRUD over HTTP with graceful, observable shutdown.
//!
//! ```text
//! zero-server --config zero.yaml --port 8080
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use zero_core::error::{Result, ZeroError};
use zero_server::ops::shutdown::{Orchestrator, ShutdownOutcome, ShutdownSignal};
use zero_server::{app_state, config, ops, router, server};

#[derive(Parser)]
#[command(name = "zero-server", about = "User service with graceful shutdown")]
struct Cli {
    /// Path to the YAML config file.
    #[arg(long, default_value = "zero.yaml")]
    config: String,

    /// Override the port of `server.listen`.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(ShutdownOutcome::Stopped) => ExitCode::SUCCESS,
        Ok(ShutdownOutcome::Forced(cause)) => {
            tracing::error!(?cause, "server stopped forcefully");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "zero-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ShutdownOutcome> {
    let cfg = config::load_from_file(&cli.config)?;
    let mut listen = cfg.server.listen_addr()?;
    if let Some(port) = cli.port {
        listen.set_port(port);
    }
    let policy = cfg.server.drain_policy();

    let state = app_state::AppState::new(cfg)?;
    let health = state.health().clone();
    let app = router::build_router(state);

    let signal = ShutdownSignal::new();
    ops::signals::install(signal.clone())
        .map_err(|e| ZeroError::Config(format!("signal handler registration failed: {e}")))?;

    tracing::info!(
        %listen,
        grace_ms = policy.grace_period.as_millis() as u64,
        timeout_ms = policy.shutdown_timeout.as_millis() as u64,
        "zero-server starting with graceful shutdown"
    );
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| ZeroError::Config(format!("failed to bind {listen}: {e}")))?;

    let orchestrator = Orchestrator::new(health, policy, signal);
    let report = server::serve(listener, app, orchestrator).await?;
    Ok(report.outcome)
}
