//! Shepherd Server - local dashboard for Go profile and trace viewers.
//!
//! Serves the dashboard page and the `/api` control endpoint that launches
//! `pprof`/`trace` viewers on free ports and stops them again.

mod dashboard;
mod handler;
mod server;

use anyhow::Result;
use clap::Parser;
use server::AppState;
use shepherd_core::config::{LaunchConfig, ServerConfig};
use shepherd_core::discovery::resolve_tools;
use shepherd_core::{ControlEndpoint, Launcher, ProcessRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "shepherd-server")]
#[command(about = "Dashboard for launching Go pprof and trace viewers")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value_t = ServerConfig::DEFAULT_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = ServerConfig::DEFAULT_HOST)]
    host: String,

    /// Go installation root searched for pprof and trace
    #[arg(long, env = "GOROOT")]
    goroot: Option<String>,

    /// Explicit pprof binary (skips discovery for pprof)
    #[arg(long)]
    pprof: Option<PathBuf>,

    /// Explicit trace binary (skips discovery for trace)
    #[arg(long)]
    trace: Option<PathBuf>,

    /// How long a viewer must stay up to count as launched, in milliseconds
    #[arg(long, default_value_t = LaunchConfig::DEFAULT_LAUNCH_GRACE.as_millis() as u64)]
    launch_grace_ms: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Shepherd Server");

    // Without both tools the dashboard cannot do anything.
    let tools = resolve_tools(
        args.goroot.as_deref(),
        args.pprof.as_deref(),
        args.trace.as_deref(),
    )?;
    info!("pprof: {}", tools.pprof.program.display());
    info!("trace: {}", tools.trace.program.display());

    let registry = Arc::new(ProcessRegistry::new());
    let launcher = Launcher::new(Duration::from_millis(args.launch_grace_ms));
    info!("Launch grace period: {:?}", launcher.grace());
    let endpoint = ControlEndpoint::new(registry.clone(), tools, launcher);
    let state = Arc::new(AppState::new(endpoint));

    // Start the server
    let addr = server::start_server(state, &args.host, args.port).await?;

    // Print port for wrappers and tests to read (intentional stdout)
    println!("SHEPHERD_PORT={}", addr.port());

    info!("Dashboard running on http://{}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    let stopped = registry.drain();
    info!("Shutdown signal received, stopped {} viewer(s), exiting", stopped);

    Ok(())
}
