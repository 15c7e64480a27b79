//! Sockdispatch - SOCKS5 Connection Dispatcher
//!
//! This is the main entry point for the Sockdispatch application.

use anyhow::{Context, Result};
use clap::Parser;
use sockdispatch::config::{
    load_config, Config, ConfigOverrides, ENV_SERVER_HOST, ENV_SERVER_PORT,
};
use sockdispatch::server::run_server;
use sockdispatch::transport::list_ipv4_interfaces;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Sockdispatch - spread SOCKS5 or raw TCP connections across uplinks
#[derive(Parser, Debug)]
#[command(name = "sockdispatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Uplinks: IPv4[:port][@weight] in SOCKS mode, IPv4:port[@weight] in tunnel mode
    uplinks: Vec<String>,

    /// Host to listen on
    #[arg(long, env = ENV_SERVER_HOST)]
    lhost: Option<String>,

    /// Port to listen on
    #[arg(long, env = ENV_SERVER_PORT)]
    lport: Option<u16>,

    /// Forward raw connections to the uplinks instead of speaking SOCKS5
    #[arg(long)]
    tunnel: bool,

    /// List the local addresses available for dispatching and exit
    #[arg(long)]
    list: bool,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, args.json_log)?;

    if args.list {
        return list_addresses();
    }

    let mut config = match &args.config {
        Some(path) => {
            let config = load_config(path)?;
            info!("Configuration loaded from: {:?}", path);
            config
        }
        None => Config::default(),
    };

    ConfigOverrides {
        listen_host: args.lhost,
        listen_port: args.lport,
        tunnel: args.tunnel,
        uplinks: args.uplinks,
    }
    .apply(&mut config)?;
    config.fill_from_env(std::env::vars())?;

    info!("Sockdispatch v{}", sockdispatch::VERSION);

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // Handle Ctrl+C and termination signals (cross-platform)
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx_clone.send(true);
    });

    run_server(config, shutdown_rx).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!("Failed to setup SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down...");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    // On Windows, only handle Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    info!("Received Ctrl+C, shutting down...");
}

/// Print the usable local IPv4 addresses
fn list_addresses() -> Result<()> {
    let interfaces = list_ipv4_interfaces().with_context(|| "Failed to list interfaces")?;

    println!("--- Listing the available addresses for dispatching");
    for iface in interfaces {
        println!("[+] {}, IPv4:{}", iface.name, iface.addr);
    }

    Ok(())
}

/// Setup logging based on configuration
///
/// `RUST_LOG`, when set, takes precedence over `level`.
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
    });

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
