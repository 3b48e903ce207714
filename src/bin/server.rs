use anyhow::Result;
use axon::client::init_logging_with_config;
use axon::server::{EnvWorker, WorkerConfig};
use clap::Parser;
use std::net::TcpListener;
use tracing::{error, info};

fn main() {
    // Parse CLI arguments
    let config = WorkerConfig::parse();

    // Initialize structured logging with config options
    init_logging_with_config(&config.log_level, config.is_json_format());

    // Validate configuration
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        error!(error = %e, "Server failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: WorkerConfig) -> Result<()> {
    let addr = config.address();

    let listener = TcpListener::bind(&addr).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            anyhow::anyhow!(
                "Failed to bind to {}: Address already in use. Try a different port or ensure no other process is using it.",
                addr
            )
        } else {
            anyhow::Error::new(e).context(format!("Failed to bind to {}", addr))
        }
    })?;

    info!(
        address = %addr,
        session = %config.session_name,
        rounds = config.rounds,
        unavailable = config.unavailable,
        "Environment worker listening"
    );

    let worker = EnvWorker::new(config);
    worker.run(listener)?;

    Ok(())
}
