use anyhow::{Context, Result};
use axon::client::{init_logging_with_config, Config, Dispatch, NorthboundClient};
use clap::Parser;
use colored::*;
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "axon-client")]
#[command(about = "Northbound client for network-simulation environments", long_about = None)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(long)]
    config: PathBuf,

    /// Client id; combined with the session name to form the routing identity
    #[arg(long, default_value_t = 0)]
    id: u32,

    /// Number of measurement rounds to run
    #[arg(long, default_value_t = 10)]
    rounds: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    log_format: String,
}

fn main() {
    let args = Args::parse();

    init_logging_with_config(&args.log_level, args.log_format == "json");

    if let Err(e) = run(args) {
        error!(error = %e, "Client failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    config.validate()?;

    println!("{}", "Axon Northbound Client".bold());
    println!(
        "Session: {}  Port: {}\n",
        config.session_name, config.algorithm_client_port
    );

    let mut client = NorthboundClient::new(args.id, config);
    client
        .connect()
        .context("Failed to connect to the environment server")?;

    for round in 0..args.rounds {
        match client.recv()? {
            Dispatch::Measurement(report) => {
                info!(
                    round = round,
                    rows = report.data.len(),
                    ok_flag = report.ok_flag,
                    end_ts = ?client.end_ts(),
                    "Measurement received"
                );
                println!(
                    "round {:>3}: {} metric rows, end_ts {}",
                    round,
                    report.data.len(),
                    client
                        .end_ts()
                        .map(|ts| ts.to_string())
                        .unwrap_or_else(|| "-".to_owned())
                );

                // Pass-through driver: acknowledge each measurement with an
                // empty policy so the environment advances to the next window.
                client.send(&json!([]))?;
            }
            Dispatch::Retryable(reason) => {
                anyhow::bail!("no worker available ({}); retry later", reason)
            }
            Dispatch::Fatal(reason) => anyhow::bail!("session ended: {}", reason),
        }
    }

    client.close()?;
    println!("\n{}", "✓ Session complete".green().bold());
    Ok(())
}
