//! Worker configuration module
//!
//! Provides CLI argument parsing and validation for the mock environment
//! server.

use clap::Parser;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "axon-server")]
#[command(about = "Mock environment server for northbound clients")]
pub struct WorkerConfig {
    /// Bind address
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,

    /// Bind port
    #[arg(long, default_value_t = 8086)]
    pub port: u16,

    /// Expected session name
    #[arg(long, default_value = "test")]
    pub session_name: String,

    /// Expected session key
    #[arg(long, default_value = "test")]
    pub session_key: String,

    /// Number of measurement rounds to serve per session
    #[arg(long, default_value_t = 10)]
    pub rounds: u32,

    /// Measurement window length; end_ts advances by this much per round
    #[arg(long, default_value_t = 100)]
    pub window_ms: i64,

    /// Answer every start request with `no-available-worker`
    #[arg(long)]
    pub unavailable: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl WorkerConfig {
    /// Returns the full bind address as a string (bind:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<(), String> {
        debug!("Validating worker configuration");

        if self.port == 0 {
            return Err("port must be > 0".into());
        }

        if self.rounds == 0 {
            return Err("rounds must be > 0".into());
        }

        if self.window_ms <= 0 {
            return Err("window_ms must be > 0".into());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            ));
        }

        debug!("Worker configuration validated successfully");
        Ok(())
    }

    /// Returns true if JSON format logging is enabled
    pub fn is_json_format(&self) -> bool {
        self.log_format.to_lowercase() == "json"
    }
}
