use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging with configurable log levels
///
/// Log level can be controlled via the `RUST_LOG` environment variable.
/// Examples:
/// - `RUST_LOG=info` - Info level and above
/// - `RUST_LOG=debug` - Debug level and above
/// - `RUST_LOG=axon=debug` - Debug level for the axon crate only
/// - `RUST_LOG=warn` - Warn level and above
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true),
        )
        .init();
}

/// Initialize logging from CLI options. `RUST_LOG` still wins when set.
pub fn init_logging_with_config(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true),
            )
            .init();
    }
}
