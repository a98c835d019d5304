use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter from RUST_LOG, falling back to the configured level
pub fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber: compact lines on stderr, plus a plain copy
/// in `log_file` when one is configured
pub fn init_tracing(default_level: &str, log_file: Option<&Path>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .without_time()
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {:?}", path))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_target(true)
                    .with_ansi(false)
                    .compact(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(build_filter(default_level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Logging was already initialised")?;

    tracing::debug!(target: "logging", "logging initialised at {}", default_level);
    Ok(())
}
