//! Poll Voting and Live Tally Core
//!
//! Polls with fixed options, one vote per user per poll, and results recomputed
//! from the vote ledger on every change.

pub mod config;
pub mod errors;
pub mod polling;
pub mod types;

// Re-export commonly used types
pub use errors::{Error, ErrorKind, Result};
pub use polling::PollingService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging, honouring `RUST_LOG` and defaulting to `livepoll=info`
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "livepoll=info".into()),
        )
        .try_init()
        .map_err(|e| Error::internal(format!("Logging already initialized: {e}")))?;

    tracing::info!("🗳️  Polling core v{} initialized", VERSION);
    Ok(())
}

/// Initialize logging at the configured level and format
pub fn init_with_config(logging: &config::LoggingConfig) -> Result<()> {
    let format = logging.log_format()?;
    let filter = tracing_subscriber::EnvFilter::try_new(format!("livepoll={}", logging.level))
        .map_err(|e| Error::internal(format!("Invalid LOG_LEVEL: {e}")))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match format {
        config::LogFormat::Json => builder.json().try_init(),
        config::LogFormat::Pretty => builder.pretty().try_init(),
        config::LogFormat::Compact => builder.compact().try_init(),
    };
    result.map_err(|e| Error::internal(format!("Logging already initialized: {e}")))?;

    tracing::info!(level = %logging.level, "🗳️  Polling core v{} initialized", VERSION);
    Ok(())
}
