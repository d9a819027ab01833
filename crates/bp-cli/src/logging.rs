use bp_core::StoryError;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

/// Sends diagnostics to stderr so stdout stays a clean line protocol.
/// `level` wins over `RUST_LOG`; without either only warnings are shown.
pub(crate) fn init_logging(level: Option<&str>) -> Result<(), StoryError> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).map_err(|error| {
            StoryError::new(
                "CLI_LOG_LEVEL",
                format!("Invalid log level \"{}\": {}", level, error),
            )
        })?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };
    // A subscriber may already be installed when the CLI runs in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    Ok(())
}
