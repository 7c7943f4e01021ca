// src/logging.rs
// =============================================================================
// Sets up `tracing` output on stderr (stdout is kept for the report).
//
// RUST_LOG wins when it is set, e.g. RUST_LOG=catalog_mirror=debug.
// Otherwise -v / -vv on the command line pick the level.
// =============================================================================

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn setup_logging(verbosity: u8) -> anyhow::Result<()> {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init()?;

    Ok(())
}
