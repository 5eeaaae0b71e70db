// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the fmt subscriber for the CLI.
/// `RUST_LOG` wins when set; otherwise extraction decisions are shown at
/// debug level with `verbose`, and only per-document outcomes without it.
pub fn setup_logging(verbose: bool) {
    let default_directive = if verbose { "budget_extractor=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .init();

    tracing::debug!("Logging initialised (verbose: {})", verbose);
}
