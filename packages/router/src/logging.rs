//! Logging init: `tracing` fmt subscriber to stderr with env-filter control.

use tracing_subscriber::EnvFilter;

/// Initialize structured logging to stderr.
///
/// The filter is taken from `RUST_LOG` when set, defaulting to `info` with
/// `debug` for the switchyard crates. Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,switchyard_router=debug,switchyard_core=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
