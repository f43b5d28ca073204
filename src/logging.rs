//! Tracing setup for binaries that don't bring their own subscriber.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber honoring `RUST_LOG`, falling back to the given
/// directive (e.g. "gantry_sdk=info"). Safe to call twice; the second call is
/// a no-op.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
