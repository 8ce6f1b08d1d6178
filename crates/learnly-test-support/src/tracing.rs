//! Tracing bootstrap for integration tests.

use tracing_subscriber::EnvFilter;

/// Initializes a tracing subscriber for a test binary. Safe to call from
/// multiple tests; only the first call installs the subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
