//! Test log output, filtered by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt};

/// Install a subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .compact()
        .try_init();
}
