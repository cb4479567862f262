//! Tracing subscriber setup.
//!
//! The CLI installs one subscriber per process once the config is read:
//! the `[logging] level` setting picks the default filter and `RUST_LOG`
//! replaces it when set. Output is compact and goes to stderr, leaving
//! stdout to the command's own report.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the process-wide subscriber, filtering at `default_level`
/// (e.g. `"info"` or `"habit_core=debug"`) unless `RUST_LOG` is set.
///
/// A second call is ignored.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// Debug-level subscriber writing through the test harness's capture
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
