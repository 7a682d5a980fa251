//! Test harness helpers.

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Set up test logging with the given filter.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Set up test logging at `warn`.
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}

/// A temporary module storage directory with one subdirectory per module.
///
/// # Panics
///
/// Panics if the directory cannot be created.
#[must_use]
pub fn module_dir(modules: &[&str]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp directory");
    for module in modules {
        std::fs::create_dir(dir.path().join(module)).expect("Failed to create module directory");
    }
    dir
}
