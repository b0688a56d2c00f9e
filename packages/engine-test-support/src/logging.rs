//! Unified test logging initialization.
//!
//! One guarded entry point shared by unit and integration tests so the
//! subscriber is installed exactly once per process regardless of which
//! test runs first.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Installs the test subscriber. Idempotent and race-safe.
///
/// The filter is taken from `TEST_LOG`, falling back to `RUST_LOG`,
/// falling back to `"warn"` so passing runs stay quiet. Output goes
/// through `with_test_writer()` for cargo/nextest capture and drops
/// timestamps for stable snapshots.
pub fn init() {
    INITIALIZED.get_or_init(|| {
        fmt()
            .with_env_filter(env_filter())
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

fn env_filter() -> EnvFilter {
    std::env::var("TEST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}
