pub mod builders;
pub mod probe;

use std::sync::Once;
use taskdag::logging::LOG_ENV;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Filter directives come from `TASKDAG_LOG`, the same variable the binary
/// reads, e.g. `TASKDAG_LOG=taskdag::dag=debug`. Captured output is only
/// shown for failing tests.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

        // Another harness may already own the global subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
