//! Log capture for tests.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set: everything from sqlstress, only errors from
/// dependencies such as sqlx.
const DEFAULT_FILTER: &str = "error,sqlstress=trace";

/// Routes logs into the output captured by the test runner.
///
/// `RUST_LOG` overrides [`DEFAULT_FILTER`]. Only the first call in a test binary installs the
/// subscriber, later calls do nothing.
///
/// ```
/// sqlstress_test::tracing::init();
/// sqlstress_test::tracing::init();
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .without_time()
        .with_line_number(true)
        .try_init();
}
