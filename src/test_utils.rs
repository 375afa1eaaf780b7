//! Shared setup for the test suites
//!
//! Tracing may only be installed once per process, while integration tests
//! run many engines in parallel. Every test goes through [`init_test_env`]
//! so the subscriber is installed exactly once and classification logs stay
//! quiet unless explicitly requested.

use std::sync::Once;

static TEST_INIT: Once = Once::new();

/// One-time environment setup for classification tests
pub fn init_test_env() {
    TEST_INIT.call_once(|| {
        // errors only, unless the caller overrides
        if std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", "error");
        }

        let _ = tracing_subscriber::fmt()
            .with_env_filter("error")
            .with_test_writer()
            .try_init();
    });
}
