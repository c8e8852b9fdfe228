//! Tests for `src/logging.rs`.

use launch_policy::config::LoggingConfig;
use launch_policy::logging::init_cli;

#[test]
fn second_init_reports_error_instead_of_panicking() {
    let config = LoggingConfig::default();
    // Another test in this binary may already have installed the global
    // subscriber, so the first call is allowed to fail; the second must.
    let _first = init_cli(&config);
    assert!(init_cli(&config).is_err());
}
