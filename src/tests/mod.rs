mod session_integration_tests;

/// Capture log output in test runs (`RUST_LOG=debug cargo test -- --nocapture`).
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
