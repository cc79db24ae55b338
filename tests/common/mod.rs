// ABOUTME: Common utilities for integration tests
// ABOUTME: Provides tracing setup shared across test binaries

#![allow(dead_code)]

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a tracing subscriber once per test binary so render/parse traces
/// show up under `cargo test -- --nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    });
}
