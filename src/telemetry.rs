// Copyright (c) 2025 - Cowboy AI, Inc.
//! Tracing initialisation for hosts and tests

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber honouring `RUST_LOG`, defaulting to `default_directive`
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
