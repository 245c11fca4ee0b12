//! # logging
//!
//! why: every crate logs through tracing; binaries and tests need a subscriber to see it
//! relations: used by embedders and the runtime test suite
//! what: init_tracing

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `default_filter`
///
/// returns false when a global subscriber was already installed, so calling
/// it from several tests is harmless
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
