//! Logging setup for consent state components.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with the default `info` filter.
///
/// Sets up tracing-subscriber with:
/// - Environment filter (RUST_LOG)
/// - Compact format suitable for terminal output
pub fn init() {
    init_with_filter("info");
}

/// Initialize tracing with a custom default filter.
pub fn init_with_filter(default_filter: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(fmt::layer().compact())
        .init();
}

/// Install a subscriber that writes through the test harness capture.
///
/// Returns `false` if a global subscriber was already installed, so it can
/// be called at the top of every test.
pub fn try_init(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(fmt::layer().compact().with_test_writer())
        .try_init()
        .is_ok()
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Log line prefixes.
pub mod prefix {
    /// Durable store reads and writes
    pub const STORE: &str = "⊔";
    /// Remote update requests
    pub const REQUEST: &str = "⇢";
    /// Observer dispatch
    pub const OBSERVE: &str = "꩜";
}
