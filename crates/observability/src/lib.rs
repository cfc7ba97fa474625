//! Process-wide tracing setup for the storekeep binaries.

/// Tracing subscriber configuration (filters, formatting).
pub mod tracing;

/// Initialize JSON logging filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}
