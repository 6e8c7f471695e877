//! keel-bench: criterion benches live under `benches/`.

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
