//! keel-codec: typed values, hex big-ints and addresses for the engine wire protocol.
//!
//! Everything an engine and the host exchange is built from three shapes:
//! - [`HexInt`]: signed integers carried as `0x`-hex text
//! - [`Address`]: 21-byte account/contract identifiers
//! - [`Value`]: the closed typed-value union (with `Nil` as the explicit
//!   "no value" sentinel)
//!
//! The [`wire`] module holds the cursor/put primitives the message payloads
//! are assembled from.

pub mod address;
pub mod hexint;
pub mod value;
pub mod wire;

pub use address::{Address, AddressError};
pub use hexint::{HexInt, HexIntError};
pub use value::Value;
pub use wire::DecodeError;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
