//! keel-ipc: framed, tagged message transport between host and engines.
//!
//! The wire unit is `(tag, payload)` inside a length-delimited frame. The
//! transport promises message boundaries and per-connection ordering and
//! nothing else; payload semantics live in `keel-proxy`.

pub mod connection;
pub mod frame;
pub mod listener;
pub mod stream;

pub use connection::{Connection, MessageHandler};
pub use frame::{read_message, write_message, FrameError, MAX_FRAME_LEN};
pub use listener::Listener;
pub use stream::Stream;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
