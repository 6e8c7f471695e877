//! keel-proxy: in-process representatives for sandboxed contract engines.
//!
//! Each [`Proxy`] multiplexes one engine connection: the host pushes call
//! frames and sends INVOKE/GETAPI, the engine drives storage reads, writes,
//! sub-calls and events back through the frame on top of the stack, and a
//! terminal RESULT pops it. The [`PoolManager`] hands idle proxies out via
//! the reserve/release protocol and reclaims them on readiness.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod frames;
pub mod manager;
pub mod message;
pub mod proxy;

pub use api::{ApiInfo, ApiMethod, ApiParam, MethodKind, ParamType};
pub use config::{Config, ConfigError};
pub use engine::{new_uid, EngineKind};
pub use error::{ContextError, ManagerError, ProxyError};
pub use manager::{EngineSupervisor, NullSupervisor, PoolManager};
pub use proxy::{CallContext, Proxy, ProxyManager, Transport};

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

#[cfg(test)]
pub(crate) mod testutil;
