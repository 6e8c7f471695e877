//! Error taxonomy for the proxy core.
//!
//! Nothing here is recoverable within a connection: a dispatch error closes
//! the transport and the manager decides whether to respawn the engine.

use thiserror::Error;

use keel_codec::DecodeError;
use keel_ipc::FrameError;

/// A host callback failed (storage lookup, state write, ...).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ContextError(String);

impl ContextError {
    pub fn new(msg: impl Into<String>) -> ContextError {
        ContextError(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("unknown engine uid {0:?}")]
    UnknownUid(String),
    #[error("engine uid {0:?} is not a uuid")]
    BadUid(String),
    #[error("engine supervisor failed: {0}")]
    Supervisor(String),
    #[error("pool manager is gone")]
    Detached,
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("transport error: {0}")]
    Transport(#[from] FrameError),
    #[error("malformed message (tag {tag}): {source}")]
    Malformed {
        tag: u16,
        #[source]
        source: DecodeError,
    },
    #[error("unknown message tag {0}")]
    UnknownMessage(u16),
    #[error("unknown engine kind {0:?}")]
    UnknownEngineKind(String),
    #[error("host context error: {0}")]
    HostContext(#[from] ContextError),
    #[error("protocol violation: {0}")]
    Protocol(&'static str),
    #[error(transparent)]
    Manager(#[from] ManagerError),
}

impl ProxyError {
    pub(crate) fn malformed(tag: u16) -> impl FnOnce(DecodeError) -> ProxyError {
        move |source| ProxyError::Malformed { tag, source }
    }
}
