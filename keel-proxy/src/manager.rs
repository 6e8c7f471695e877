//! Pool manager: engine registry and idle bookkeeping by kind.
//!
//! Proxies announce readiness through [`ProxyManager::on_ready`]; hosts take
//! them back out with [`PoolManager::checkout`]. The registry is keyed by
//! the handshake uid. Idle entries are weak references pruned lazily at
//! checkout, which keeps removal O(1) without an intrusive list.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};

use rustc_hash::FxHashMap;

use keel_ipc::{Connection, Listener};
use keel_logging::{EngineConnectedV1, EngineKilledV1, EngineReadyV1, NdjsonWriter};
use serde::Serialize;

use crate::engine::{is_valid_uid, EngineKind};
use crate::error::ManagerError;
use crate::proxy::{Proxy, ProxyManager};

/// Process control for engines the embedding process launched.
pub trait EngineSupervisor: Send + Sync {
    fn kill(&self, uid: &str) -> io::Result<()>;
}

/// Supervisor for externally managed engines: kills are accepted and left
/// to the embedder.
pub struct NullSupervisor;

impl EngineSupervisor for NullSupervisor {
    fn kill(&self, _uid: &str) -> io::Result<()> {
        Ok(())
    }
}

struct PoolState {
    proxies: FxHashMap<String, Arc<Proxy>>,
    idle: [VecDeque<Weak<Proxy>>; EngineKind::ALL.len()],
}

pub struct PoolManager {
    supervisor: Box<dyn EngineSupervisor>,
    state: Mutex<PoolState>,
    events: Option<Mutex<NdjsonWriter>>,
}

impl PoolManager {
    pub fn new(supervisor: Box<dyn EngineSupervisor>) -> Arc<PoolManager> {
        Self::build(supervisor, None)
    }

    /// Same, with engine-lifecycle events appended to an NDJSON log.
    pub fn with_event_log(
        supervisor: Box<dyn EngineSupervisor>,
        events: NdjsonWriter,
    ) -> Arc<PoolManager> {
        Self::build(supervisor, Some(Mutex::new(events)))
    }

    fn build(
        supervisor: Box<dyn EngineSupervisor>,
        events: Option<Mutex<NdjsonWriter>>,
    ) -> Arc<PoolManager> {
        Arc::new(PoolManager {
            supervisor,
            state: Mutex::new(PoolState {
                proxies: FxHashMap::default(),
                idle: Default::default(),
            }),
            events,
        })
    }

    /// Wire a fresh engine connection into a proxy and start its reader.
    /// The proxy registers itself once its VERSION handshake lands.
    pub fn attach(self: Arc<Self>, conn: &Arc<Connection>) -> io::Result<Arc<Proxy>> {
        let mgr: Arc<dyn ProxyManager> = self;
        Proxy::attach(&mgr, conn)
    }

    /// Accept engines until the listener fails (e.g. is dropped or the
    /// socket is torn down).
    pub fn serve(self: Arc<Self>, listener: Listener) -> JoinHandle<()> {
        thread::spawn(move || loop {
            let stream = match listener.accept() {
                Ok(s) => s,
                Err(_) => break,
            };
            let conn = match Connection::new(stream) {
                Ok(c) => c,
                Err(_) => continue,
            };
            let _ = Arc::clone(&self).attach(&conn);
        })
    }

    /// Take an idle proxy of `kind` out of the pool, reserving it for the
    /// caller. Returns `None` when no live idle engine of that kind exists.
    pub fn checkout(&self, kind: EngineKind) -> Option<Arc<Proxy>> {
        let mut st = self.state.lock().unwrap();
        let queue = &mut st.idle[kind.index()];
        while let Some(weak) = queue.pop_front() {
            if let Some(proxy) = weak.upgrade() {
                if proxy.reserve() {
                    return Some(proxy);
                }
            }
        }
        None
    }

    /// Live idle entries of `kind` (diagnostic; checkout is authoritative).
    pub fn idle_count(&self, kind: EngineKind) -> usize {
        let st = self.state.lock().unwrap();
        st.idle[kind.index()]
            .iter()
            .filter(|w| w.upgrade().is_some_and(|p| !p.is_closed()))
            .count()
    }

    pub fn engine_count(&self) -> usize {
        self.state.lock().unwrap().proxies.len()
    }

    fn log_event<T: Serialize>(&self, event: &T) {
        if let Some(events) = &self.events {
            let mut w = events.lock().unwrap();
            let _ = w.write_event(event);
        }
    }
}

impl ProxyManager for PoolManager {
    fn on_ready(&self, kind: EngineKind, proxy: &Arc<Proxy>) -> Result<(), ManagerError> {
        let uid = proxy.uid();
        if !is_valid_uid(&uid) {
            return Err(ManagerError::BadUid(uid));
        }
        let newly_registered = {
            let mut st = self.state.lock().unwrap();
            let newly = !st.proxies.contains_key(&uid);
            if newly {
                st.proxies.insert(uid.clone(), Arc::clone(proxy));
            }
            st.idle[kind.index()].push_back(Arc::downgrade(proxy));
            newly
        };
        if newly_registered {
            self.log_event(&EngineConnectedV1::new(
                &uid,
                kind.name(),
                proxy.protocol_version(),
            ));
        } else {
            self.log_event(&EngineReadyV1::new(&uid, kind.name()));
        }
        Ok(())
    }

    fn kill(&self, uid: &str) -> Result<(), ManagerError> {
        let proxy = {
            let mut st = self.state.lock().unwrap();
            st.proxies.remove(uid)
        }
        .ok_or_else(|| ManagerError::UnknownUid(uid.to_string()))?;
        self.supervisor
            .kill(uid)
            .map_err(|e| ManagerError::Supervisor(e.to_string()))?;
        proxy.close();
        self.log_event(&EngineKilledV1::new(uid));
        Ok(())
    }
}
