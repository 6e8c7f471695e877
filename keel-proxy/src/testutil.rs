//! Test doubles shared by the proxy and manager unit tests.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use keel_codec::{Address, HexInt, Value};
use keel_ipc::FrameError;

use crate::api::ApiInfo;
use crate::engine::EngineKind;
use crate::error::{ContextError, ManagerError};
use crate::message::{self, tag};
use crate::proxy::{CallContext, Proxy, ProxyManager, Transport};

/// Context that ignores everything (for structural tests).
pub(crate) struct NullContext;

impl CallContext for NullContext {
    fn get_value(&self, _key: &[u8]) -> Result<Option<Vec<u8>>, ContextError> {
        Ok(None)
    }

    fn set_value(&self, _key: &[u8], _value: &[u8]) -> Result<(), ContextError> {
        Ok(())
    }

    fn delete_value(&self, _key: &[u8]) -> Result<(), ContextError> {
        Ok(())
    }

    fn get_info(&self) -> Value {
        Value::Nil
    }

    fn get_balance(&self, _addr: &Address) -> HexInt {
        HexInt::ZERO
    }

    fn on_event(&self, _addr: Option<&Address>, _indexed: Vec<Vec<u8>>, _data: Vec<Vec<u8>>) {}

    fn on_result(&self, _status: u16, _step_used: HexInt, _result: Value) {}

    fn on_call(
        &self,
        _from: Option<&Address>,
        _to: &Address,
        _value: HexInt,
        _limit: HexInt,
        _method: &str,
        _params: Value,
    ) {
    }

    fn on_api(&self, _status: u16, _info: ApiInfo) {}
}

/// One observed host callback, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Callback {
    Result {
        status: u16,
        step_used: HexInt,
        result: Value,
    },
    Api {
        status: u16,
        methods: usize,
    },
    Call {
        from: Option<Address>,
        to: Address,
        method: String,
    },
    Event {
        addr: Option<Address>,
        indexed: Vec<Vec<u8>>,
        data: Vec<Vec<u8>>,
    },
}

/// Context with a real key/value store and a callback journal.
#[derive(Default)]
pub(crate) struct RecordingContext {
    pub storage: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    pub balances: Mutex<HashMap<Address, HexInt>>,
    pub callbacks: Mutex<Vec<Callback>>,
    pub fail_reads: AtomicBool,
}

impl RecordingContext {
    pub fn with_entry(key: &[u8], value: &[u8]) -> Arc<RecordingContext> {
        let ctx = RecordingContext::default();
        ctx.storage
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        Arc::new(ctx)
    }

    pub fn callbacks(&self) -> Vec<Callback> {
        self.callbacks.lock().unwrap().clone()
    }
}

impl CallContext for RecordingContext {
    fn get_value(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ContextError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ContextError::new("storage backend unavailable"));
        }
        Ok(self.storage.lock().unwrap().get(key).cloned())
    }

    fn set_value(&self, key: &[u8], value: &[u8]) -> Result<(), ContextError> {
        self.storage
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete_value(&self, key: &[u8]) -> Result<(), ContextError> {
        self.storage.lock().unwrap().remove(key);
        Ok(())
    }

    fn get_info(&self) -> Value {
        Value::Map(vec![("height".to_string(), Value::Int(HexInt::new(7)))])
    }

    fn get_balance(&self, addr: &Address) -> HexInt {
        self.balances
            .lock()
            .unwrap()
            .get(addr)
            .copied()
            .unwrap_or(HexInt::ZERO)
    }

    fn on_event(&self, addr: Option<&Address>, indexed: Vec<Vec<u8>>, data: Vec<Vec<u8>>) {
        self.callbacks.lock().unwrap().push(Callback::Event {
            addr: addr.copied(),
            indexed,
            data,
        });
    }

    fn on_result(&self, status: u16, step_used: HexInt, result: Value) {
        self.callbacks.lock().unwrap().push(Callback::Result {
            status,
            step_used,
            result,
        });
    }

    fn on_call(
        &self,
        from: Option<&Address>,
        to: &Address,
        _value: HexInt,
        _limit: HexInt,
        method: &str,
        _params: Value,
    ) {
        self.callbacks.lock().unwrap().push(Callback::Call {
            from: from.copied(),
            to: *to,
            method: method.to_string(),
        });
    }

    fn on_api(&self, status: u16, info: ApiInfo) {
        self.callbacks.lock().unwrap().push(Callback::Api {
            status,
            methods: info.methods.len(),
        });
    }
}

/// Transport that records outbound messages instead of writing a socket.
#[derive(Default)]
pub(crate) struct MockTransport {
    pub sent: Mutex<Vec<(u16, Vec<u8>)>>,
    pub closed: AtomicBool,
    pub fail_sends: AtomicBool,
}

impl MockTransport {
    pub fn sent_tags(&self) -> Vec<u16> {
        self.sent.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn last_sent(&self, want_tag: u16) -> Vec<u8> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(t, _)| *t == want_tag)
            .map(|(_, p)| p.clone())
            .unwrap_or_else(|| panic!("no message with tag {want_tag} was sent"))
    }
}

impl Transport for MockTransport {
    fn send(&self, tag: u16, payload: &[u8]) -> Result<(), FrameError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(FrameError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock transport down",
            )));
        }
        self.sent.lock().unwrap().push((tag, payload.to_vec()));
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Manager double counting readiness announcements and kills.
#[derive(Default)]
pub(crate) struct RecordingManager {
    pub ready: Mutex<Vec<(EngineKind, String)>>,
    pub kills: Mutex<Vec<String>>,
    pub fail_ready: AtomicBool,
}

impl RecordingManager {
    pub fn ready_count(&self) -> usize {
        self.ready.lock().unwrap().len()
    }
}

impl ProxyManager for RecordingManager {
    fn on_ready(&self, kind: EngineKind, proxy: &Arc<Proxy>) -> Result<(), ManagerError> {
        if self.fail_ready.load(Ordering::SeqCst) {
            return Err(ManagerError::Supervisor("pool refused".to_string()));
        }
        self.ready.lock().unwrap().push((kind, proxy.uid()));
        Ok(())
    }

    fn kill(&self, uid: &str) -> Result<(), ManagerError> {
        self.kills.lock().unwrap().push(uid.to_string());
        Ok(())
    }
}

/// Proxy wired to a mock transport and a recording manager.
pub(crate) fn test_proxy() -> (Arc<Proxy>, Arc<MockTransport>, Arc<RecordingManager>) {
    let mgr = Arc::new(RecordingManager::default());
    let mgr_dyn: Arc<dyn ProxyManager> = Arc::clone(&mgr) as Arc<dyn ProxyManager>;
    let conn = Arc::new(MockTransport::default());
    let proxy = Proxy::new(&mgr_dyn, Arc::clone(&conn) as Arc<dyn Transport>);
    (proxy, conn, mgr)
}

/// Drive the VERSION handshake with a fresh uid; returns the uid.
pub(crate) fn handshake(proxy: &Arc<Proxy>, kind: &str) -> String {
    let uid = crate::engine::new_uid();
    let m = message::VersionPayload {
        version: 1,
        uid: uid.clone(),
        kind: kind.to_string(),
    };
    proxy
        .dispatch(tag::VERSION, &m.encode())
        .expect("version handshake");
    uid
}

pub(crate) fn addr(last: u8) -> Address {
    let mut body = [0u8; 20];
    body[19] = last;
    Address::account(body)
}

pub(crate) fn contract_addr(last: u8) -> Address {
    let mut body = [0u8; 20];
    body[19] = last;
    Address::contract(body)
}
