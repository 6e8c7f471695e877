//! Proxy endpoint: the per-connection state machine and message dispatcher.
//!
//! One proxy owns one engine connection. Host threads push call frames and
//! send INVOKE/GETAPI; the transport's reader thread drives [`Proxy::dispatch`]
//! for every inbound message. A single mutex serializes the reservation
//! flag, the frame stack and the identity fields.
//!
//! Lock discipline: the mutex is never held across a host callback, a
//! manager notification or a kill. Host code may therefore re-enter
//! `invoke`/`send_result` from inside `on_call` without deadlocking.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use keel_codec::{Address, HexInt, Value};
use keel_ipc::{Connection, FrameError, MessageHandler};

use crate::api::ApiInfo;
use crate::engine::EngineKind;
use crate::error::{ContextError, ManagerError, ProxyError};
use crate::frames::{CallFrame, FrameStack};
use crate::message::{self, tag};

/// Host-side callbacks for one invocation.
///
/// Terminal callbacks (`on_result`, `on_api`) fire exactly once per matching
/// frame; intermediate callbacks any number of times before that.
pub trait CallContext: Send + Sync {
    fn get_value(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ContextError>;
    fn set_value(&self, key: &[u8], value: &[u8]) -> Result<(), ContextError>;
    fn delete_value(&self, key: &[u8]) -> Result<(), ContextError>;
    fn get_info(&self) -> Value;
    fn get_balance(&self, addr: &Address) -> HexInt;
    fn on_event(&self, addr: Option<&Address>, indexed: Vec<Vec<u8>>, data: Vec<Vec<u8>>);
    fn on_result(&self, status: u16, step_used: HexInt, result: Value);
    fn on_call(
        &self,
        from: Option<&Address>,
        to: &Address,
        value: HexInt,
        limit: HexInt,
        method: &str,
        params: Value,
    );
    fn on_api(&self, status: u16, info: ApiInfo);
}

/// The slice of the pool manager the proxy consumes.
pub trait ProxyManager: Send + Sync {
    /// Announce that this proxy is idle and unreserved.
    fn on_ready(&self, kind: EngineKind, proxy: &Arc<Proxy>) -> Result<(), ManagerError>;

    /// Ask for the engine process behind `uid` to be terminated.
    fn kill(&self, uid: &str) -> Result<(), ManagerError>;
}

/// Outbound half of the engine connection, as the proxy sees it.
pub trait Transport: Send + Sync {
    fn send(&self, tag: u16, payload: &[u8]) -> Result<(), FrameError>;
    fn close(&self);
}

impl Transport for Connection {
    fn send(&self, tag: u16, payload: &[u8]) -> Result<(), FrameError> {
        Connection::send(self, tag, payload)
    }

    fn close(&self) {
        Connection::close(self)
    }
}

struct ProxyState {
    reserved: bool,
    closed: bool,
    version: u16,
    uid: String,
    kind: Option<EngineKind>,
    frames: FrameStack,
}

pub struct Proxy {
    weak_self: Weak<Proxy>,
    mgr: Weak<dyn ProxyManager>,
    conn: Arc<dyn Transport>,
    state: Mutex<ProxyState>,
}

impl Proxy {
    pub fn new(mgr: &Arc<dyn ProxyManager>, conn: Arc<dyn Transport>) -> Arc<Proxy> {
        Arc::new_cyclic(|weak_self| Proxy {
            weak_self: weak_self.clone(),
            mgr: Arc::downgrade(mgr),
            conn,
            state: Mutex::new(ProxyState {
                reserved: false,
                closed: false,
                version: 0,
                uid: String::new(),
                kind: None,
                frames: FrameStack::new(),
            }),
        })
    }

    /// Wire a fresh connection into a proxy and start its reader thread.
    pub fn attach(mgr: &Arc<dyn ProxyManager>, conn: &Arc<Connection>) -> io::Result<Arc<Proxy>> {
        let proxy = Proxy::new(mgr, Arc::clone(conn) as Arc<dyn Transport>);
        conn.serve(Arc::clone(&proxy) as Arc<dyn MessageHandler>)?;
        Ok(proxy)
    }

    fn lock(&self) -> MutexGuard<'_, ProxyState> {
        self.state.lock().unwrap()
    }

    pub fn uid(&self) -> String {
        self.lock().uid.clone()
    }

    pub fn kind(&self) -> Option<EngineKind> {
        self.lock().kind
    }

    pub fn protocol_version(&self) -> u16 {
        self.lock().version
    }

    pub fn pending_frames(&self) -> usize {
        self.lock().frames.len()
    }

    pub fn is_reserved(&self) -> bool {
        self.lock().reserved
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Atomic test-and-set used by the manager when handing the proxy out.
    /// Returns `false` if already reserved or closed.
    pub fn reserve(&self) -> bool {
        let mut st = self.lock();
        if st.reserved || st.closed {
            return false;
        }
        st.reserved = true;
        true
    }

    /// Drop the reservation. If no call is in flight the proxy goes back to
    /// the idle pool; otherwise the terminal pop will take it there.
    pub fn release(&self) {
        {
            let mut st = self.lock();
            if !st.reserved {
                return;
            }
            st.reserved = false;
            if !st.frames.is_empty() {
                return;
            }
        }
        if self.notify_ready().is_err() {
            self.conn.close();
        }
    }

    /// Start an invocation. The caller must hold the reservation; the result
    /// arrives later through `ctx.on_result`.
    #[allow(clippy::too_many_arguments)]
    pub fn invoke(
        &self,
        ctx: Arc<dyn CallContext>,
        code: &str,
        is_query: bool,
        from: &Address,
        to: &Address,
        value: HexInt,
        limit: HexInt,
        method: &str,
        params: Value,
    ) -> Result<(), ProxyError> {
        let m = message::InvokePayload {
            code: code.to_string(),
            is_query,
            from: *from,
            to: *to,
            value,
            limit,
            method: method.to_string(),
            params,
        };
        let payload = m.encode();

        // Push and send under one lock so the engine's replies always find
        // this frame on top.
        let mut st = self.lock();
        if !st.reserved {
            return Err(ProxyError::Protocol("invoke on unreserved proxy"));
        }
        st.frames.push(Some(*to), ctx);
        match self.conn.send(tag::INVOKE, &payload) {
            Ok(()) => Ok(()),
            Err(e) => {
                st.frames.pop();
                Err(e.into())
            }
        }
    }

    /// Fetch a contract's API descriptor; answered through `ctx.on_api`.
    pub fn get_api(&self, ctx: Arc<dyn CallContext>, code: &str) -> Result<(), ProxyError> {
        let payload = message::encode_str_payload(code);
        let mut st = self.lock();
        st.frames.push(None, ctx);
        match self.conn.send(tag::GETAPI, &payload) {
            Ok(()) => Ok(()),
            Err(e) => {
                st.frames.pop();
                Err(e.into())
            }
        }
    }

    /// Answer an engine-initiated sub-call. Routing is determined by the
    /// engine's own call stack; `ctx` is only a sanity witness.
    pub fn send_result(
        &self,
        ctx: &Arc<dyn CallContext>,
        status: u16,
        step_used: HexInt,
        result: Option<Value>,
    ) -> Result<(), ProxyError> {
        let _ = ctx;
        let m = message::ResultPayload {
            status,
            step_used,
            result: result.unwrap_or(Value::Nil),
        };
        self.conn.send(tag::RESULT, &m.encode())?;
        Ok(())
    }

    /// Ask the manager to terminate the engine process.
    pub fn kill(&self) -> Result<(), ProxyError> {
        // Taken outside the lock: the manager may call back into this proxy.
        let uid = self.uid();
        let mgr = self.mgr.upgrade().ok_or(ManagerError::Detached)?;
        mgr.kill(&uid)?;
        Ok(())
    }

    /// Close the transport. Pending frames are abandoned when the reader
    /// loop winds down.
    pub fn close(&self) {
        self.lock().closed = true;
        self.conn.close();
    }

    fn notify_ready(&self) -> Result<(), ProxyError> {
        let kind = self
            .lock()
            .kind
            .ok_or(ProxyError::Protocol("ready before version handshake"))?;
        let me = self
            .weak_self
            .upgrade()
            .ok_or(ProxyError::Protocol("proxy dropped"))?;
        let mgr = self.mgr.upgrade().ok_or(ManagerError::Detached)?;
        mgr.on_ready(kind, &me)?;
        Ok(())
    }

    /// Innermost in-flight frame, or a protocol error for a message that
    /// arrived with nothing in flight.
    fn top_frame(&self) -> Result<CallFrame, ProxyError> {
        self.lock()
            .frames
            .top()
            .ok_or(ProxyError::Protocol("engine message with no call in flight"))
    }

    fn pop_frame(&self) -> Result<CallFrame, ProxyError> {
        self.lock()
            .frames
            .pop()
            .ok_or(ProxyError::Protocol("terminal message with no call in flight"))
    }

    /// Readiness rule shared by RESULT and the GETAPI response: checked
    /// after the terminal callback returned.
    fn after_terminal(&self) -> Result<(), ProxyError> {
        let idle = {
            let st = self.lock();
            st.frames.is_empty() && !st.reserved
        };
        if idle {
            self.notify_ready()
        } else {
            Ok(())
        }
    }

    /// Handle one inbound message. Any error aborts the connection.
    pub(crate) fn dispatch(&self, msg_tag: u16, payload: &[u8]) -> Result<(), ProxyError> {
        match msg_tag {
            tag::VERSION => self.on_version(payload),
            tag::RESULT => self.on_result(payload),
            tag::GETVALUE => self.on_get_value(payload),
            tag::SETVALUE => self.on_set_value(payload),
            tag::CALL => self.on_call(payload),
            tag::EVENT => self.on_event(payload),
            tag::GETINFO => self.on_get_info(payload),
            tag::GETBALANCE => self.on_get_balance(payload),
            tag::GETAPI => self.on_api_response(payload),
            other => Err(ProxyError::UnknownMessage(other)),
        }
    }

    fn on_version(&self, payload: &[u8]) -> Result<(), ProxyError> {
        let m = message::VersionPayload::decode(payload)
            .map_err(ProxyError::malformed(tag::VERSION))?;
        let kind =
            EngineKind::from_name(&m.kind).ok_or(ProxyError::UnknownEngineKind(m.kind.clone()))?;
        {
            let mut st = self.lock();
            if st.kind.is_some() {
                return Err(ProxyError::Protocol("duplicate version handshake"));
            }
            st.version = m.version;
            st.uid = m.uid;
            st.kind = Some(kind);
        }
        self.notify_ready()
    }

    fn on_result(&self, payload: &[u8]) -> Result<(), ProxyError> {
        let m =
            message::ResultPayload::decode(payload).map_err(ProxyError::malformed(tag::RESULT))?;
        let frame = self.pop_frame()?;
        frame.ctx.on_result(m.status, m.step_used, m.result);
        self.after_terminal()
    }

    fn on_get_value(&self, payload: &[u8]) -> Result<(), ProxyError> {
        let key = message::decode_bytes_payload(payload)
            .map_err(ProxyError::malformed(tag::GETVALUE))?;
        let frame = self.top_frame()?;
        let reply = match frame.ctx.get_value(&key)? {
            Some(value) => message::GetValueResponse {
                success: true,
                value,
            },
            None => message::GetValueResponse {
                success: false,
                value: Vec::new(),
            },
        };
        self.conn.send(tag::GETVALUE, &reply.encode())?;
        Ok(())
    }

    fn on_set_value(&self, payload: &[u8]) -> Result<(), ProxyError> {
        let m = message::SetValuePayload::decode(payload)
            .map_err(ProxyError::malformed(tag::SETVALUE))?;
        let frame = self.top_frame()?;
        if m.is_delete {
            frame.ctx.delete_value(&m.key)?;
        } else {
            frame.ctx.set_value(&m.key, &m.value)?;
        }
        Ok(())
    }

    fn on_call(&self, payload: &[u8]) -> Result<(), ProxyError> {
        let m = message::CallPayload::decode(payload).map_err(ProxyError::malformed(tag::CALL))?;
        let frame = self.top_frame()?;
        frame.ctx.on_call(
            frame.addr.as_ref(),
            &m.to,
            m.value,
            m.limit,
            &m.method,
            m.params,
        );
        Ok(())
    }

    fn on_event(&self, payload: &[u8]) -> Result<(), ProxyError> {
        let m = message::EventPayload::decode(payload).map_err(ProxyError::malformed(tag::EVENT))?;
        let frame = self.top_frame()?;
        frame.ctx.on_event(frame.addr.as_ref(), m.indexed, m.data);
        Ok(())
    }

    fn on_get_info(&self, _payload: &[u8]) -> Result<(), ProxyError> {
        let frame = self.top_frame()?;
        let info = frame.ctx.get_info();
        self.conn
            .send(tag::GETINFO, &message::encode_value_payload(&info))?;
        Ok(())
    }

    fn on_get_balance(&self, payload: &[u8]) -> Result<(), ProxyError> {
        let addr = message::decode_address_payload(payload)
            .map_err(ProxyError::malformed(tag::GETBALANCE))?;
        let frame = self.top_frame()?;
        let balance = frame.ctx.get_balance(&addr);
        self.conn
            .send(tag::GETBALANCE, &message::encode_int_payload(balance))?;
        Ok(())
    }

    fn on_api_response(&self, payload: &[u8]) -> Result<(), ProxyError> {
        let m =
            message::GetApiResponse::decode(payload).map_err(ProxyError::malformed(tag::GETAPI))?;
        let frame = self.pop_frame()?;
        frame.ctx.on_api(m.status, m.info);
        self.after_terminal()
    }
}

impl MessageHandler for Proxy {
    fn on_message(
        &self,
        tag: u16,
        payload: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.dispatch(tag, payload).map_err(Into::into)
    }

    fn on_disconnect(&self) {
        let mut st = self.lock();
        st.closed = true;
        st.frames.clear();
    }
}
