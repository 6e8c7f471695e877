//! One framed engine connection: a locked writer shared by host threads and
//! a dedicated reader thread that feeds a [`MessageHandler`].
//!
//! Inbound messages are delivered strictly in arrival order on a single
//! thread. A read failure or a handler error closes the connection; the
//! handler's `on_disconnect` fires exactly once when the reader exits.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::frame::{read_message, write_message, FrameError};
use crate::stream::Stream;

/// Per-connection dispatch target for inbound messages.
pub trait MessageHandler: Send + Sync {
    /// Handle one inbound message. An error aborts the connection.
    fn on_message(
        &self,
        tag: u16,
        payload: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Called exactly once after the reader loop exits, whatever the cause.
    fn on_disconnect(&self);
}

pub struct Connection {
    writer: Mutex<Stream>,
    ctl: Stream,
    closed: Arc<AtomicBool>,
}

impl Connection {
    pub fn new(stream: Stream) -> io::Result<Arc<Connection>> {
        let writer = stream.try_clone()?;
        Ok(Arc::new(Connection {
            writer: Mutex::new(writer),
            ctl: stream,
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }

    /// Serialize one tagged message into a frame. Safe from any thread.
    pub fn send(&self, tag: u16, payload: &[u8]) -> Result<(), FrameError> {
        if self.is_closed() {
            return Err(FrameError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "connection closed",
            )));
        }
        let mut w = self.writer.lock().unwrap();
        write_message(&mut *w, tag, payload)
    }

    /// Shut the socket down. Idempotent; the reader loop will observe EOF.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.ctl.shutdown();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Spawn the reader thread delivering inbound messages to `handler`.
    pub fn serve(&self, handler: Arc<dyn MessageHandler>) -> io::Result<JoinHandle<()>> {
        let stream = self.ctl.try_clone()?;
        let closed = Arc::clone(&self.closed);
        thread::Builder::new()
            .name("keel-ipc-reader".to_string())
            .spawn(move || reader_loop(stream, closed, handler))
    }
}

fn reader_loop(mut stream: Stream, closed: Arc<AtomicBool>, handler: Arc<dyn MessageHandler>) {
    loop {
        let (tag, payload) = match read_message(&mut stream) {
            Ok(m) => m,
            Err(_) => break,
        };
        if handler.on_message(tag, &payload).is_err() {
            break;
        }
        if closed.load(Ordering::SeqCst) {
            break;
        }
    }
    if !closed.swap(true, Ordering::SeqCst) {
        stream.shutdown();
    }
    handler.on_disconnect();
}
