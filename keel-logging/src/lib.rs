//! keel-logging: append-only NDJSON engine-lifecycle events.
//!
//! One JSON object per line, written as things happen, so a crashed run
//! still leaves a readable prefix for post-mortems.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Milliseconds since the unix epoch, for event timestamps.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// An engine finished its handshake and entered the pool.
#[derive(Debug, Clone, Serialize)]
pub struct EngineConnectedV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub uid: String,
    pub kind: &'static str,
    pub protocol_version: u16,
}

impl EngineConnectedV1 {
    pub fn new(uid: &str, kind: &'static str, protocol_version: u16) -> Self {
        Self {
            event: "engine_connected",
            ts_ms: now_ms(),
            uid: uid.to_string(),
            kind,
            protocol_version,
        }
    }
}

/// An already-known engine returned to the idle pool.
#[derive(Debug, Clone, Serialize)]
pub struct EngineReadyV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub uid: String,
    pub kind: &'static str,
}

impl EngineReadyV1 {
    pub fn new(uid: &str, kind: &'static str) -> Self {
        Self {
            event: "engine_ready",
            ts_ms: now_ms(),
            uid: uid.to_string(),
            kind,
        }
    }
}

/// The host asked for an engine to be terminated.
#[derive(Debug, Clone, Serialize)]
pub struct EngineKilledV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub uid: String,
}

impl EngineKilledV1 {
    pub fn new(uid: &str) -> Self {
        Self {
            event: "engine_killed",
            ts_ms: now_ms(),
            uid: uid.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum NdjsonError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl From<io::Error> for NdjsonError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for NdjsonError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl std::fmt::Display for NdjsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NdjsonError::Io(e) => write!(f, "io error: {e}"),
            NdjsonError::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl std::error::Error for NdjsonError {}

/// Append-only NDJSON writer.
///
/// Contract: each call writes exactly one JSON object followed by a newline.
pub struct NdjsonWriter {
    w: BufWriter<File>,
    lines_since_flush: u64,
    flush_every_lines: u64,
}

impl NdjsonWriter {
    /// Open a file for append, flushing after every line.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, NdjsonError> {
        Self::open_append_with_flush(path, 1)
    }

    /// `flush_every_lines=0` disables periodic flushing.
    pub fn open_append_with_flush(
        path: impl AsRef<Path>,
        flush_every_lines: u64,
    ) -> Result<Self, NdjsonError> {
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            w: BufWriter::new(f),
            lines_since_flush: 0,
            flush_every_lines,
        })
    }

    pub fn write_event<T: Serialize>(&mut self, event: &T) -> Result<(), NdjsonError> {
        let mut buf = serde_json::to_vec(event)?;
        buf.push(b'\n');
        self.w.write_all(&buf)?;
        self.lines_since_flush += 1;
        if self.flush_every_lines > 0 && self.lines_since_flush >= self.flush_every_lines {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), NdjsonError> {
        self.w.flush()?;
        self.lines_since_flush = 0;
        Ok(())
    }
}
