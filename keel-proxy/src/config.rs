//! Configuration consumed from the embedding process.
//!
//! Only two knobs reach this core: how many engine instances to expect and
//! where they connect.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Engine instances the embedder launches per kind.
    #[serde(default = "default_engine_count")]
    pub engine_count: usize,
    /// Socket engines connect to: a path (unix) or host:port (tcp).
    pub socket_addr: String,
}

fn default_engine_count() -> usize {
    1
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }
}
