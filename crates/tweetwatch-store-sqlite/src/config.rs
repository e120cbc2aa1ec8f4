//! Connection settings supplied by the hosting process.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 60;

/// Where the store lives and how long a call may wait on a locked database.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  pub path:                 PathBuf,
  #[serde(default = "default_connect_timeout_secs")]
  pub connect_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 { DEFAULT_CONNECT_TIMEOUT_SECS }

impl StoreConfig {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
  }

  pub fn connect_timeout(&self) -> Duration { Duration::from_secs(self.connect_timeout_secs) }
}
