//! Error types for `tweetwatch-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("classifier certainty {0} is outside 0..=100")]
  CertaintyOutOfRange(i64),

  #[error("invalid time window: from {from} is after to {to}")]
  InvalidWindow { from: i64, to: i64 },

  /// A setting key would shadow one of the account's identifying fields.
  #[error("setting key {0:?} is reserved")]
  ReservedSetting(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
