//! Error type for `tweetwatch-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] tweetwatch_core::Error),

  /// Storage unreachable, or a write failed for a reason other than a
  /// duplicate key.
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// An existing index with the registered name has a different definition.
  /// Uniqueness cannot be trusted, so this is fatal at startup.
  #[error("index {index} conflicts with schema: expected {expected}, found {found}")]
  SchemaConflict {
    index:    String,
    expected: String,
    found:    String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
