//! Human-assigned classification labels.

use serde::{Deserialize, Serialize};

/// A label a reviewer assigned to one tweet. At most one per `status_id`.
///
/// A label may exist before, after, or without the tweet it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetLabel {
  pub status_id: String,
  pub label:     String,
}

impl TweetLabel {
  pub fn new(status_id: impl Into<String>, label: impl Into<String>) -> Self {
    Self { status_id: status_id.into(), label: label.into() }
  }
}
