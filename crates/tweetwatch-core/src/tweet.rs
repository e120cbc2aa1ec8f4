//! Tweets — the collected items the labeling workflow operates on.
//!
//! A tweet is identified by its `status_id`, assigned by the platform it was
//! collected from. At most one tweet exists per `status_id`.

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Certainty ───────────────────────────────────────────────────────────────

/// How sure the classifier (or a human) is about `tweet_class`, in percent.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
  Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct Certainty(u8);

impl Certainty {
  /// Human annotations are authoritative over any automated score.
  pub const HUMAN: Certainty = Certainty(100);

  pub fn new(value: i64) -> crate::Result<Self> {
    match u8::try_from(value) {
      Ok(v) if v <= 100 => Ok(Self(v)),
      _ => Err(Error::CertaintyOutOfRange(value)),
    }
  }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<i64> for Certainty {
  type Error = Error;

  fn try_from(value: i64) -> crate::Result<Self> { Self::new(value) }
}

impl From<Certainty> for i64 {
  fn from(c: Certainty) -> i64 { i64::from(c.0) }
}

// ─── Tweet ───────────────────────────────────────────────────────────────────

/// A collected tweet.
///
/// Every field except `status_id` may be absent in storage (a label can be
/// applied before the tweet itself is ingested); absent fields read back as
/// their zero value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tweet {
  pub status_id:               String,
  /// Author of the tweet.
  #[serde(default)]
  pub screen_name:             String,
  #[serde(default)]
  pub text:                    String,
  #[serde(default)]
  pub lang:                    String,
  /// The monitored account this tweet was addressed to.
  #[serde(default)]
  pub in_reply_to_screen_name: String,
  #[serde(default)]
  pub tweet_class:             String,
  #[serde(default)]
  pub classifier_certainty:    Certainty,
  /// Unix seconds; the ordinal range queries filter on.
  #[serde(default)]
  pub created_at:              i64,
}

impl Tweet {
  pub fn new(status_id: impl Into<String>, in_reply_to: impl Into<String>) -> Self {
    Self {
      status_id: status_id.into(),
      in_reply_to_screen_name: in_reply_to.into(),
      ..Default::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn certainty_accepts_bounds() {
    assert_eq!(Certainty::new(0).unwrap().get(), 0);
    assert_eq!(Certainty::new(100).unwrap(), Certainty::HUMAN);
  }

  #[test]
  fn certainty_rejects_out_of_range() {
    assert!(matches!(Certainty::new(101), Err(Error::CertaintyOutOfRange(101))));
    assert!(matches!(Certainty::new(-1), Err(Error::CertaintyOutOfRange(-1))));
  }

  #[test]
  fn tweet_deserializes_with_missing_fields() {
    let tweet: Tweet =
      serde_json::from_str(r#"{"status_id":"s1","classifier_certainty":42}"#).unwrap();
    assert_eq!(tweet.status_id, "s1");
    assert_eq!(tweet.classifier_certainty.get(), 42);
    assert!(tweet.in_reply_to_screen_name.is_empty());
    assert_eq!(tweet.created_at, 0);
  }

  #[test]
  fn tweet_rejects_invalid_certainty() {
    let res: Result<Tweet, _> =
      serde_json::from_str(r#"{"status_id":"s1","classifier_certainty":250}"#);
    assert!(res.is_err());
  }
}
