//! Encoding and decoding helpers between domain types and SQLite rows.
//!
//! Tweets, profiles and labels map column-for-column. An observable
//! account's free-form settings are stored as a compact JSON object.

use rusqlite::{Row, types::Value};
use serde_json::{Map, Value as Json};
use tweetwatch_core::{
  account::ObservableAccount,
  label::TweetLabel,
  profile::Profile,
  tweet::{Certainty, Tweet},
};

use crate::Result;

// ─── Duplicate keys ──────────────────────────────────────────────────────────

/// True if `e` is a unique-constraint rejection, i.e. the row already exists.
pub fn is_duplicate_key(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

// ─── Settings ────────────────────────────────────────────────────────────────

pub fn encode_settings(settings: &Map<String, Json>) -> Result<String> {
  Ok(serde_json::to_string(settings)?)
}

pub fn decode_settings(s: &str) -> Result<Map<String, Json>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Tweets ──────────────────────────────────────────────────────────────────

pub const TWEET_COLUMNS: &str = "status_id, screen_name, text, lang, \
  in_reply_to_screen_name, tweet_class, classifier_certainty, created_at";

/// Bind values for an `items` insert, in [`TWEET_COLUMNS`] order.
pub fn tweet_params(t: &Tweet) -> Vec<Value> {
  vec![
    Value::Text(t.status_id.clone()),
    Value::Text(t.screen_name.clone()),
    Value::Text(t.text.clone()),
    Value::Text(t.lang.clone()),
    Value::Text(t.in_reply_to_screen_name.clone()),
    Value::Text(t.tweet_class.clone()),
    Value::Integer(t.classifier_certainty.into()),
    Value::Integer(t.created_at),
  ]
}

/// Raw values read directly from an `items` row.
pub struct RawTweet {
  pub status_id:               String,
  pub screen_name:             String,
  pub text:                    String,
  pub lang:                    String,
  /// NULL on records created by applying a label ahead of ingestion.
  pub in_reply_to_screen_name: Option<String>,
  pub tweet_class:             String,
  pub classifier_certainty:    i64,
  pub created_at:              i64,
}

impl RawTweet {
  /// Read a row selected with [`TWEET_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      status_id:               row.get(0)?,
      screen_name:             row.get(1)?,
      text:                    row.get(2)?,
      lang:                    row.get(3)?,
      in_reply_to_screen_name: row.get(4)?,
      tweet_class:             row.get(5)?,
      classifier_certainty:    row.get(6)?,
      created_at:              row.get(7)?,
    })
  }

  pub fn into_tweet(self) -> Result<Tweet> {
    Ok(Tweet {
      status_id:               self.status_id,
      screen_name:             self.screen_name,
      text:                    self.text,
      lang:                    self.lang,
      in_reply_to_screen_name: self.in_reply_to_screen_name.unwrap_or_default(),
      tweet_class:             self.tweet_class,
      classifier_certainty:    Certainty::new(self.classifier_certainty)?,
      created_at:              self.created_at,
    })
  }
}

// ─── Profiles ────────────────────────────────────────────────────────────────

pub const PROFILE_COLUMNS: &str =
  "profile_name, display_name, description, followers_count";

pub fn profile_params(p: &Profile) -> Vec<Value> {
  vec![
    Value::Text(p.profile_name.clone()),
    Value::Text(p.display_name.clone()),
    Value::Text(p.description.clone()),
    Value::Integer(p.followers_count),
  ]
}

pub fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
  Ok(Profile {
    profile_name:    row.get(0)?,
    display_name:    row.get(1)?,
    description:     row.get(2)?,
    followers_count: row.get(3)?,
  })
}

// ─── Observable accounts ─────────────────────────────────────────────────────

/// Raw values read directly from an `observable_accounts` row.
pub struct RawObservableAccount {
  pub account_name: String,
  pub lang:         String,
  pub settings:     String,
}

impl RawObservableAccount {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_name: row.get(0)?,
      lang:         row.get(1)?,
      settings:     row.get(2)?,
    })
  }

  pub fn into_account(self) -> Result<ObservableAccount> {
    Ok(ObservableAccount {
      account_name: self.account_name,
      lang:         self.lang,
      settings:     decode_settings(&self.settings)?,
    })
  }
}

// ─── Labels ──────────────────────────────────────────────────────────────────

pub fn label_params(l: &TweetLabel) -> Vec<Value> {
  vec![Value::Text(l.status_id.clone()), Value::Text(l.label.clone())]
}

pub fn label_from_row(row: &Row<'_>) -> rusqlite::Result<TweetLabel> {
  Ok(TweetLabel { status_id: row.get(0)?, label: row.get(1)? })
}
