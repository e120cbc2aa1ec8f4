//! Observable accounts (the watch list) and the derived set of accounts seen
//! in collected tweets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;

/// A watch-list entry. Unique per `(account_name, lang)`; registering the
/// same pair again overwrites `settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservableAccount {
  pub account_name: String,
  pub lang:         String,
  /// Free-form collector configuration for this entry.
  #[serde(flatten)]
  pub settings:     Map<String, Value>,
}

impl ObservableAccount {
  /// Keys a setting may not use; they would collide with the identifying
  /// fields once settings are flattened into the document.
  pub const RESERVED_KEYS: [&'static str; 2] = ["account_name", "lang"];

  pub fn is_reserved_key(key: &str) -> bool { Self::RESERVED_KEYS.contains(&key) }

  pub fn new(account_name: impl Into<String>, lang: impl Into<String>) -> Self {
    Self {
      account_name: account_name.into(),
      lang:         lang.into(),
      settings:     Map::new(),
    }
  }

  pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.settings.insert(key.into(), value.into());
    self
  }

  /// Reject settings that shadow `account_name` or `lang`.
  pub fn validate(&self) -> crate::Result<()> {
    match self.settings.keys().find(|k| Self::is_reserved_key(k)) {
      Some(key) => Err(Error::ReservedSetting(key.clone())),
      None => Ok(()),
    }
  }
}

/// Distinct `in_reply_to_screen_name` values across all tweets.
///
/// Computed on demand, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSet {
  pub names: BTreeSet<String>,
}

impl AccountSet {
  pub fn contains(&self, name: &str) -> bool { self.names.contains(name) }

  pub fn len(&self) -> usize { self.names.len() }

  pub fn is_empty(&self) -> bool { self.names.is_empty() }
}

impl FromIterator<String> for AccountSet {
  fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
    Self { names: iter.into_iter().collect() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn settings_flatten_into_the_document() {
    let acc = ObservableAccount::new("acme", "en").with_setting("interval", 30);
    let json = serde_json::to_value(&acc).unwrap();
    assert_eq!(json["account_name"], "acme");
    assert_eq!(json["interval"], 30);

    let back: ObservableAccount = serde_json::from_value(json).unwrap();
    assert_eq!(back, acc);
  }

  #[test]
  fn reserved_setting_keys_are_rejected() {
    let acc = ObservableAccount::new("acme", "en").with_setting("lang", "de");
    assert!(matches!(acc.validate(), Err(Error::ReservedSetting(ref k)) if k == "lang"));

    let acc = ObservableAccount::new("acme", "en").with_setting("account_name", "other");
    assert!(acc.validate().is_err());

    assert!(ObservableAccount::new("acme", "en").with_setting("interval", 5).validate().is_ok());
  }

  #[test]
  fn account_set_dedupes() {
    let set: AccountSet = ["A", "A", "B"].into_iter().map(String::from).collect();
    assert_eq!(set.len(), 2);
    assert!(set.contains("A") && set.contains("B"));
  }
}
