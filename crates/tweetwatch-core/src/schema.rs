//! Schema registry: the logical collections and their uniqueness contracts.
//!
//! Backends translate this table into whatever their engine uses for a
//! unique, insert-or-reject constraint. The key order is significant for
//! composite keys.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
  Items,
  Profiles,
  ObservableAccounts,
  Labels,
}

impl Collection {
  pub const ALL: [Collection; 4] = [
    Collection::Items,
    Collection::Profiles,
    Collection::ObservableAccounts,
    Collection::Labels,
  ];

  /// Persisted collection (table) name.
  pub fn name(self) -> &'static str {
    match self {
      Collection::Items => "items",
      Collection::Profiles => "profiles",
      Collection::ObservableAccounts => "observable_accounts",
      Collection::Labels => "labels",
    }
  }

  /// Columns that together identify one document.
  pub fn unique_key(self) -> &'static [&'static str] {
    match self {
      Collection::Items => &["status_id"],
      Collection::Profiles => &["profile_name"],
      Collection::ObservableAccounts => &["account_name", "lang"],
      Collection::Labels => &["status_id"],
    }
  }

  /// Name of the index enforcing [`Collection::unique_key`].
  pub fn index_name(self) -> String {
    format!("{}_{}_key", self.name(), self.unique_key().join("_"))
  }
}

impl fmt::Display for Collection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn index_names_are_distinct() {
    let mut names: Vec<_> = Collection::ALL.iter().map(|c| c.index_name()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), Collection::ALL.len());
  }

  #[test]
  fn composite_key_keeps_order() {
    assert_eq!(Collection::ObservableAccounts.unique_key(), &["account_name", "lang"]);
    assert_eq!(
      Collection::ObservableAccounts.index_name(),
      "observable_accounts_account_name_lang_key"
    );
  }
}
