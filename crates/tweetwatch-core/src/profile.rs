//! Profiles of monitored accounts.

use serde::{Deserialize, Serialize};

/// Account metadata keyed by `profile_name`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
  pub profile_name:    String,
  #[serde(default)]
  pub display_name:    String,
  #[serde(default)]
  pub description:     String,
  #[serde(default)]
  pub followers_count: i64,
}
