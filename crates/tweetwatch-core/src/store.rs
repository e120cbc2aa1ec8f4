//! The `TweetStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `tweetwatch-store-sqlite`). The label workflow and the binary depend on
//! this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error,
  account::{AccountSet, ObservableAccount},
  label::TweetLabel,
  profile::Profile,
  tweet::Tweet,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// An inclusive range over `Tweet::created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
  pub from: i64,
  pub to:   i64,
}

impl TimeWindow {
  pub fn new(from: i64, to: i64) -> crate::Result<Self> {
    if from > to {
      return Err(Error::InvalidWindow { from, to });
    }
    Ok(Self { from, to })
  }

  /// The Monday-to-Sunday UTC week containing `instant`.
  pub fn week_of(instant: DateTime<Utc>) -> Self {
    let date = instant.date_naive();
    let monday =
      date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    let from = monday.and_time(NaiveTime::MIN).and_utc().timestamp();
    Self { from, to: from + Duration::weeks(1).num_seconds() - 1 }
  }

  pub fn contains(&self, ordinal: i64) -> bool {
    (self.from..=self.to).contains(&ordinal)
  }
}

// ─── Write outcomes ──────────────────────────────────────────────────────────

/// Result of an idempotent insert. A duplicate key is not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertOutcome {
  Inserted,
  AlreadyExists,
}

/// Tally for a batch of idempotent inserts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertReport {
  pub inserted:        usize,
  pub already_present: usize,
}

impl InsertReport {
  pub fn record(&mut self, outcome: InsertOutcome) {
    match outcome {
      InsertOutcome::Inserted => self.inserted += 1,
      InsertOutcome::AlreadyExists => self.already_present += 1,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a tweetwatch storage backend.
///
/// Every operation is a single-document, non-transactional call. The unique
/// keys declared in [`crate::schema::Collection`] are the only cross-caller
/// consistency mechanism: the first writer for a key wins and later inserts
/// of the same key report [`InsertOutcome::AlreadyExists`].
///
/// Read failures are always returned as errors, never as empty results.
pub trait TweetStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Index manager ─────────────────────────────────────────────────────

  /// Ensure every collection carries its unique index. Idempotent; fails if
  /// an existing index disagrees with the registered definition.
  fn ensure_indexes(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Write gateway ─────────────────────────────────────────────────────

  /// Insert each tweet independently, in order. Duplicates are counted, not
  /// raised, and do not stop the rest of the batch.
  ///
  /// Any other failure stops the batch and is returned. Tweets inserted
  /// before it stay stored; those after it are not attempted.
  fn insert_tweets(
    &self,
    tweets: Vec<Tweet>,
  ) -> impl Future<Output = Result<InsertReport, Self::Error>> + Send + '_;

  /// Insert each profile independently, keyed by `profile_name`. Same
  /// duplicate and failure semantics as [`TweetStore::insert_tweets`].
  fn insert_profiles(
    &self,
    profiles: Vec<Profile>,
  ) -> impl Future<Output = Result<InsertReport, Self::Error>> + Send + '_;

  /// Replace the entry matching `(account_name, lang)`, or create it.
  /// Settings using a reserved key are rejected before anything is written
  /// (see [`ObservableAccount::validate`]).
  fn upsert_observable_account<'a>(
    &'a self,
    account: &'a ObservableAccount,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove every entry named `account_name`, across all languages.
  /// Returns the number of removed entries.
  fn delete_observable_account<'a>(
    &'a self,
    account_name: &'a str,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Idempotent label insert keyed by `status_id`.
  fn insert_label<'a>(
    &'a self,
    label: &'a TweetLabel,
  ) -> impl Future<Output = Result<InsertOutcome, Self::Error>> + Send + 'a;

  /// Set the tweet's class to the label and its certainty to
  /// [`Certainty::HUMAN`](crate::tweet::Certainty::HUMAN). If no tweet with
  /// that `status_id` exists, a partial one holding only those fields is
  /// created.
  fn apply_label_to_tweet<'a>(
    &'a self,
    label: &'a TweetLabel,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Query engine ──────────────────────────────────────────────────────

  fn get_tweet<'a>(
    &'a self,
    status_id: &'a str,
  ) -> impl Future<Output = Result<Option<Tweet>, Self::Error>> + Send + 'a;

  /// Tweets addressed to `account` carrying class `class`.
  fn find_by_account_and_class<'a>(
    &'a self,
    account: &'a str,
    class: &'a str,
  ) -> impl Future<Output = Result<Vec<Tweet>, Self::Error>> + Send + 'a;

  /// All tweets addressed to `account`.
  fn find_by_account<'a>(
    &'a self,
    account: &'a str,
  ) -> impl Future<Output = Result<Vec<Tweet>, Self::Error>> + Send + 'a;

  /// Tweets addressed to `account` whose `status_id` has no label.
  fn find_unlabeled_by_account<'a>(
    &'a self,
    account: &'a str,
  ) -> impl Future<Output = Result<Vec<Tweet>, Self::Error>> + Send + 'a;

  /// Tweets addressed to `account` with `created_at` inside `window`
  /// (both bounds inclusive).
  fn find_by_account_in_window<'a>(
    &'a self,
    account: &'a str,
    window: TimeWindow,
  ) -> impl Future<Output = Result<Vec<Tweet>, Self::Error>> + Send + 'a;

  /// Distinct `in_reply_to_screen_name` values over all tweets.
  fn distinct_accounts(
    &self,
  ) -> impl Future<Output = Result<AccountSet, Self::Error>> + Send + '_;

  fn list_observable_accounts(
    &self,
  ) -> impl Future<Output = Result<Vec<ObservableAccount>, Self::Error>> + Send + '_;

  fn list_labels(&self) -> impl Future<Output = Result<Vec<TweetLabel>, Self::Error>> + Send + '_;

  fn list_profiles(&self) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn window_rejects_inverted_bounds() {
    assert!(matches!(
      TimeWindow::new(20, 10),
      Err(Error::InvalidWindow { from: 20, to: 10 })
    ));
    assert!(TimeWindow::new(10, 10).is_ok());
  }

  #[test]
  fn window_bounds_are_inclusive() {
    let w = TimeWindow::new(10, 20).unwrap();
    for inside in [10, 15, 20] {
      assert!(w.contains(inside));
    }
    for outside in [9, 21] {
      assert!(!w.contains(outside));
    }
  }

  #[test]
  fn week_of_midweek_instant() {
    // Wednesday 2024-01-03 12:30 UTC.
    let instant = Utc.with_ymd_and_hms(2024, 1, 3, 12, 30, 0).unwrap();
    let w = TimeWindow::week_of(instant);
    assert_eq!(w.from, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp());
    assert_eq!(w.to, Utc.with_ymd_and_hms(2024, 1, 7, 23, 59, 59).unwrap().timestamp());
    assert!(w.contains(instant.timestamp()));
  }

  #[test]
  fn week_of_monday_midnight_starts_that_week() {
    let monday = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
    assert_eq!(TimeWindow::week_of(monday).from, monday.timestamp());
  }

  #[test]
  fn report_tallies_outcomes() {
    let mut report = InsertReport::default();
    report.record(InsertOutcome::Inserted);
    report.record(InsertOutcome::AlreadyExists);
    report.record(InsertOutcome::AlreadyExists);
    assert_eq!(report, InsertReport { inserted: 1, already_present: 2 });
  }
}
