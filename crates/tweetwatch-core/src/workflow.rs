//! The label workflow: what happens when a reviewer annotates a tweet.
//!
//! Annotation is two independent store calls: record the label, then copy it
//! onto the tweet's denormalised `tweet_class` / `classifier_certainty`. The
//! calls are not atomic. If the second one fails the label stays recorded
//! and the tweet keeps its previous classification until the annotation is
//! retried; both steps are idempotent, so retrying is always safe.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
  label::TweetLabel,
  store::{InsertOutcome, TweetStore},
};

/// What [`annotate`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
  pub label:   TweetLabel,
  /// Whether the label record was new or already present.
  pub outcome: InsertOutcome,
}

/// Record `label` and apply it to the tweet it names.
pub async fn annotate<S: TweetStore>(
  store: &S,
  label: TweetLabel,
) -> Result<Annotation, S::Error> {
  let outcome = store.insert_label(&label).await?;

  if let Err(e) = store.apply_label_to_tweet(&label).await {
    warn!(
      status_id = %label.status_id,
      label = %label.label,
      error = %e,
      "label recorded but not applied to tweet",
    );
    return Err(e);
  }

  info!(status_id = %label.status_id, label = %label.label, ?outcome, "tweet annotated");
  Ok(Annotation { label, outcome })
}

#[cfg(test)]
mod tests {
  use std::{collections::HashMap, sync::Mutex};

  use super::*;
  use crate::{
    account::{AccountSet, ObservableAccount},
    profile::Profile,
    store::{InsertReport, TimeWindow},
    tweet::{Certainty, Tweet},
  };

  #[derive(Debug, thiserror::Error)]
  #[error("storage unavailable")]
  struct Unavailable;

  /// A store that keeps labels and tweets in memory and can be told to fail
  /// the apply step.
  #[derive(Default)]
  struct MemStore {
    labels:     Mutex<Vec<TweetLabel>>,
    tweets:     Mutex<HashMap<String, Tweet>>,
    fail_apply: bool,
  }

  impl TweetStore for MemStore {
    type Error = Unavailable;

    async fn ensure_indexes(&self) -> Result<(), Self::Error> { unimplemented!() }
    async fn insert_tweets(&self, _: Vec<Tweet>) -> Result<InsertReport, Self::Error> { unimplemented!() }
    async fn insert_profiles(&self, _: Vec<Profile>) -> Result<InsertReport, Self::Error> { unimplemented!() }
    async fn upsert_observable_account(&self, _: &ObservableAccount) -> Result<(), Self::Error> { unimplemented!() }
    async fn delete_observable_account(&self, _: &str) -> Result<usize, Self::Error> { unimplemented!() }

    async fn insert_label(&self, label: &TweetLabel) -> Result<InsertOutcome, Self::Error> {
      let mut labels = self.labels.lock().unwrap();
      if labels.iter().any(|l| l.status_id == label.status_id) {
        return Ok(InsertOutcome::AlreadyExists);
      }
      labels.push(label.clone());
      Ok(InsertOutcome::Inserted)
    }

    async fn apply_label_to_tweet(&self, label: &TweetLabel) -> Result<(), Self::Error> {
      if self.fail_apply {
        return Err(Unavailable);
      }
      let mut tweets = self.tweets.lock().unwrap();
      let tweet = tweets
        .entry(label.status_id.clone())
        .or_insert_with(|| Tweet { status_id: label.status_id.clone(), ..Default::default() });
      tweet.tweet_class = label.label.clone();
      tweet.classifier_certainty = Certainty::HUMAN;
      Ok(())
    }

    async fn get_tweet(&self, status_id: &str) -> Result<Option<Tweet>, Self::Error> {
      Ok(self.tweets.lock().unwrap().get(status_id).cloned())
    }

    async fn find_by_account_and_class(&self, _: &str, _: &str) -> Result<Vec<Tweet>, Self::Error> { unimplemented!() }
    async fn find_by_account(&self, _: &str) -> Result<Vec<Tweet>, Self::Error> { unimplemented!() }
    async fn find_unlabeled_by_account(&self, _: &str) -> Result<Vec<Tweet>, Self::Error> { unimplemented!() }
    async fn find_by_account_in_window(&self, _: &str, _: TimeWindow) -> Result<Vec<Tweet>, Self::Error> { unimplemented!() }
    async fn distinct_accounts(&self) -> Result<AccountSet, Self::Error> { unimplemented!() }
    async fn list_observable_accounts(&self) -> Result<Vec<ObservableAccount>, Self::Error> { unimplemented!() }

    async fn list_labels(&self) -> Result<Vec<TweetLabel>, Self::Error> {
      Ok(self.labels.lock().unwrap().clone())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, Self::Error> { unimplemented!() }
  }

  fn tweet(status_id: &str, certainty: i64) -> Tweet {
    Tweet {
      status_id: status_id.into(),
      in_reply_to_screen_name: "acme".into(),
      tweet_class: "praise".into(),
      classifier_certainty: Certainty::new(certainty).unwrap(),
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn annotate_records_and_applies() {
    let store = MemStore::default();
    store.tweets.lock().unwrap().insert("s1".into(), tweet("s1", 37));

    let ann = annotate(&store, TweetLabel::new("s1", "spam")).await.unwrap();
    assert_eq!(ann.outcome, InsertOutcome::Inserted);

    let t = store.get_tweet("s1").await.unwrap().unwrap();
    assert_eq!(t.tweet_class, "spam");
    assert_eq!(t.classifier_certainty, Certainty::HUMAN);
    assert_eq!(t.in_reply_to_screen_name, "acme");
  }

  #[tokio::test]
  async fn annotate_twice_reports_existing_label() {
    let store = MemStore::default();
    annotate(&store, TweetLabel::new("s1", "spam")).await.unwrap();
    let again = annotate(&store, TweetLabel::new("s1", "spam")).await.unwrap();

    assert_eq!(again.outcome, InsertOutcome::AlreadyExists);
    assert_eq!(store.list_labels().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn failed_apply_leaves_label_recorded() {
    let store = MemStore { fail_apply: true, ..Default::default() };
    store.tweets.lock().unwrap().insert("s1".into(), tweet("s1", 37));

    assert!(annotate(&store, TweetLabel::new("s1", "spam")).await.is_err());

    assert_eq!(store.list_labels().await.unwrap(), vec![TweetLabel::new("s1", "spam")]);
    let t = store.get_tweet("s1").await.unwrap().unwrap();
    assert_eq!(t.tweet_class, "praise");
    assert_eq!(t.classifier_certainty.get(), 37);
  }
}
