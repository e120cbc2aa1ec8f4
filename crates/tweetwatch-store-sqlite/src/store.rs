//! [`SqliteStore`] — the SQLite implementation of [`TweetStore`].

use std::{path::Path, time::Duration};

use rusqlite::{OptionalExtension as _, types::Value};
use tracing::{debug, info};

use tweetwatch_core::{
  account::{AccountSet, ObservableAccount},
  label::TweetLabel,
  profile::Profile,
  schema::Collection,
  store::{InsertOutcome, InsertReport, TimeWindow, TweetStore},
  tweet::{Certainty, Tweet},
};

use crate::{
  Error, Result, StoreConfig,
  config::DEFAULT_CONNECT_TIMEOUT_SECS,
  encode::{
    PROFILE_COLUMNS, RawObservableAccount, RawTweet, TWEET_COLUMNS, encode_settings,
    is_duplicate_key, label_from_row, label_params, profile_from_row, profile_params,
    tweet_params,
  },
  schema::{IndexShape, TABLES, read_index_shape, unique_index_ddl},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A tweetwatch store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Callers
/// share one store across tasks instead of reaching for global state.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, create tables and ensure indexes.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::bootstrap(conn, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)).await
  }

  /// Open the store described by `config`.
  pub async fn open_with_config(config: &StoreConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(&config.path).await?;
    Self::bootstrap(conn, config.connect_timeout()).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::bootstrap(conn, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)).await
  }

  async fn bootstrap(conn: tokio_rusqlite::Connection, timeout: Duration) -> Result<Self> {
    conn
      .call(move |conn| {
        conn.busy_timeout(timeout)?;
        conn.execute_batch(TABLES)?;
        Ok(())
      })
      .await?;

    let store = Self { conn };
    store.ensure_indexes().await?;
    Ok(store)
  }

  /// Run raw SQL against the connection; tests use it to corrupt the schema.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert one row, mapping a unique-key rejection to
  /// [`InsertOutcome::AlreadyExists`].
  async fn insert_idempotent(
    &self,
    sql:    &'static str,
    values: Vec<Value>,
  ) -> Result<InsertOutcome> {
    let outcome = self
      .conn
      .call(move |conn| match conn.execute(sql, rusqlite::params_from_iter(values)) {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(e) if is_duplicate_key(&e) => Ok(InsertOutcome::AlreadyExists),
        Err(e) => Err(e.into()),
      })
      .await?;
    Ok(outcome)
  }

  /// Run a `SELECT` over [`TWEET_COLUMNS`] and decode every row.
  async fn query_tweets(&self, sql: String, values: Vec<Value>) -> Result<Vec<Tweet>> {
    let raws: Vec<RawTweet> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(values), RawTweet::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTweet::into_tweet).collect()
  }
}

const INSERT_TWEET: &str = "INSERT INTO items (
    status_id, screen_name, text, lang,
    in_reply_to_screen_name, tweet_class, classifier_certainty, created_at
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const INSERT_PROFILE: &str = "INSERT INTO profiles (
    profile_name, display_name, description, followers_count
  ) VALUES (?1, ?2, ?3, ?4)";

const INSERT_LABEL: &str = "INSERT INTO labels (status_id, label) VALUES (?1, ?2)";

fn select_tweets(where_clause: &str) -> String {
  format!(
    "SELECT {TWEET_COLUMNS} FROM items {where_clause} ORDER BY created_at, status_id"
  )
}

// ─── TweetStore impl ─────────────────────────────────────────────────────────

impl TweetStore for SqliteStore {
  type Error = Error;

  // ── Index manager ─────────────────────────────────────────────────────────

  async fn ensure_indexes(&self) -> Result<()> {
    for collection in Collection::ALL {
      let table = collection.name();
      let index = collection.index_name();
      let ddl = unique_index_ddl(collection);

      // `IF NOT EXISTS` matches on name only, so read back what is actually
      // there and compare it with the registry.
      let index_for_call = index.clone();
      let found = self
        .conn
        .call(move |conn| {
          conn.execute_batch(&ddl)?;
          Ok(read_index_shape(conn, table, &index_for_call)?)
        })
        .await?;

      let expected = IndexShape::expected(collection);
      match found {
        Some(shape) if shape == expected => {
          info!(%collection, %index, "unique index ensured");
        }
        other => {
          return Err(Error::SchemaConflict {
            index,
            expected: expected.describe(),
            found: other.map_or_else(|| "nothing".to_owned(), |s| s.describe()),
          });
        }
      }
    }
    Ok(())
  }

  // ── Write gateway ─────────────────────────────────────────────────────────

  async fn insert_tweets(&self, tweets: Vec<Tweet>) -> Result<InsertReport> {
    let mut report = InsertReport::default();
    for tweet in tweets {
      let outcome = self.insert_idempotent(INSERT_TWEET, tweet_params(&tweet)).await?;
      if outcome == InsertOutcome::AlreadyExists {
        debug!(status_id = %tweet.status_id, "tweet already stored");
      }
      report.record(outcome);
    }
    Ok(report)
  }

  async fn insert_profiles(&self, profiles: Vec<Profile>) -> Result<InsertReport> {
    let mut report = InsertReport::default();
    for profile in profiles {
      let outcome =
        self.insert_idempotent(INSERT_PROFILE, profile_params(&profile)).await?;
      if outcome == InsertOutcome::AlreadyExists {
        debug!(profile_name = %profile.profile_name, "profile already stored");
      }
      report.record(outcome);
    }
    Ok(report)
  }

  async fn upsert_observable_account(&self, account: &ObservableAccount) -> Result<()> {
    account.validate()?;

    let name = account.account_name.clone();
    let lang = account.lang.clone();
    let settings = encode_settings(&account.settings)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO observable_accounts (account_name, lang, settings)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (account_name, lang) DO UPDATE SET settings = excluded.settings",
          rusqlite::params![name, lang, settings],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_observable_account(&self, account_name: &str) -> Result<usize> {
    let name = account_name.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM observable_accounts WHERE account_name = ?1",
          rusqlite::params![name],
        )?)
      })
      .await?;

    debug!(account_name, removed, "observable account deleted");
    Ok(removed)
  }

  async fn insert_label(&self, label: &TweetLabel) -> Result<InsertOutcome> {
    let outcome = self.insert_idempotent(INSERT_LABEL, label_params(label)).await?;
    if outcome == InsertOutcome::AlreadyExists {
      debug!(status_id = %label.status_id, "label already stored");
    }
    Ok(outcome)
  }

  async fn apply_label_to_tweet(&self, label: &TweetLabel) -> Result<()> {
    let status_id = label.status_id.clone();
    let class = label.label.clone();
    let certainty = i64::from(Certainty::HUMAN);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO items (status_id, tweet_class, classifier_certainty)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (status_id) DO UPDATE SET
             tweet_class          = excluded.tweet_class,
             classifier_certainty = excluded.classifier_certainty",
          rusqlite::params![status_id, class, certainty],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Query engine ──────────────────────────────────────────────────────────

  async fn get_tweet(&self, status_id: &str) -> Result<Option<Tweet>> {
    let id = status_id.to_owned();

    let raw: Option<RawTweet> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {TWEET_COLUMNS} FROM items WHERE status_id = ?1"),
            rusqlite::params![id],
            RawTweet::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawTweet::into_tweet).transpose()
  }

  async fn find_by_account_and_class(&self, account: &str, class: &str) -> Result<Vec<Tweet>> {
    self
      .query_tweets(
        select_tweets("WHERE in_reply_to_screen_name = ?1 AND tweet_class = ?2"),
        vec![Value::Text(account.to_owned()), Value::Text(class.to_owned())],
      )
      .await
  }

  async fn find_by_account(&self, account: &str) -> Result<Vec<Tweet>> {
    self
      .query_tweets(
        select_tweets("WHERE in_reply_to_screen_name = ?1"),
        vec![Value::Text(account.to_owned())],
      )
      .await
  }

  async fn find_unlabeled_by_account(&self, account: &str) -> Result<Vec<Tweet>> {
    self
      .query_tweets(
        select_tweets(
          "WHERE in_reply_to_screen_name = ?1
             AND NOT EXISTS (SELECT 1 FROM labels l WHERE l.status_id = items.status_id)",
        ),
        vec![Value::Text(account.to_owned())],
      )
      .await
  }

  async fn find_by_account_in_window(
    &self,
    account: &str,
    window:  TimeWindow,
  ) -> Result<Vec<Tweet>> {
    self
      .query_tweets(
        select_tweets("WHERE in_reply_to_screen_name = ?1 AND created_at BETWEEN ?2 AND ?3"),
        vec![
          Value::Text(account.to_owned()),
          Value::Integer(window.from),
          Value::Integer(window.to),
        ],
      )
      .await
  }

  async fn distinct_accounts(&self) -> Result<AccountSet> {
    // Tweets created by a label applied ahead of ingestion have no account
    // (NULL); an ingested tweet with an empty reply target reports "".
    let names: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT in_reply_to_screen_name FROM items
           WHERE in_reply_to_screen_name IS NOT NULL",
        )?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(names.into_iter().collect())
  }

  async fn list_observable_accounts(&self) -> Result<Vec<ObservableAccount>> {
    let raws: Vec<RawObservableAccount> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT account_name, lang, settings FROM observable_accounts
           ORDER BY account_name, lang",
        )?;
        let rows = stmt
          .query_map([], RawObservableAccount::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawObservableAccount::into_account).collect()
  }

  async fn list_labels(&self) -> Result<Vec<TweetLabel>> {
    let labels = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT status_id, label FROM labels ORDER BY status_id")?;
        let rows = stmt
          .query_map([], label_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(labels)
  }

  async fn list_profiles(&self) -> Result<Vec<Profile>> {
    let profiles = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY profile_name"
        ))?;
        let rows = stmt
          .query_map([], profile_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(profiles)
  }
}
