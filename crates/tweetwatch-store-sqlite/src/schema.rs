//! SQL schema and unique-index management for the tweetwatch SQLite store.
//!
//! Tables are created by [`TABLES`]. The unique indexes declared by
//! [`Collection::unique_key`] are created separately by the index manager so
//! an existing index can be checked against the registry before any write.

use tweetwatch_core::schema::Collection;

/// Table DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Non-key columns carry defaults so a partial upsert (a label applied before
/// its tweet arrives) reads back zero values. `in_reply_to_screen_name` is
/// left NULL there so such records are not counted as an account.
pub const TABLES: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS items (
    status_id               TEXT    NOT NULL,
    screen_name             TEXT    NOT NULL DEFAULT '',
    text                    TEXT    NOT NULL DEFAULT '',
    lang                    TEXT    NOT NULL DEFAULT '',
    in_reply_to_screen_name TEXT,                        -- NULL on partial records
    tweet_class             TEXT    NOT NULL DEFAULT '',
    classifier_certainty    INTEGER NOT NULL DEFAULT 0,
    created_at              INTEGER NOT NULL DEFAULT 0   -- unix seconds
);

CREATE TABLE IF NOT EXISTS profiles (
    profile_name    TEXT    NOT NULL,
    display_name    TEXT    NOT NULL DEFAULT '',
    description     TEXT    NOT NULL DEFAULT '',
    followers_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS observable_accounts (
    account_name TEXT NOT NULL,
    lang         TEXT NOT NULL,
    settings     TEXT NOT NULL DEFAULT '{}'   -- JSON object
);

CREATE TABLE IF NOT EXISTS labels (
    status_id TEXT NOT NULL,
    label     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS items_account_created_idx
    ON items(in_reply_to_screen_name, created_at);
";

/// `CREATE UNIQUE INDEX` statement for `collection`'s registered key.
pub fn unique_index_ddl(collection: Collection) -> String {
  format!(
    "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
    collection.index_name(),
    collection.name(),
    collection.unique_key().join(", "),
  )
}

/// One key column of an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
  pub name:      String,
  /// Collating sequence, upper-cased (`BINARY` unless declared otherwise).
  pub collation: String,
  pub desc:      bool,
}

impl IndexColumn {
  fn describe(&self) -> String {
    let mut out = self.name.clone();
    if self.collation != "BINARY" {
      out.push_str(" COLLATE ");
      out.push_str(&self.collation);
    }
    if self.desc {
      out.push_str(" DESC");
    }
    out
  }
}

/// Shape of an index as reported by SQLite.
///
/// Everything that changes which rows count as duplicates is captured: the
/// unique flag, a partial `WHERE` clause, and each key column's collation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexShape {
  pub unique:  bool,
  pub partial: bool,
  pub columns: Vec<IndexColumn>,
}

impl IndexShape {
  pub fn expected(collection: Collection) -> Self {
    Self {
      unique:  true,
      partial: false,
      columns: collection
        .unique_key()
        .iter()
        .map(|c| IndexColumn {
          name:      (*c).to_owned(),
          collation: "BINARY".to_owned(),
          desc:      false,
        })
        .collect(),
    }
  }

  pub fn describe(&self) -> String {
    let kind = if self.unique { "UNIQUE" } else { "INDEX" };
    let cols: Vec<_> = self.columns.iter().map(IndexColumn::describe).collect();
    let mut out = format!("{kind} ({})", cols.join(", "));
    if self.partial {
      out.push_str(" WHERE ...");
    }
    out
  }
}

/// Look up `index` on `table`. Returns `None` if no index by that name exists.
pub fn read_index_shape(
  conn: &rusqlite::Connection,
  table: &str,
  index: &str,
) -> rusqlite::Result<Option<IndexShape>> {
  // index_list: seq, name, unique, origin, partial
  let mut list = conn.prepare(&format!("PRAGMA index_list({table})"))?;
  let flags = list
    .query_map([], |row| {
      Ok((row.get::<_, String>(1)?, row.get::<_, i64>(2)?, row.get::<_, i64>(4)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?
    .into_iter()
    .find(|(name, ..)| name == index)
    .map(|(_, unique, partial)| (unique != 0, partial != 0));

  let Some((unique, partial)) = flags else {
    return Ok(None);
  };

  // index_xinfo: seqno, cid, name, desc, coll, key
  let mut info = conn.prepare(&format!("PRAGMA index_xinfo({index})"))?;
  let mut cols = info
    .query_map([], |row| {
      let name: Option<String> = row.get(2)?;
      let coll: Option<String> = row.get(4)?;
      let column = IndexColumn {
        name:      name.unwrap_or_else(|| "<expression>".to_owned()),
        collation: coll.unwrap_or_else(|| "BINARY".to_owned()).to_ascii_uppercase(),
        desc:      row.get::<_, i64>(3)? != 0,
      };
      Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(5)? != 0, column))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  // Auxiliary (non-key) entries such as the trailing rowid are not part of
  // the definition.
  cols.retain(|(_, key, _)| *key);
  cols.sort_by_key(|(seqno, ..)| *seqno);

  Ok(Some(IndexShape {
    unique,
    partial,
    columns: cols.into_iter().map(|(.., column)| column).collect(),
  }))
}
