//! `tweetwatch` — command-line access to the tweetwatch store.
//!
//! Reads `tweetwatch.toml` (or the path given with `--config`), layered under
//! `TWEETWATCH_*` environment variables, opens the SQLite store and runs one
//! operation, printing the result as JSON.
//!
//! ```text
//! tweetwatch import tweets.jsonl
//! tweetwatch tweets acme --unlabeled
//! tweetwatch label 1460323737035677698 problem_report
//! tweetwatch watch add acme en --setting interval=30
//! ```

use std::{
  fs::File,
  io::{self, BufRead, BufReader},
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tweetwatch_core::{
  account::ObservableAccount,
  label::TweetLabel,
  profile::Profile,
  store::{TimeWindow, TweetStore},
  tweet::Tweet,
  workflow::annotate,
};
use tweetwatch_store_sqlite::{SqliteStore, StoreConfig};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tweetwatch", version, about = "Query and label collected tweets")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tweetwatch.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create tables and unique indexes, then exit.
  Init,
  /// Insert records from a JSON-lines file (`-` reads stdin).
  Import {
    file:     PathBuf,
    /// Lines are profiles instead of tweets.
    #[arg(long)]
    profiles: bool,
  },
  /// Accounts that collected tweets were addressed to.
  Accounts,
  /// Tweets addressed to an account.
  Tweets {
    account:   String,
    /// Only tweets of this class.
    #[arg(long, conflicts_with = "unlabeled")]
    class:     Option<String>,
    /// Only tweets no reviewer has labeled yet.
    #[arg(long)]
    unlabeled: bool,
  },
  /// Tweets addressed to an account with `created_at` in `[from, to]`.
  Window { account: String, from: i64, to: i64 },
  /// Tweets addressed to an account during the current UTC week.
  Week { account: String },
  /// Record a reviewer's label and apply it to the tweet.
  Label { status_id: String, label: String },
  /// All recorded labels.
  Labels,
  /// All stored profiles.
  Profiles,
  /// Manage the watch list.
  #[command(subcommand)]
  Watch(WatchCommand),
}

#[derive(Subcommand)]
enum WatchCommand {
  /// Register (or overwrite) an account for one language.
  Add {
    name:     String,
    lang:     String,
    /// Extra `key=value` settings; values are parsed as JSON when possible.
    #[arg(long = "setting", value_parser = parse_setting)]
    settings: Vec<(String, Value)>,
  },
  /// Remove an account in every language.
  Remove { name: String },
  /// List the watch list.
  List,
}

// ─── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TWEETWATCH"))
    .build()
    .context("failed to read config file")?;

  let mut store_cfg: StoreConfig = settings
    .try_deserialize()
    .context("failed to deserialise StoreConfig")?;
  store_cfg.path = expand_tilde(&store_cfg.path);

  let store = SqliteStore::open_with_config(&store_cfg)
    .await
    .with_context(|| format!("failed to open store at {:?}", store_cfg.path))?;

  run(&store, cli.command).await
}

async fn run(store: &SqliteStore, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Init => {
      tracing::info!("store ready");
      Ok(())
    }
    Command::Import { file, profiles: false } => {
      let tweets: Vec<Tweet> = read_json_lines(&file)?;
      print_json(&store.insert_tweets(tweets).await?)
    }
    Command::Import { file, profiles: true } => {
      let profiles: Vec<Profile> = read_json_lines(&file)?;
      print_json(&store.insert_profiles(profiles).await?)
    }
    Command::Accounts => print_json(&store.distinct_accounts().await?),
    Command::Tweets { account, class: Some(class), .. } => {
      print_json(&store.find_by_account_and_class(&account, &class).await?)
    }
    Command::Tweets { account, unlabeled: true, .. } => {
      print_json(&store.find_unlabeled_by_account(&account).await?)
    }
    Command::Tweets { account, .. } => print_json(&store.find_by_account(&account).await?),
    Command::Window { account, from, to } => {
      let window = TimeWindow::new(from, to)?;
      print_json(&store.find_by_account_in_window(&account, window).await?)
    }
    Command::Week { account } => {
      let window = TimeWindow::week_of(chrono::Utc::now());
      print_json(&store.find_by_account_in_window(&account, window).await?)
    }
    Command::Label { status_id, label } => {
      print_json(&annotate(store, TweetLabel::new(status_id, label)).await?)
    }
    Command::Labels => print_json(&store.list_labels().await?),
    Command::Profiles => print_json(&store.list_profiles().await?),
    Command::Watch(WatchCommand::Add { name, lang, settings }) => {
      let account = ObservableAccount {
        account_name: name,
        lang,
        settings: settings.into_iter().collect(),
      };
      store.upsert_observable_account(&account).await?;
      print_json(&account)
    }
    Command::Watch(WatchCommand::Remove { name }) => {
      let removed = store.delete_observable_account(&name).await?;
      print_json(&serde_json::json!({ "account_name": name, "removed": removed }))
    }
    Command::Watch(WatchCommand::List) => print_json(&store.list_observable_accounts().await?),
  }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Parse one JSON document per non-blank line.
fn read_json_lines<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
  let reader: Box<dyn BufRead> = if path == Path::new("-") {
    Box::new(io::stdin().lock())
  } else {
    let file = File::open(path).with_context(|| format!("failed to open {path:?}"))?;
    Box::new(BufReader::new(file))
  };

  let mut records = Vec::new();
  for (n, line) in reader.lines().enumerate() {
    let line = line?;
    if line.trim().is_empty() {
      continue;
    }
    let record = serde_json::from_str(&line)
      .with_context(|| format!("{path:?} line {}: invalid record", n + 1))?;
    records.push(record);
  }
  Ok(records)
}

/// Split `key=value`; the value is JSON if it parses, else a plain string.
fn parse_setting(s: &str) -> Result<(String, Value), String> {
  let (key, raw) = s
    .split_once('=')
    .ok_or_else(|| format!("expected key=value, got {s:?}"))?;
  if key.is_empty() {
    return Err(format!("empty key in {s:?}"));
  }
  if ObservableAccount::is_reserved_key(key) {
    return Err(format!("setting key {key:?} is reserved"));
  }
  let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
  Ok((key.to_owned(), value))
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn setting_values_parse_as_json_when_possible() {
    assert_eq!(parse_setting("interval=30").unwrap(), ("interval".into(), Value::from(30)));
    assert_eq!(parse_setting("mode=fast").unwrap(), ("mode".into(), Value::from("fast")));
    assert_eq!(parse_setting("url=a=b").unwrap().1, Value::from("a=b"));
  }

  #[test]
  fn setting_without_separator_is_rejected() {
    assert!(parse_setting("interval").is_err());
    assert!(parse_setting("=5").is_err());
  }

  #[test]
  fn setting_cannot_shadow_identity_fields() {
    assert!(parse_setting("lang=de").is_err());
    assert!(parse_setting("account_name=other").is_err());
  }

  #[test]
  fn cli_rejects_class_with_unlabeled() {
    assert!(Cli::try_parse_from(["tweetwatch", "tweets", "acme", "--class", "spam", "--unlabeled"]).is_err());
  }

  #[test]
  fn watch_add_collects_settings() {
    let cli = Cli::try_parse_from([
      "tweetwatch", "watch", "add", "acme", "en", "--setting", "interval=30", "--setting", "x=y",
    ])
    .unwrap();
    let Command::Watch(WatchCommand::Add { settings, .. }) = cli.command else {
      panic!("expected watch add");
    };
    assert_eq!(settings.len(), 2);
  }
}
