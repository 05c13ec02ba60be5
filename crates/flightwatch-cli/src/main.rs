//! `flightwatch`: command-line client for the Flightwatch API.
//!
//! The `run` subcommand is the external trigger for the batch runner and is
//! meant to be called from cron.
//!
//! # Usage
//!
//! ```text
//! flightwatch --url http://localhost:8080 --user ops --password secret lookup UAL123 2024-06-16
//! flightwatch --config ~/.config/flightwatch/config.toml run schedule
//! ```

mod client;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use flightwatch_core::schedule::BatchKind;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "flightwatch", about = "Command-line client for the Flightwatch API")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the Flightwatch server (default: http://localhost:8080).
  #[arg(long, env = "FLIGHTWATCH_URL")]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "FLIGHTWATCH_USER")]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "FLIGHTWATCH_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Look a flight up now, or schedule it if the date is too far ahead.
  Lookup {
    ident: String,
    /// Departure date, `YYYY-MM-DD`.
    date:  NaiveDate,
  },
  /// Schedule a lookup regardless of date.
  Schedule { ident: String, date: NaiveDate },
  /// List your scheduled lookups.
  Pending,
  /// Trigger a batch run: `schedule` or `refresh`.
  Run { kind: BatchKind },
  /// List your tracked flights, or show one.
  Flights { id: Option<i64> },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_owned()) }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags and env override the config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    username: args
      .user
      .or_else(|| non_empty(&file_cfg.username))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| non_empty(&file_cfg.password))
      .unwrap_or_default(),
  };

  let client = ApiClient::new(api_config)?;
  let envelope = match args.command {
    Command::Lookup { ident, date } => client.lookup(&ident, date).await?,
    Command::Schedule { ident, date } => client.schedule(&ident, date).await?,
    Command::Pending => client.pending().await?,
    Command::Run { kind } => client.run(kind).await?,
    Command::Flights { id } => client.flights(id).await?,
  };

  println!(
    "{}",
    serde_json::to_string_pretty(&envelope).context("formatting response")?
  );
  Ok(())
}
