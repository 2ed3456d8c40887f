//! `petvitals`, the command-line client for the petvitals API.
//!
//! # Usage
//!
//! ```text
//! petvitals --url http://localhost:8080 analyze --pet <id> --name Mochi --species cat obs.json
//! petvitals records <pet-id> --limit 10
//! petvitals record <record-id>
//! petvitals forms dog
//! petvitals --config ~/.config/petvitals/client.toml records <pet-id>
//! ```

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use petvitals_client::{AnalysisRequest, ClientConfig, ResilientClient, RetryPolicy};
use petvitals_core::pet::Species;
use serde::Deserialize;
use serde_json::Value;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "petvitals", about = "Client for the petvitals health-analysis API")]
struct Args {
  /// Path to a TOML config file (url, max_attempts, backoff_unit_ms, creator_id).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the petvitals server (default: http://localhost:8080).
  #[arg(long, env = "PETVITALS_URL")]
  url: Option<String>,

  /// Attempts per request, the first included (default: 5).
  #[arg(long, env = "PETVITALS_MAX_ATTEMPTS")]
  max_attempts: Option<u32>,

  /// Backoff unit in milliseconds (default: 1000).
  #[arg(long, env = "PETVITALS_BACKOFF_UNIT_MS")]
  backoff_unit_ms: Option<u64>,

  /// Creator id sent in the `x-creator-id` header.
  #[arg(long, env = "PETVITALS_CREATOR_ID")]
  creator_id: Option<Uuid>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Submit an observation file for analysis.
  Analyze {
    #[arg(long)]
    pet:     Uuid,
    #[arg(long)]
    name:    String,
    #[arg(long)]
    species: Species,
    /// JSON file holding the observation (`input_data`).
    input:   PathBuf,
  },
  /// List a pet's health records, newest visit first.
  Records {
    pet_id: Uuid,
    #[arg(long)]
    limit:  Option<usize>,
  },
  /// Show one health record with its species detail.
  Record { record_id: Uuid },
  /// Print the observation form for a species.
  Forms { species: Species },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:             Option<String>,
  #[serde(default)]
  max_attempts:    Option<u32>,
  #[serde(default)]
  backoff_unit_ms: Option<u64>,
  #[serde(default)]
  creator_id:      Option<Uuid>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
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
  let defaults = ClientConfig::default();
  let retry = RetryPolicy::new(
    args
      .max_attempts
      .or(file_cfg.max_attempts)
      .unwrap_or(defaults.retry.max_attempts),
    args
      .backoff_unit_ms
      .or(file_cfg.backoff_unit_ms)
      .map(Duration::from_millis)
      .unwrap_or(defaults.retry.unit),
  );
  let config = ClientConfig {
    base_url: args.url.or(file_cfg.url).unwrap_or(defaults.base_url),
    creator_id: args.creator_id.or(file_cfg.creator_id),
    retry,
    timeout: defaults.timeout,
  };

  let client = ResilientClient::new(config).context("building HTTP client")?;

  let body = match args.command {
    Command::Analyze { pet, name, species, input } => {
      let raw = std::fs::read_to_string(&input)
        .with_context(|| format!("reading observation file {}", input.display()))?;
      let input_data: Value =
        serde_json::from_str(&raw).context("observation file is not valid JSON")?;
      let request = AnalysisRequest { pet_id: pet, pet_name: name, species, input_data };
      client.analyze(&request).await.context("POST /analyze failed")?
    }
    Command::Records { pet_id, limit } => client
      .list_records(pet_id, limit)
      .await
      .context("listing health records failed")?,
    Command::Record { record_id } => client
      .get_record(record_id)
      .await
      .context("fetching health record failed")?,
    Command::Forms { species } => client
      .form_definitions(species)
      .await
      .context("fetching form definitions failed")?,
  };

  println!("{}", serde_json::to_string_pretty(&body)?);
  Ok(())
}
