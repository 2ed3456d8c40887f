//! petvitals server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the analysis API over HTTP.
//!
//! # Registering a pet
//!
//! Pet management lives outside this service; operators seed pets with:
//!
//! ```text
//! petvitals-server pet add --name Mochi --species cat --breed Persian --born 2024-02-01
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use petvitals_api::AppState;
use petvitals_core::{
  pet::{NewPet, Species},
  reconcile::sweep_orphans,
};
use petvitals_inference::ProcessEngine;
use petvitals_server::ServerConfig;
use petvitals_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "petvitals health-analysis server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Manage the pets known to this store.
  Pet {
    #[command(subcommand)]
    command: PetCommand,
  },
  /// Run one orphan sweep and exit.
  Sweep,
}

#[derive(Subcommand)]
enum PetCommand {
  /// Register a pet and print its id.
  Add {
    #[arg(long)]
    name:    String,
    #[arg(long)]
    species: Species,
    #[arg(long)]
    breed:   Option<String>,
    /// Date of birth, `YYYY-MM-DD`.
    #[arg(long)]
    born:    NaiveDate,
  },
  /// List registered pets.
  List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("PETVITALS").separator("__"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(server_cfg, store).await,
    Command::Pet { command: PetCommand::Add { name, species, breed, born } } => {
      let pet = store
        .insert_pet(NewPet { name, species, breed, date_of_birth: born })
        .await
        .context("failed to add pet")?;
      println!("{}", pet.pet_id);
      Ok(())
    }
    Command::Pet { command: PetCommand::List } => {
      for pet in store.list_pets().await.context("failed to list pets")? {
        println!(
          "{}  {:<4} {:<20} {}",
          pet.pet_id,
          pet.species,
          pet.name,
          pet.breed.as_deref().unwrap_or("-")
        );
      }
      Ok(())
    }
    Command::Sweep => {
      let report = sweep_orphans(&store, server_cfg.orphan_grace(), chrono::Utc::now())
        .await
        .context("orphan sweep failed")?;
      println!("examined {}, removed {}", report.examined, report.removed);
      Ok(())
    }
  }
}

async fn serve(server_cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  if server_cfg.engines.is_empty() {
    tracing::warn!("no inference engines configured; every analysis will be rejected");
  }
  for (species, spec) in &server_cfg.engines {
    tracing::info!(
      %species,
      command = %spec.command.display(),
      model_version = %spec.model_version,
      timeout_secs = spec.timeout_secs,
      "inference engine configured"
    );
  }

  let store = Arc::new(store);
  let engine = Arc::new(ProcessEngine::new(server_cfg.engines.clone()));

  let _reconciler = petvitals_server::spawn_reconciler(
    store.clone(),
    server_cfg.reconcile_interval(),
    server_cfg.orphan_grace(),
  );

  let app = petvitals_server::app(AppState::new(store, engine));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
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
