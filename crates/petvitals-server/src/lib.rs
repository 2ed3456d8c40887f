//! Wiring for the petvitals server: configuration, the HTTP app and the
//! background orphan sweep.

use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use petvitals_api::{AppState, api_router};
use petvitals_core::{
  engine::InferenceEngine, pet::Species, reconcile::sweep_orphans,
  store::HealthRecordStore,
};
use petvitals_inference::EngineSpec;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/petvitals/records.db") }
fn default_reconcile_interval_secs() -> u64 { 600 }
fn default_orphan_grace_secs() -> u64 { 3600 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `PETVITALS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                    String,
  #[serde(default = "default_port")]
  pub port:                    u16,
  #[serde(default = "default_store_path")]
  pub store_path:              PathBuf,
  #[serde(default = "default_reconcile_interval_secs")]
  pub reconcile_interval_secs: u64,
  #[serde(default = "default_orphan_grace_secs")]
  pub orphan_grace_secs:       u64,
  /// One engine per species. A species without an entry cannot be analysed.
  #[serde(default)]
  pub engines:                 HashMap<Species, EngineSpec>,
}

impl ServerConfig {
  pub fn reconcile_interval(&self) -> Duration {
    Duration::from_secs(self.reconcile_interval_secs)
  }

  pub fn orphan_grace(&self) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(self.orphan_grace_secs).unwrap_or(i64::MAX))
  }
}

// ─── App ─────────────────────────────────────────────────────────────────────

/// The API router plus a liveness check, wrapped in request tracing.
pub fn app<S, E>(state: AppState<S, E>) -> Router
where
  S: HealthRecordStore + 'static,
  E: InferenceEngine + 'static,
{
  Router::new()
    .route("/healthz", get(|| async { "ok" }))
    .merge(api_router(state))
    .layer(TraceLayer::new_for_http())
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// Run [`sweep_orphans`] every `interval`, starting immediately. Errors are
/// logged and the loop carries on.
pub fn spawn_reconciler<S>(
  store: Arc<S>,
  interval: Duration,
  grace: chrono::Duration,
) -> JoinHandle<()>
where
  S: HealthRecordStore + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
      ticker.tick().await;
      if let Err(e) = sweep_orphans(store.as_ref(), grace, chrono::Utc::now()).await {
        tracing::warn!(error = %e, "orphan sweep failed");
      }
    }
  })
}
