//! JSON HTTP API for the petvitals health-analysis pipeline.
//!
//! Exposes an axum [`Router`] backed by any [`HealthRecordStore`] and any
//! [`InferenceEngine`]. Auth, TLS, and transport concerns are the caller's
//! responsibility; the creator identity arrives pre-resolved in the
//! `x-creator-id` header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", petvitals_api::api_router(AppState::new(store, engine)))
//! ```

pub mod analyze;
pub mod error;
pub mod forms;
pub mod records;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use petvitals_core::{
  engine::InferenceEngine, reader::RecordReader, store::HealthRecordStore,
  writer::RecordWriter,
};

pub use error::ApiError;

/// Header carrying the authenticated creator's id.
pub const CREATOR_HEADER: &str = "x-creator-id";

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, E> {
  pub store:  Arc<S>,
  pub engine: Arc<E>,
  pub writer: RecordWriter<S>,
  pub reader: RecordReader<S>,
}

impl<S: HealthRecordStore, E> AppState<S, E> {
  pub fn new(store: Arc<S>, engine: Arc<E>) -> Self {
    Self {
      writer: RecordWriter::new(store.clone()),
      reader: RecordReader::new(store.clone()),
      store,
      engine,
    }
  }
}

impl<S, E> Clone for AppState<S, E> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      engine: Arc::clone(&self.engine),
      writer: self.writer.clone(),
      reader: self.reader.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, E>(state: AppState<S, E>) -> Router<()>
where
  S: HealthRecordStore + 'static,
  E: InferenceEngine + 'static,
{
  Router::new()
    .route("/analyze", post(analyze::handler::<S, E>))
    .route("/form-definitions", get(forms::handler))
    .route("/health-records/pet/{pet_id}", get(records::list_by_pet::<S, E>))
    .route("/health-records/{record_id}", get(records::get_one::<S, E>))
    .with_state(state)
}

#[cfg(test)]
pub(crate) mod testing;
