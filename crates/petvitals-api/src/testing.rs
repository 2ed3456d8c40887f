//! Router fixtures shared by the handler tests.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode},
};
use chrono::{DateTime, NaiveDate, Utc};
use petvitals_core::{
  engine::{EngineOutput, EnginePayload, InferenceError},
  pet::{NewPet, PetProfile, Species},
  prediction::HealthStatus,
  record::{
    CommonHealthRecord, NewCommonRecord, NewSpeciesRecord, SpeciesHealthRecord,
    SpeciesRecordRef,
  },
  store::HealthRecordStore,
};
use petvitals_inference::{EngineSpec, InProcessEngine, ProcessEngine};
use petvitals_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AppState, CREATOR_HEADER, api_router};

pub fn persian_cat_input() -> Value {
  json!({
    "breed": "Persian",
    "age_in_months": 24,
    "weight_kg": 4.2,
    "temperature": 38.5,
    "heart_rate": 150,
    "respiratory_rate": 30,
    "blood_pressure_systolic": 120,
    "blood_pressure_diastolic": 80,
    "body_condition_score": 5,
    "hydration_status": "normal",
    "mucous_membrane_color": "pink",
    "coat_condition": "healthy",
    "appetite": "normal",
    "energy_level": "normal",
    "aggression": "none",
    "vomiting": false,
    "diarrhea": false,
    "coughing": false,
    "limping": false,
    "allergies": [],
    "chronic_conditions": [],
    "prescriptions": [],
    "vaccinations": []
  })
}

fn healthy_score(_: Species, _: &EnginePayload) -> Result<EngineOutput, InferenceError> {
  Ok(EngineOutput {
    success: true,
    status: Some(HealthStatus::Healthy),
    confidence_scores: [("Healthy", 0.91), ("At Risk", 0.06), ("Unhealthy", 0.03)]
      .into_iter()
      .map(|(k, v)| (k.to_owned(), v))
      .collect(),
    diagnosis_text: "No significant findings".into(),
    treatment_text: "Routine check-up in 12 months".into(),
    prescriptions: vec!["Omega-3 - 1 capsule - daily".into()],
    ..EngineOutput::default()
  })
}

async fn seeded_store() -> (SqliteStore, PetProfile) {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let pet = store
    .insert_pet(NewPet {
      name:          "Mochi".into(),
      species:       Species::Cat,
      breed:         Some("Persian".into()),
      date_of_birth: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
    })
    .await
    .unwrap();
  (store, pet)
}

/// An app whose engine always scores the cat as healthy.
pub async fn healthy_app() -> (Router, Arc<SqliteStore>, PetProfile) {
  let (store, pet) = seeded_store().await;
  let store = Arc::new(store);
  let engine = Arc::new(InProcessEngine::new("cat-v1", healthy_score));
  (api_router(AppState::new(store.clone(), engine)), store, pet)
}

/// An app whose engine process exits nonzero.
pub async fn failing_app() -> (Router, Arc<SqliteStore>, PetProfile) {
  let (store, pet) = seeded_store().await;
  let store = Arc::new(store);
  let engine = Arc::new(ProcessEngine::default().with_engine(Species::Cat, EngineSpec {
    command:       "sh".into(),
    args:          vec!["-c".into(), "cat >/dev/null; echo 'model weights missing' >&2; exit 1".into()],
    working_dir:   None,
    model_version: "cat-v1".into(),
    timeout_secs:  5,
  }));
  (api_router(AppState::new(store.clone(), engine)), store, pet)
}

/// An app whose store refuses every envelope write.
pub async fn flaky_app() -> (Router, Arc<SqliteStore>, PetProfile) {
  let (store, pet) = seeded_store().await;
  let flaky = Arc::new(EnvelopeFailingStore(store.clone()));
  let engine = Arc::new(InProcessEngine::new("cat-v1", healthy_score));
  (api_router(AppState::new(flaky, engine)), Arc::new(store), pet)
}

pub async fn send(
  app: Router,
  method: &str,
  uri: &str,
  creator: Option<Uuid>,
  body: Value,
) -> (StatusCode, Value) {
  let mut builder = Request::builder()
    .method(method)
    .uri(uri)
    .header("content-type", "application/json");
  if let Some(id) = creator {
    builder = builder.header(CREATOR_HEADER, id.to_string());
  }
  let body = if body.is_null() { Body::empty() } else { Body::from(body.to_string()) };
  let resp = app.oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

// ─── EnvelopeFailingStore ────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FlakyError {
  #[error("disk full")]
  DiskFull,
  #[error(transparent)]
  Inner(#[from] petvitals_store_sqlite::Error),
}

pub struct EnvelopeFailingStore(SqliteStore);

impl HealthRecordStore for EnvelopeFailingStore {
  type Error = FlakyError;

  async fn find_pet(&self, pet_id: Uuid) -> Result<Option<PetProfile>, FlakyError> {
    Ok(self.0.find_pet(pet_id).await?)
  }

  async fn insert_species_record(
    &self,
    input: NewSpeciesRecord,
  ) -> Result<SpeciesHealthRecord, FlakyError> {
    Ok(self.0.insert_species_record(input).await?)
  }

  async fn insert_common_record(
    &self,
    _input: NewCommonRecord,
  ) -> Result<CommonHealthRecord, FlakyError> {
    Err(FlakyError::DiskFull)
  }

  async fn get_common_record(
    &self,
    record_id: Uuid,
  ) -> Result<Option<CommonHealthRecord>, FlakyError> {
    Ok(self.0.get_common_record(record_id).await?)
  }

  async fn get_species_record(
    &self,
    reference: SpeciesRecordRef,
  ) -> Result<Option<SpeciesHealthRecord>, FlakyError> {
    Ok(self.0.get_species_record(reference).await?)
  }

  async fn list_common_records(
    &self,
    pet_id: Uuid,
    limit: usize,
  ) -> Result<Vec<CommonHealthRecord>, FlakyError> {
    Ok(self.0.list_common_records(pet_id, limit).await?)
  }

  async fn find_orphan_species_records(
    &self,
    created_before: DateTime<Utc>,
  ) -> Result<Vec<SpeciesRecordRef>, FlakyError> {
    Ok(self.0.find_orphan_species_records(created_before).await?)
  }

  async fn remove_orphan_species_record(
    &self,
    reference: SpeciesRecordRef,
  ) -> Result<bool, FlakyError> {
    Ok(self.0.remove_orphan_species_record(reference).await?)
  }
}
