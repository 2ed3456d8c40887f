//! `POST /analyze`: validate, score, persist.
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | stored | 200 | `result`, `commonRecordId`, `speciesRecordId` |
//! | scored, storage failed | 200 | `result`, `storage_warning` |
//! | bad request / invalid observation | 400 | `error`, `errors?` |
//! | unknown pet | 404 | `error` |
//! | engine failure | 500 | `error_kind`, `error_details` |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::HeaderMap,
};
use chrono::Utc;
use petvitals_core::{
  engine::InferenceEngine,
  observation::HealthObservation,
  pet::Species,
  prediction::PredictionResult,
  store::HealthRecordStore,
  validate::validate,
  writer::StoredAnalysis,
};
use rand_core::{OsRng, RngCore as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{AppState, CREATOR_HEADER, error::ApiError};

// ─── Request ─────────────────────────────────────────────────────────────────

/// Every field is optional on the wire so a missing one can be reported as
/// a 400 with a readable message rather than a decoder rejection.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
  pub pet_id:     Option<String>,
  pub pet_name:   Option<String>,
  pub species:    Option<String>,
  pub input_data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
  pub request_id:      String,
  pub success:         bool,
  pub result:          PredictionResult,
  #[serde(flatten)]
  pub stored:          Option<StoredAnalysis>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub storage_warning: Option<String>,
}

/// `mlreq_<unix millis>_<9 base-36 chars>`.
pub fn request_id() -> String {
  const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
  let mut n = OsRng.next_u64();
  let suffix: String = (0..9)
    .map(|_| {
      let c = ALPHABET[(n % 36) as usize] as char;
      n /= 36;
      c
    })
    .collect();
  format!("mlreq_{}_{suffix}", Utc::now().timestamp_millis())
}

fn creator_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
  match headers.get(CREATOR_HEADER) {
    None => Ok(Uuid::nil()),
    Some(v) => v
      .to_str()
      .ok()
      .and_then(|s| Uuid::parse_str(s.trim()).ok())
      .ok_or_else(|| ApiError::BadRequest(format!("Invalid {CREATOR_HEADER} header"))),
  }
}

struct Submission {
  pet_id:      Uuid,
  pet_name:    String,
  species:     Species,
  observation: HealthObservation,
}

fn parse_submission(body: Value) -> Result<Submission, ApiError> {
  let req: AnalyzeRequest = serde_json::from_value(body)
    .map_err(|e| ApiError::BadRequest(format!("Malformed request body: {e}")))?;

  let (Some(pet_id), Some(pet_name), Some(species), Some(input_data)) =
    (req.pet_id, req.pet_name, req.species, req.input_data)
  else {
    return Err(ApiError::BadRequest(
      "Missing required fields: pet_id, pet_name, species, input_data".to_owned(),
    ));
  };

  let species: Species = species
    .parse()
    .map_err(|_| ApiError::BadRequest("Unsupported species. Supported: cat, dog".to_owned()))?;
  let pet_id = Uuid::parse_str(&pet_id)
    .map_err(|_| ApiError::BadRequest("Invalid pet ID format".to_owned()))?;
  let observation: HealthObservation = serde_json::from_value(input_data)
    .map_err(|e| ApiError::Validation(vec![format!("input_data: {e}")]))?;

  Ok(Submission { pet_id, pet_name, species, observation })
}

// ─── Handler ─────────────────────────────────────────────────────────────────

/// `POST /analyze`
pub async fn handler<S, E>(
  State(state): State<AppState<S, E>>,
  headers: HeaderMap,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError>
where
  S: HealthRecordStore,
  E: InferenceEngine,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let creator_id = creator_id(&headers)?;
  let Submission { pet_id, pet_name, species, observation } = parse_submission(body)?;

  let report = validate(&observation, species);
  if !report.valid {
    return Err(ApiError::Validation(report.errors));
  }

  let pet = state
    .store
    .find_pet(pet_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("Pet {pet_id} not found")))?;
  if pet.species != species {
    return Err(ApiError::BadRequest(format!(
      "Pet {pet_id} is a {}, not a {species}",
      pet.species
    )));
  }

  let request_id = request_id();
  tracing::info!(%request_id, %pet_id, pet = %pet_name, %species, "analysis accepted");

  let prediction = state
    .engine
    .predict(species, &observation)
    .await
    .map_err(|source| {
      tracing::error!(
        %request_id,
        kind = source.kind(),
        details = %source.details(),
        "analysis failed"
      );
      ApiError::Inference { request_id: request_id.clone(), source }
    })?;

  let (stored, storage_warning) = match state
    .writer
    .store_analysis_result(pet_id, creator_id, species, &observation, &prediction)
    .await
  {
    Ok(stored) => (Some(stored), None),
    Err(e) => {
      tracing::warn!(%request_id, error = %e, "analysis scored but not stored");
      (None, Some(e.to_string()))
    }
  };

  Ok(Json(AnalyzeResponse {
    request_id,
    success: true,
    result: prediction,
    stored,
    storage_warning,
  }))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;
  use petvitals_core::{prediction::HealthStatus, store::HealthRecordStore as _};
  use serde_json::json;

  use super::*;
  use crate::testing::{failing_app, flaky_app, healthy_app, persian_cat_input, send};

  #[test]
  fn request_ids_are_prefixed_and_distinct() {
    let a = request_id();
    let b = request_id();
    assert!(a.starts_with("mlreq_"));
    assert_eq!(a.rsplit('_').next().unwrap().len(), 9);
    assert_ne!(a, b);
  }

  #[tokio::test]
  async fn persian_cat_is_scored_and_stored() {
    let (app, store, pet) = healthy_app().await;
    let creator = Uuid::new_v4();

    let (status, body) = send(
      app,
      "POST",
      "/analyze",
      Some(creator),
      json!({
        "pet_id": pet.pet_id,
        "pet_name": pet.name,
        "species": "cat",
        "input_data": persian_cat_input(),
      }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert!(body["request_id"].as_str().unwrap().starts_with("mlreq_"));
    assert_eq!(body["result"]["predicted_status"], "Healthy");
    assert!(body.get("storage_warning").is_none());

    let common_id: Uuid = serde_json::from_value(body["commonRecordId"].clone()).unwrap();
    let envelope = store.get_common_record(common_id).await.unwrap().unwrap();
    assert_eq!(envelope.species_type, Species::Cat);
    assert_eq!(envelope.created_by, creator);
    assert_eq!(
      envelope.species_record.record_id.to_string(),
      body["speciesRecordId"].as_str().unwrap()
    );
  }

  #[tokio::test]
  async fn out_of_range_observation_is_itemised() {
    let (app, store, pet) = healthy_app().await;
    let mut input = persian_cat_input();
    input["body_condition_score"] = json!(7);
    input["temperature"] = json!(45.0);

    let (status, body) = send(
      app,
      "POST",
      "/analyze",
      None,
      json!({ "pet_id": pet.pet_id, "pet_name": "Mochi", "species": "cat", "input_data": input }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input data");
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.as_str().unwrap().contains("between 1 and 6")));
    assert!(store.list_common_records(pet.pet_id, 100).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn malformed_enum_is_a_validation_error() {
    let (app, _, pet) = healthy_app().await;
    let mut input = persian_cat_input();
    input["mucous_membrane_color"] = json!("purple");

    let (status, body) = send(
      app,
      "POST",
      "/analyze",
      None,
      json!({ "pet_id": pet.pet_id, "pet_name": "Mochi", "species": "cat", "input_data": input }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"][0].as_str().unwrap().contains("purple"));
  }

  #[tokio::test]
  async fn missing_fields_and_bad_species_are_bad_requests() {
    let (app, _, pet) = healthy_app().await;

    let (status, body) =
      send(app.clone(), "POST", "/analyze", None, json!({ "pet_id": pet.pet_id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Missing required fields"));

    let (status, body) = send(
      app,
      "POST",
      "/analyze",
      None,
      json!({
        "pet_id": pet.pet_id,
        "pet_name": "Mochi",
        "species": "hamster",
        "input_data": persian_cat_input(),
      }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unsupported species. Supported: cat, dog");
  }

  #[tokio::test]
  async fn unknown_pet_is_404_and_wrong_species_is_400() {
    let (app, _, pet) = healthy_app().await;

    let (status, _) = send(
      app.clone(),
      "POST",
      "/analyze",
      None,
      json!({
        "pet_id": Uuid::new_v4(),
        "pet_name": "Ghost",
        "species": "cat",
        "input_data": persian_cat_input(),
      }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
      app,
      "POST",
      "/analyze",
      None,
      json!({
        "pet_id": pet.pet_id,
        "pet_name": "Mochi",
        "species": "dog",
        "input_data": persian_cat_input(),
      }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn engine_failure_is_500_and_nothing_is_written() {
    let (app, store, pet) = failing_app().await;

    let (status, body) = send(
      app,
      "POST",
      "/analyze",
      None,
      json!({
        "pet_id": pet.pet_id,
        "pet_name": "Mochi",
        "species": "cat",
        "input_data": persian_cat_input(),
      }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_kind"], "InferenceProcessError");
    assert!(body["error_details"].as_str().unwrap().contains("model weights missing"));

    assert!(store.list_common_records(pet.pet_id, 100).await.unwrap().is_empty());
    let far_future = Utc::now() + chrono::Duration::days(1);
    assert!(store.find_orphan_species_records(far_future).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn storage_failure_still_returns_prediction() {
    let (app, store, pet) = flaky_app().await;

    let (status, body) = send(
      app,
      "POST",
      "/analyze",
      None,
      json!({
        "pet_id": pet.pet_id,
        "pet_name": "Mochi",
        "species": "cat",
        "input_data": persian_cat_input(),
      }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["predicted_status"], HealthStatus::Healthy.to_string());
    assert!(body["storage_warning"].as_str().unwrap().contains("without envelope"));
    assert!(body.get("commonRecordId").is_none());

    let far_future = Utc::now() + chrono::Duration::days(1);
    assert_eq!(store.find_orphan_species_records(far_future).await.unwrap().len(), 1);
  }
}
