//! Handlers for `/health-records` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/health-records/pet/{pet_id}` | Optional `?limit=`, capped at 100 |
//! | `GET`  | `/health-records/{record_id}` | Envelope, detail and pet; 404 if either record is missing |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use petvitals_core::{
  engine::InferenceEngine,
  reader::{HealthRecordDetail, RecordSummary},
  store::HealthRecordStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct ListResponse {
  pub success: bool,
  pub data:    Vec<RecordSummary>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
  pub success: bool,
  pub data:    HealthRecordDetail,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit: Option<usize>,
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {what} ID format")))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /health-records/pet/{pet_id}[?limit=<n>]`
pub async fn list_by_pet<S, E>(
  State(state): State<AppState<S, E>>,
  Path(pet_id): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError>
where
  S: HealthRecordStore,
  E: InferenceEngine,
{
  let pet_id = parse_id(&pet_id, "pet")?;
  let data = state.reader.list_by_pet(pet_id, params.limit).await?;
  let message = data.is_empty().then_some("No health records found for this pet");
  Ok(Json(ListResponse { success: true, data, message }))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /health-records/{record_id}`
pub async fn get_one<S, E>(
  State(state): State<AppState<S, E>>,
  Path(record_id): Path<String>,
) -> Result<Json<DetailResponse>, ApiError>
where
  S: HealthRecordStore,
  E: InferenceEngine,
{
  let record_id = parse_id(&record_id, "record")?;
  let data = state.reader.get_detail(record_id).await?;
  Ok(Json(DetailResponse { success: true, data }))
}
