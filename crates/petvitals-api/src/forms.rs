//! `GET /form-definitions?species=<cat|dog>`

use axum::{Json, extract::Query};
use petvitals_core::{
  forms::{FormSection, form_definitions},
  pet::Species,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct FormParams {
  pub species: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FormResponse {
  pub success:          bool,
  pub species:          Species,
  #[serde(rename = "formDefinitions")]
  pub form_definitions: Vec<FormSection>,
}

/// `GET /form-definitions?species=<species>`
pub async fn handler(Query(params): Query<FormParams>) -> Result<Json<FormResponse>, ApiError> {
  let species: Species = params
    .species
    .as_deref()
    .and_then(|s| s.parse().ok())
    .ok_or_else(|| ApiError::BadRequest("Invalid or missing species parameter".to_owned()))?;

  Ok(Json(FormResponse {
    success: true,
    species,
    form_definitions: form_definitions(species),
  }))
}
