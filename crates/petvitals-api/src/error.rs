//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use petvitals_core::engine::InferenceError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler. Every variant renders as
/// `{"success": false, "error": ...}` plus variant-specific detail.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  /// The observation failed validation; each violation is listed.
  #[error("invalid input data")]
  Validation(Vec<String>),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("inference failed: {source}")]
  Inference {
    request_id: String,
    #[source]
    source:     InferenceError,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<petvitals_core::Error> for ApiError {
  fn from(e: petvitals_core::Error) -> Self {
    if e.is_not_found() {
      ApiError::NotFound(e.to_string())
    } else if matches!(e, petvitals_core::Error::SpeciesMismatch { .. }) {
      ApiError::BadRequest(e.to_string())
    } else {
      ApiError::Store(Box::new(e))
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, json!({ "success": false, "error": m }))
      }
      ApiError::Validation(errors) => (
        StatusCode::BAD_REQUEST,
        json!({ "success": false, "error": "Invalid input data", "errors": errors }),
      ),
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, json!({ "success": false, "error": m }))
      }
      ApiError::Inference { request_id, source } => (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({
          "request_id": request_id,
          "success": false,
          "error": "ML analysis failed",
          "error_kind": source.kind(),
          "error_details": source.details(),
        }),
      ),
      ApiError::Store(e) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "success": false, "error": "Storage failure", "error_details": e.to_string() }),
      ),
    };
    (status, Json(body)).into_response()
  }
}
