//! The inference-engine capability and its fixed request/response protocol.
//!
//! Implementations (subprocess-backed, in-process) live in
//! `petvitals-inference`. They all share [`EnginePayload`] for the request
//! and [`EngineOutput::into_prediction`] for normalisation, so swapping one
//! for another does not change what the pipeline sees.

use std::{collections::HashMap, future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  observation::HealthObservation,
  pet::Species,
  prediction::{ConfidenceScores, HealthStatus, PredictionResult},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Why a single inference attempt failed. Nothing here is retried
/// server-side.
#[derive(Debug, Error)]
pub enum InferenceError {
  #[error("no inference engine configured for species {0}")]
  Unsupported(Species),

  #[error("failed to spawn inference engine: {0}")]
  ProcessSpawn(String),

  #[error("inference engine exited with {}: {stderr}", exit_label(.exit_code))]
  Process {
    exit_code: Option<i32>,
    stderr:    String,
  },

  #[error("inference engine produced unreadable output: {reason}")]
  Protocol {
    reason: String,
    stdout: String,
  },

  #[error("inference engine reported failure: {0}")]
  Logic(String),

  #[error("inference engine timed out after {0:?}")]
  Timeout(Duration),
}

fn exit_label(code: &Option<i32>) -> String {
  match code {
    Some(c) => format!("code {c}"),
    None => "signal".to_owned(),
  }
}

impl InferenceError {
  /// Stable kind name surfaced to HTTP callers.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Unsupported(_) => "UnsupportedSpeciesError",
      Self::ProcessSpawn(_) => "ProcessSpawnError",
      Self::Process { .. } => "InferenceProcessError",
      Self::Protocol { .. } => "InferenceProtocolError",
      Self::Logic(_) => "InferenceLogicError",
      Self::Timeout(_) => "InferenceTimeoutError",
    }
  }

  /// Raw diagnostic text for operators.
  pub fn details(&self) -> String {
    match self {
      Self::Process { stderr, .. } => stderr.clone(),
      Self::Protocol { reason, stdout } => format!("{reason}; output: {stdout}"),
      other => other.to_string(),
    }
  }
}

// ─── Capability ──────────────────────────────────────────────────────────────

/// Scores one observation. One call is one attempt.
pub trait InferenceEngine: Send + Sync {
  fn predict<'a>(
    &'a self,
    species: Species,
    observation: &'a HealthObservation,
  ) -> impl Future<Output = Result<PredictionResult, InferenceError>> + Send + 'a;
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// The fixed JSON object written to the engine's input channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnginePayload {
  pub breed:                    String,
  pub age_in_months:            i64,
  pub weight_kg:                f64,
  pub temperature:              f64,
  pub heart_rate:               i64,
  pub respiratory_rate:         i64,
  pub blood_pressure_systolic:  i64,
  pub blood_pressure_diastolic: i64,
  pub body_condition_score:     i64,
  pub hydration_status:         String,
  pub mucous_membrane_color:    String,
  pub coat_condition:           String,
  pub appetite:                 String,
  pub energy_level:             String,
  pub aggression:               String,
  pub vomiting:                 bool,
  pub diarrhea:                 bool,
  pub coughing:                 bool,
  pub limping:                  bool,
  pub allergies:                Vec<String>,
  pub chronic_conditions:       Vec<String>,
  pub prescriptions:            Vec<String>,
  /// The vaccination list, JSON-encoded as a string.
  pub vaccinations:             String,
}

impl EnginePayload {
  pub fn from_observation(obs: &HealthObservation) -> Result<Self, serde_json::Error> {
    let breed = match obs.breed.trim() {
      "" => "Unknown".to_owned(),
      b => b.to_owned(),
    };

    Ok(Self {
      breed,
      age_in_months: obs.age_in_months.round() as i64,
      weight_kg: obs.weight_kg,
      temperature: obs.temperature,
      heart_rate: obs.heart_rate.round() as i64,
      respiratory_rate: obs.respiratory_rate.round() as i64,
      blood_pressure_systolic: obs.blood_pressure_systolic.round() as i64,
      blood_pressure_diastolic: obs.blood_pressure_diastolic.round() as i64,
      body_condition_score: obs.body_condition_score.round() as i64,
      hydration_status: obs.hydration_status.to_string(),
      mucous_membrane_color: obs.mucous_membrane_color.to_string(),
      coat_condition: obs.coat_condition.to_string(),
      appetite: obs.appetite.to_string(),
      energy_level: obs.energy_level.to_string(),
      aggression: obs.aggression.to_string(),
      vomiting: obs.vomiting,
      diarrhea: obs.diarrhea,
      coughing: obs.coughing,
      limping: obs.limping,
      allergies: obs.allergies.clone(),
      chronic_conditions: obs.chronic_conditions.clone(),
      prescriptions: obs.prescriptions.clone(),
      vaccinations: serde_json::to_string(&obs.vaccinations)?,
    })
  }
}

// ─── Response ────────────────────────────────────────────────────────────────

/// The JSON object read from the engine's output channel, as sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
  pub success:              bool,
  #[serde(default)]
  pub status:               Option<HealthStatus>,
  #[serde(default)]
  pub confidence_scores:    HashMap<String, f64>,
  #[serde(default)]
  pub diagnosis_text:       String,
  #[serde(default)]
  pub treatment_text:       String,
  #[serde(default)]
  pub prescriptions:        Vec<String>,
  #[serde(default)]
  pub prediction_timestamp: Option<String>,
  #[serde(default)]
  pub error:                Option<String>,
}

impl EngineOutput {
  /// Parse raw stdout bytes.
  pub fn parse(stdout: &[u8]) -> Result<Self, InferenceError> {
    serde_json::from_slice(stdout).map_err(|e| InferenceError::Protocol {
      reason: e.to_string(),
      stdout: String::from_utf8_lossy(stdout).into_owned(),
    })
  }

  /// Normalise into a [`PredictionResult`]. Missing confidence entries
  /// default to zero; an explicit failure flag becomes
  /// [`InferenceError::Logic`].
  pub fn into_prediction(
    self,
    species: Species,
    model_version: &str,
  ) -> Result<PredictionResult, InferenceError> {
    if !self.success {
      return Err(InferenceError::Logic(
        self.error.unwrap_or_else(|| "Prediction failed".to_owned()),
      ));
    }

    let predicted_status = self.status.ok_or_else(|| InferenceError::Protocol {
      reason: "successful output carries no status".to_owned(),
      stdout: String::new(),
    })?;

    let score = |status: HealthStatus| {
      self
        .confidence_scores
        .get(status.as_ref())
        .copied()
        .unwrap_or(0.0)
    };
    let confidence_scores = ConfidenceScores {
      healthy:   score(HealthStatus::Healthy),
      at_risk:   score(HealthStatus::AtRisk),
      unhealthy: score(HealthStatus::Unhealthy),
    };

    Ok(PredictionResult {
      predicted_status,
      confidence_scores,
      diagnosis_text: self.diagnosis_text,
      treatment_text: self.treatment_text,
      prescriptions: self.prescriptions,
      prediction_timestamp: self
        .prediction_timestamp
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
      model_version: model_version.to_owned(),
      species,
    })
  }
}
