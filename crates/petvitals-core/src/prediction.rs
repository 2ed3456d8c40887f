//! The normalised output of one inference call.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::pet::Species;

/// The three fixed health statuses the engine scores.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
pub enum HealthStatus {
  Healthy,
  #[serde(rename = "At Risk")]
  #[strum(serialize = "At Risk")]
  AtRisk,
  Unhealthy,
}

impl HealthStatus {
  pub const ALL: [HealthStatus; 3] =
    [HealthStatus::Healthy, HealthStatus::AtRisk, HealthStatus::Unhealthy];
}

/// Probability per status. All three keys are always present on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScores {
  #[serde(rename = "Healthy")]
  pub healthy:   f64,
  #[serde(rename = "At Risk")]
  pub at_risk:   f64,
  #[serde(rename = "Unhealthy")]
  pub unhealthy: f64,
}

impl ConfidenceScores {
  pub fn get(&self, status: HealthStatus) -> f64 {
    match status {
      HealthStatus::Healthy => self.healthy,
      HealthStatus::AtRisk => self.at_risk,
      HealthStatus::Unhealthy => self.unhealthy,
    }
  }
}

/// A successful prediction. Produced once per inference call and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
  pub predicted_status:     HealthStatus,
  pub confidence_scores:    ConfidenceScores,
  pub diagnosis_text:       String,
  pub treatment_text:       String,
  pub prescriptions:        Vec<String>,
  pub prediction_timestamp: String,
  pub model_version:        String,
  pub species:              Species,
}

impl PredictionResult {
  /// Confidence of the winning status.
  pub fn winning_confidence(&self) -> f64 {
    self.confidence_scores.get(self.predicted_status)
  }
}
