//! The structured observation submitted for analysis.
//!
//! The wire shape is flat (every field sits directly under `input_data`);
//! grouping into vitals, clinical assessment and behaviour happens when the
//! detail record is built.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

// ─── Clinical enums ──────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HydrationStatus {
  Normal,
  MildDehydration,
  SevereDehydration,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MucousMembraneColor {
  Pink,
  Pale,
  Red,
  Yellow,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CoatCondition {
  Healthy,
  Dull,
  Matted,
  Patchy,
}

// ─── Behaviour enums ─────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Appetite {
  Normal,
  Increased,
  Decreased,
  Absent,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnergyLevel {
  Normal,
  Hyperactive,
  Lethargic,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Aggression {
  None,
  Mild,
  Moderate,
  Severe,
}

// ─── Vaccinations ────────────────────────────────────────────────────────────

/// Vaccination status as submitted. Anything other than `up_to_date` is
/// recorded as overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmittedVaccineStatus {
  UpToDate,
  Overdue,
  #[serde(other)]
  Unrecognised,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinationInput {
  pub vaccine_name:      String,
  /// RFC 3339 timestamp or `YYYY-MM-DD`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub administered_date: Option<String>,
  #[serde(default)]
  pub status:            Option<SubmittedVaccineStatus>,
}

// ─── HealthObservation ───────────────────────────────────────────────────────

/// One submitted set of observations for a single pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthObservation {
  // ── Basic information ───────────────────────────────────────────────────
  #[serde(default)]
  pub breed:                    String,
  pub age_in_months:            f64,
  pub weight_kg:                f64,

  // ── Vitals ──────────────────────────────────────────────────────────────
  /// Degrees Celsius.
  pub temperature:              f64,
  pub heart_rate:               f64,
  pub respiratory_rate:         f64,
  pub blood_pressure_systolic:  f64,
  pub blood_pressure_diastolic: f64,

  // ── Clinical assessment ─────────────────────────────────────────────────
  pub body_condition_score:     f64,
  pub hydration_status:         HydrationStatus,
  pub mucous_membrane_color:    MucousMembraneColor,
  pub coat_condition:           CoatCondition,

  // ── Behaviour ───────────────────────────────────────────────────────────
  pub appetite:                 Appetite,
  pub energy_level:             EnergyLevel,
  pub aggression:               Aggression,
  #[serde(default)]
  pub vomiting:                 bool,
  #[serde(default)]
  pub diarrhea:                 bool,
  #[serde(default)]
  pub coughing:                 bool,
  #[serde(default)]
  pub limping:                  bool,

  // ── Medical history ─────────────────────────────────────────────────────
  #[serde(default)]
  pub allergies:                Vec<String>,
  #[serde(default)]
  pub chronic_conditions:       Vec<String>,
  #[serde(default)]
  pub prescriptions:            Vec<String>,
  #[serde(default)]
  pub vaccinations:             Vec<VaccinationInput>,
}
