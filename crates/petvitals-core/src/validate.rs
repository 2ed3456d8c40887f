//! Input validation. Pure; no I/O.
//!
//! Every check runs independently and every violation is collected, so the
//! caller gets the full list in one round trip.

use serde::Serialize;

use crate::{mapper::parse_administered_date, observation::HealthObservation, pet::Species};

// ─── Bounds ──────────────────────────────────────────────────────────────────

pub const AGE_MONTHS: (f64, f64) = (0.0, 240.0);
/// Lower bound is exclusive.
pub const WEIGHT_KG: (f64, f64) = (0.0, 100.0);
pub const TEMPERATURE_C: (f64, f64) = (35.0, 42.0);
pub const HEART_RATE_BPM: (f64, f64) = (50.0, 300.0);
pub const RESPIRATORY_RATE: (f64, f64) = (5.0, 60.0);
pub const SYSTOLIC_MMHG: (f64, f64) = (80.0, 250.0);
pub const DIASTOLIC_MMHG: (f64, f64) = (40.0, 160.0);

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
  pub valid:  bool,
  pub errors: Vec<String>,
}

impl ValidationReport {
  pub fn from_errors(errors: Vec<String>) -> Self {
    Self { valid: errors.is_empty(), errors }
  }
}

fn within(value: f64, (min, max): (f64, f64)) -> bool {
  (min..=max).contains(&value)
}

/// Check `observation` against the documented domain bounds for `species`.
pub fn validate(observation: &HealthObservation, species: Species) -> ValidationReport {
  let mut errors = Vec::new();

  if observation.breed.trim().is_empty() {
    errors.push("Breed is required".to_owned());
  }

  if !within(observation.age_in_months, AGE_MONTHS) {
    errors.push("Age must be between 0 and 240 months (0-20 years)".to_owned());
  }

  // NaN fails both comparisons, so test for the valid interval.
  let (min_weight, max_weight) = WEIGHT_KG;
  if !(observation.weight_kg > min_weight && observation.weight_kg <= max_weight) {
    errors.push("Weight must be greater than 0 and at most 100 kg".to_owned());
  }

  if !within(observation.temperature, TEMPERATURE_C) {
    errors.push("Temperature must be between 35.0 and 42.0°C".to_owned());
  }

  if !within(observation.heart_rate, HEART_RATE_BPM) {
    errors.push("Heart rate must be between 50 and 300 bpm".to_owned());
  }

  if !within(observation.respiratory_rate, RESPIRATORY_RATE) {
    errors.push("Respiratory rate must be between 5 and 60 breaths/min".to_owned());
  }

  if !within(observation.blood_pressure_systolic, SYSTOLIC_MMHG) {
    errors.push("Blood pressure systolic must be between 80 and 250 mmHg".to_owned());
  }

  if !within(observation.blood_pressure_diastolic, DIASTOLIC_MMHG) {
    errors.push("Blood pressure diastolic must be between 40 and 160 mmHg".to_owned());
  }

  let (min_bcs, max_bcs) = species.body_condition_range();
  if !within(observation.body_condition_score, (min_bcs.into(), max_bcs.into())) {
    errors.push(format!(
      "Body condition score must be between {min_bcs} and {max_bcs}"
    ));
  }

  for vaccination in &observation.vaccinations {
    if let Some(raw) = vaccination.administered_date.as_deref()
      && parse_administered_date(raw).is_none()
    {
      errors.push(format!(
        "Vaccination {:?} has an unreadable administered date {raw:?}",
        vaccination.vaccine_name
      ));
    }
  }

  ValidationReport::from_errors(errors)
}
