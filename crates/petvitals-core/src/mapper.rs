//! Turns a raw prediction plus the submitted observation into the shapes a
//! detail record stores. Pure; `now` is passed in by the caller.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
  observation::{HealthObservation, SubmittedVaccineStatus, VaccinationInput},
  prediction::PredictionResult,
  record::{
    AllergyEntry, ConditionEntry, PrescriptionEntry, Severity, VaccinationEntry,
    VaccinationStatus,
  },
};

/// Provenance note attached to every engine-derived prescription.
pub const PRESCRIPTION_NOTE: &str = "Auto-generated from ML analysis";

/// Separator between medication, dosage and frequency in an engine
/// prescription string.
pub const PRESCRIPTION_DELIMITER: char = '-';

/// The mapped, persistence-ready parts of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedAnalysis {
  pub diagnosis:          String,
  pub treatment:          String,
  pub allergies:          Vec<AllergyEntry>,
  pub chronic_conditions: Vec<ConditionEntry>,
  pub prescriptions:      Vec<PrescriptionEntry>,
  pub vaccinations:       Vec<VaccinationEntry>,
}

pub fn map_analysis(
  observation: &HealthObservation,
  prediction: &PredictionResult,
  now: DateTime<Utc>,
) -> MappedAnalysis {
  MappedAnalysis {
    diagnosis:          diagnosis_narrative(prediction),
    treatment:          prediction.treatment_text.clone(),
    allergies:          observation.allergies.iter().map(|a| allergy_entry(a)).collect(),
    chronic_conditions: observation
      .chronic_conditions
      .iter()
      .map(|c| condition_entry(c))
      .collect(),
    prescriptions:      prediction
      .prescriptions
      .iter()
      .map(|p| prescription_entry(p))
      .collect(),
    vaccinations:       observation
      .vaccinations
      .iter()
      .map(|v| vaccination_entry(v, now))
      .collect(),
  }
}

/// `"{status} (confidence {pct}%) — {diagnosis_text}"`, with the confidence of
/// the winning status to one decimal place.
pub fn diagnosis_narrative(prediction: &PredictionResult) -> String {
  let pct = prediction.winning_confidence() * 100.0;
  format!(
    "{} (confidence {pct:.1}%) — {}",
    prediction.predicted_status, prediction.diagnosis_text
  )
}

pub fn allergy_entry(allergen: &str) -> AllergyEntry {
  AllergyEntry {
    allergen: allergen.to_owned(),
    severity: Severity::Mild,
    notes:    String::new(),
  }
}

pub fn condition_entry(condition: &str) -> ConditionEntry {
  ConditionEntry {
    condition: condition.to_owned(),
    severity:  Severity::Mild,
    notes:     String::new(),
  }
}

/// Split `"Medication - Dosage - Frequency"`. Missing or blank segments fall
/// back to fixed defaults; anything after the third segment is ignored.
pub fn prescription_entry(raw: &str) -> PrescriptionEntry {
  let mut parts = raw.split(PRESCRIPTION_DELIMITER).map(str::trim);
  let mut next_or = |fallback: &str| {
    parts
      .next()
      .filter(|s| !s.is_empty())
      .unwrap_or(fallback)
      .to_owned()
  };

  let medication = next_or("Unknown");
  let dosage = next_or("As recommended");
  let frequency = next_or("As prescribed");

  PrescriptionEntry {
    medication,
    dosage,
    frequency,
    notes: PRESCRIPTION_NOTE.to_owned(),
  }
}

pub fn vaccination_entry(input: &VaccinationInput, now: DateTime<Utc>) -> VaccinationEntry {
  let administered_date = input
    .administered_date
    .as_deref()
    .and_then(parse_administered_date)
    .unwrap_or(now);

  let status = match input.status {
    Some(SubmittedVaccineStatus::UpToDate) => VaccinationStatus::UpToDate,
    _ => VaccinationStatus::Overdue,
  };

  VaccinationEntry {
    vaccine_name: input.vaccine_name.clone(),
    administered_date,
    next_due_date: None,
    status,
  }
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_administered_date(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.with_timezone(&Utc));
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|dt| dt.and_utc())
}
