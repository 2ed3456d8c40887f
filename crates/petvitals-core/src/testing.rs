//! Fixtures and an in-memory [`HealthRecordStore`] for unit tests.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  observation::{
    Aggression, Appetite, CoatCondition, EnergyLevel, HealthObservation,
    HydrationStatus, MucousMembraneColor,
  },
  pet::{PetProfile, Species},
  prediction::{ConfidenceScores, HealthStatus, PredictionResult},
  record::{
    CommonHealthRecord, CreatorType, NewCommonRecord, NewSpeciesRecord,
    SpeciesHealthRecord, SpeciesRecordKind, SpeciesRecordRef,
  },
  store::HealthRecordStore,
};

/// A healthy adult Persian cat, inside every bound.
pub fn persian_cat() -> HealthObservation {
  HealthObservation {
    breed:                    "Persian".into(),
    age_in_months:            24.0,
    weight_kg:                4.2,
    temperature:              38.5,
    heart_rate:               150.0,
    respiratory_rate:         30.0,
    blood_pressure_systolic:  120.0,
    blood_pressure_diastolic: 80.0,
    body_condition_score:     5.0,
    hydration_status:         HydrationStatus::Normal,
    mucous_membrane_color:    MucousMembraneColor::Pink,
    coat_condition:           CoatCondition::Healthy,
    appetite:                 Appetite::Normal,
    energy_level:             EnergyLevel::Normal,
    aggression:               Aggression::None,
    vomiting:                 false,
    diarrhea:                 false,
    coughing:                 false,
    limping:                  false,
    allergies:                Vec::new(),
    chronic_conditions:       Vec::new(),
    prescriptions:            Vec::new(),
    vaccinations:             Vec::new(),
  }
}

pub fn prediction(status: HealthStatus) -> PredictionResult {
  let mut scores = ConfidenceScores { healthy: 0.05, at_risk: 0.05, unhealthy: 0.05 };
  match status {
    HealthStatus::Healthy => scores.healthy = 0.9,
    HealthStatus::AtRisk => scores.at_risk = 0.9,
    HealthStatus::Unhealthy => scores.unhealthy = 0.9,
  }
  PredictionResult {
    predicted_status:     status,
    confidence_scores:    scores,
    diagnosis_text:       "No significant findings".into(),
    treatment_text:       "Routine check-up in 12 months".into(),
    prescriptions:        vec!["Omega-3 - 1 capsule - daily".into()],
    prediction_timestamp: "2026-01-01T00:00:00Z".into(),
    model_version:        "test-1".into(),
    species:              Species::Cat,
  }
}

// ─── MemoryStore ─────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("memory store: {0}")]
pub struct MemoryError(&'static str);

#[derive(Default)]
pub struct MemoryStore {
  pets:          Mutex<HashMap<Uuid, PetProfile>>,
  details:       Mutex<HashMap<Uuid, SpeciesHealthRecord>>,
  envelopes:     Mutex<Vec<CommonHealthRecord>>,
  log:           Mutex<Vec<&'static str>>,
  fail_envelope: AtomicBool,
}

impl MemoryStore {
  pub fn add_pet(&self, name: &str, species: Species) -> PetProfile {
    let pet = PetProfile {
      pet_id: Uuid::new_v4(),
      name: name.to_owned(),
      species,
      breed: None,
      date_of_birth: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    };
    self.pets.lock().unwrap().insert(pet.pet_id, pet.clone());
    pet
  }

  pub fn envelope(&self, record_id: Uuid) -> Option<CommonHealthRecord> {
    self
      .envelopes
      .lock()
      .unwrap()
      .iter()
      .find(|e| e.record_id == record_id)
      .cloned()
  }

  pub fn detail(&self, reference: SpeciesRecordRef) -> Option<SpeciesHealthRecord> {
    self
      .details
      .lock()
      .unwrap()
      .get(&reference.record_id)
      .filter(|d| d.kind() == reference.kind)
      .cloned()
  }

  pub fn write_log(&self) -> Vec<&'static str> {
    self.log.lock().unwrap().clone()
  }

  pub fn fail_envelope_writes(&self) {
    self.fail_envelope.store(true, Ordering::SeqCst);
  }

  /// Insert an envelope whose detail record does not exist. Bypasses the
  /// referential check a real backend would apply.
  pub fn insert_dangling_envelope(&self, pet_id: Uuid, visit_date: DateTime<Utc>) -> Uuid {
    let record_id = Uuid::new_v4();
    self.envelopes.lock().unwrap().push(CommonHealthRecord {
      record_id,
      pet_id,
      created_by: Uuid::nil(),
      created_by_type: CreatorType::MlModel,
      species_type: Species::Cat,
      species_record: SpeciesRecordRef {
        record_id: Uuid::new_v4(),
        kind:      SpeciesRecordKind::CatHealthRecord,
      },
      visit_date,
      created_at: Utc::now(),
    });
    record_id
  }

  /// Insert a detail record with an explicit creation time and no envelope.
  pub fn insert_orphan(&self, input: NewSpeciesRecord, created_at: DateTime<Utc>) -> SpeciesRecordRef {
    let record = input.into_record(Uuid::new_v4(), created_at);
    let reference = record.reference();
    self.details.lock().unwrap().insert(reference.record_id, record);
    reference
  }

  fn is_referenced(&self, reference: SpeciesRecordRef) -> bool {
    self
      .envelopes
      .lock()
      .unwrap()
      .iter()
      .any(|e| e.species_record == reference)
  }
}

impl HealthRecordStore for MemoryStore {
  type Error = MemoryError;

  async fn find_pet(&self, pet_id: Uuid) -> Result<Option<PetProfile>, MemoryError> {
    Ok(self.pets.lock().unwrap().get(&pet_id).cloned())
  }

  async fn insert_species_record(
    &self,
    input: NewSpeciesRecord,
  ) -> Result<SpeciesHealthRecord, MemoryError> {
    let record = input.into_record(Uuid::new_v4(), Utc::now());
    self.details.lock().unwrap().insert(record.record_id(), record.clone());
    self.log.lock().unwrap().push("species");
    Ok(record)
  }

  async fn insert_common_record(
    &self,
    input: NewCommonRecord,
  ) -> Result<CommonHealthRecord, MemoryError> {
    if self.fail_envelope.load(Ordering::SeqCst) {
      return Err(MemoryError("envelope writes disabled"));
    }
    if self.detail(input.species_record).is_none() {
      return Err(MemoryError("referenced species record does not exist"));
    }
    let now = Utc::now();
    let record = CommonHealthRecord {
      record_id:       Uuid::new_v4(),
      pet_id:          input.pet_id,
      created_by:      input.created_by,
      created_by_type: input.created_by_type,
      species_type:    input.species_type,
      species_record:  input.species_record,
      visit_date:      input.visit_date.unwrap_or(now),
      created_at:      now,
    };
    self.envelopes.lock().unwrap().push(record.clone());
    self.log.lock().unwrap().push("common");
    Ok(record)
  }

  async fn get_common_record(
    &self,
    record_id: Uuid,
  ) -> Result<Option<CommonHealthRecord>, MemoryError> {
    Ok(self.envelope(record_id))
  }

  async fn get_species_record(
    &self,
    reference: SpeciesRecordRef,
  ) -> Result<Option<SpeciesHealthRecord>, MemoryError> {
    Ok(self.detail(reference))
  }

  async fn list_common_records(
    &self,
    pet_id: Uuid,
    limit: usize,
  ) -> Result<Vec<CommonHealthRecord>, MemoryError> {
    let mut out: Vec<_> = self
      .envelopes
      .lock()
      .unwrap()
      .iter()
      .filter(|e| e.pet_id == pet_id)
      .cloned()
      .collect();
    out.sort_by(|a, b| b.visit_date.cmp(&a.visit_date));
    out.truncate(limit);
    Ok(out)
  }

  async fn find_orphan_species_records(
    &self,
    created_before: DateTime<Utc>,
  ) -> Result<Vec<SpeciesRecordRef>, MemoryError> {
    let candidates: Vec<_> = self
      .details
      .lock()
      .unwrap()
      .values()
      .filter(|d| d.created_at() < created_before)
      .map(SpeciesHealthRecord::reference)
      .collect();
    Ok(candidates.into_iter().filter(|r| !self.is_referenced(*r)).collect())
  }

  async fn remove_orphan_species_record(
    &self,
    reference: SpeciesRecordRef,
  ) -> Result<bool, MemoryError> {
    if self.is_referenced(reference) {
      return Ok(false);
    }
    Ok(self.details.lock().unwrap().remove(&reference.record_id).is_some())
  }
}
