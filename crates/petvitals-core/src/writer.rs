//! RecordWriter persists one analysis as a detail record followed by the
//! envelope that references it.
//!
//! The two writes are ordered and not wrapped in a shared transaction. If the
//! envelope write fails the detail record is left unreferenced; the caller
//! gets [`Error::PartialPersistence`] and the orphan sweep in
//! [`crate::reconcile`] cleans up later.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  mapper::map_analysis,
  observation::HealthObservation,
  pet::{PetProfile, Species},
  prediction::PredictionResult,
  record::{
    BloodPressure, Behavior, CatMetrics, ClinicalSnapshot, CreatorType,
    DogMetrics, Measurement, NewCommonRecord, NewSpeciesRecord, PetSnapshot,
    SpeciesMetrics, Vitals,
  },
  store::HealthRecordStore,
};

/// Ids of the two documents written for one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAnalysis {
  #[serde(rename = "commonRecordId")]
  pub common_record_id:  Uuid,
  #[serde(rename = "speciesRecordId")]
  pub species_record_id: Uuid,
}

pub struct RecordWriter<S> {
  store: Arc<S>,
}

impl<S> Clone for RecordWriter<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store) }
  }
}

impl<S: HealthRecordStore> RecordWriter<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// Snapshot the pet, write the detail record, then write the envelope.
  pub async fn store_analysis_result(
    &self,
    pet_id: Uuid,
    creator_id: Uuid,
    species: Species,
    observation: &HealthObservation,
    prediction: &PredictionResult,
  ) -> Result<StoredAnalysis> {
    let pet = self
      .store
      .find_pet(pet_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::PetNotFound(pet_id))?;
    if pet.species != species {
      return Err(Error::SpeciesMismatch {
        pet_id,
        pet_species: pet.species,
        requested: species,
      });
    }

    let now = Utc::now();
    let detail = build_species_record(&pet, species, observation, prediction, now);

    let detail = self
      .store
      .insert_species_record(detail)
      .await
      .map_err(Error::store)?;
    let reference = detail.reference();
    tracing::debug!(
      species_record_id = %reference.record_id,
      kind = %reference.kind,
      "stored species health record"
    );

    let envelope = NewCommonRecord {
      pet_id,
      created_by: creator_id,
      created_by_type: CreatorType::MlModel,
      species_type: species,
      species_record: reference,
      visit_date: Some(now),
    };
    envelope.check_discriminator()?;

    let envelope = match self.store.insert_common_record(envelope).await {
      Ok(e) => e,
      Err(e) => {
        tracing::warn!(
          species_record_id = %reference.record_id,
          error = %e,
          "envelope write failed; species record left unreferenced"
        );
        return Err(Error::PartialPersistence {
          species_record_id: reference.record_id,
          source:            Box::new(e),
        });
      }
    };

    tracing::info!(
      pet = %pet.name,
      common_record_id = %envelope.record_id,
      species_record_id = %reference.record_id,
      "stored analysis"
    );

    Ok(StoredAnalysis {
      common_record_id:  envelope.record_id,
      species_record_id: reference.record_id,
    })
  }
}

/// Assemble the detail record for one analysis from the pet snapshot, the
/// observation and the mapped prediction.
pub fn build_species_record(
  pet: &PetProfile,
  species: Species,
  observation: &HealthObservation,
  prediction: &PredictionResult,
  now: DateTime<Utc>,
) -> NewSpeciesRecord {
  let mapped = map_analysis(observation, prediction, now);
  let body_condition_score = observation.body_condition_score.round() as u8;

  let metrics = match species {
    Species::Cat => SpeciesMetrics::Cat(CatMetrics {
      body_condition_score,
      hydration_status: observation.hydration_status,
      mucous_membrane_color: observation.mucous_membrane_color,
      coat_condition: observation.coat_condition,
    }),
    Species::Dog => SpeciesMetrics::Dog(DogMetrics {
      body_condition_score,
      hydration_status: observation.hydration_status,
      mucous_membrane_color: observation.mucous_membrane_color,
    }),
  };

  let clinical = ClinicalSnapshot {
    pet_snapshot:       PetSnapshot {
      name:          pet.name.clone(),
      breed:         pet
        .breed
        .clone()
        .filter(|b| !b.trim().is_empty())
        .unwrap_or_else(|| "Unknown".to_owned()),
      date_of_birth: pet.date_of_birth,
      age_in_months: observation.age_in_months.round() as u32,
    },
    vitals:             Vitals {
      weight:           Measurement::new(observation.weight_kg, "kg"),
      temperature:      Measurement::new(observation.temperature, "C"),
      heart_rate:       Measurement::new(observation.heart_rate, "bpm"),
      respiratory_rate: Measurement::new(observation.respiratory_rate, "bpm"),
      blood_pressure:   BloodPressure {
        systolic:  observation.blood_pressure_systolic.round() as u32,
        diastolic: observation.blood_pressure_diastolic.round() as u32,
        unit:      "mmHg".to_owned(),
      },
    },
    behavior:           Behavior {
      appetite:     observation.appetite,
      energy_level: observation.energy_level,
      aggression:   observation.aggression,
      vomiting:     observation.vomiting,
      diarrhea:     observation.diarrhea,
      coughing:     observation.coughing,
      limping:      observation.limping,
    },
    vaccinations:       mapped.vaccinations,
    diagnosis:          mapped.diagnosis,
    treatment:          mapped.treatment,
    allergies:          mapped.allergies,
    chronic_conditions: mapped.chronic_conditions,
    prescriptions:      mapped.prescriptions,
    attachments:        Vec::new(),
  };

  NewSpeciesRecord { metrics, clinical }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    prediction::HealthStatus,
    record::{SpeciesHealthRecord, SpeciesRecordKind},
    testing::{MemoryStore, persian_cat, prediction},
  };

  #[tokio::test]
  async fn writes_detail_then_envelope() {
    let store = Arc::new(MemoryStore::default());
    let pet = store.add_pet("Mochi", Species::Cat);
    let writer = RecordWriter::new(store.clone());

    let stored = writer
      .store_analysis_result(
        pet.pet_id,
        Uuid::nil(),
        Species::Cat,
        &persian_cat(),
        &prediction(HealthStatus::Healthy),
      )
      .await
      .unwrap();

    let envelope = store.envelope(stored.common_record_id).unwrap();
    assert_eq!(envelope.species_record.record_id, stored.species_record_id);
    assert_eq!(envelope.species_record.kind, SpeciesRecordKind::CatHealthRecord);
    assert_eq!(envelope.created_by_type, CreatorType::MlModel);
    assert_eq!(envelope.species_type, Species::Cat);
    assert_eq!(store.write_log(), vec!["species", "common"]);

    let detail = store.detail(envelope.species_record).unwrap();
    assert!(matches!(detail, SpeciesHealthRecord::CatHealthRecord(_)));
  }

  #[tokio::test]
  async fn missing_pet_writes_nothing() {
    let store = Arc::new(MemoryStore::default());
    let writer = RecordWriter::new(store.clone());
    let pet_id = Uuid::new_v4();

    let err = writer
      .store_analysis_result(
        pet_id,
        Uuid::nil(),
        Species::Cat,
        &persian_cat(),
        &prediction(HealthStatus::Healthy),
      )
      .await
      .unwrap_err();

    assert!(matches!(err, Error::PetNotFound(id) if id == pet_id));
    assert!(store.write_log().is_empty());
  }

  #[tokio::test]
  async fn species_must_match_the_pet() {
    let store = Arc::new(MemoryStore::default());
    let pet = store.add_pet("Mochi", Species::Cat);
    let writer = RecordWriter::new(store.clone());

    let err = writer
      .store_analysis_result(
        pet.pet_id,
        Uuid::nil(),
        Species::Dog,
        &persian_cat(),
        &prediction(HealthStatus::Healthy),
      )
      .await
      .unwrap_err();

    assert!(matches!(
      err,
      Error::SpeciesMismatch { pet_species: Species::Cat, requested: Species::Dog, .. }
    ));
    assert!(store.write_log().is_empty());
  }

  #[tokio::test]
  async fn envelope_failure_reports_partial_persistence() {
    let store = Arc::new(MemoryStore::default());
    let pet = store.add_pet("Rex", Species::Dog);
    store.fail_envelope_writes();
    let writer = RecordWriter::new(store.clone());

    let err = writer
      .store_analysis_result(
        pet.pet_id,
        Uuid::nil(),
        Species::Dog,
        &persian_cat(),
        &prediction(HealthStatus::AtRisk),
      )
      .await
      .unwrap_err();

    let Error::PartialPersistence { species_record_id, .. } = err else {
      panic!("expected partial persistence, got {err:?}");
    };
    let orphan = store
      .detail(crate::record::SpeciesRecordRef {
        record_id: species_record_id,
        kind:      SpeciesRecordKind::DogHealthRecord,
      })
      .unwrap();
    assert_eq!(orphan.record_id(), species_record_id);
  }

  #[test]
  fn dog_record_has_no_coat_condition() {
    let pet = PetProfile {
      pet_id:        Uuid::new_v4(),
      name:          "Rex".into(),
      species:       Species::Dog,
      breed:         None,
      date_of_birth: chrono::NaiveDate::from_ymd_opt(2022, 5, 1).unwrap(),
    };
    let record = build_species_record(
      &pet,
      Species::Dog,
      &persian_cat(),
      &prediction(HealthStatus::Healthy),
      Utc::now(),
    );
    assert!(matches!(record.metrics, SpeciesMetrics::Dog(_)));
    assert_eq!(record.kind(), SpeciesRecordKind::DogHealthRecord);
    assert_eq!(record.clinical.pet_snapshot.breed, "Unknown");
    assert_eq!(record.clinical.vitals.blood_pressure.unit, "mmHg");
  }
}
