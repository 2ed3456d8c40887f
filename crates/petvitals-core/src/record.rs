//! Health records: the species-specific detail record and the common
//! envelope that references it.
//!
//! Both are write-once. Once a store hands one back it is never updated;
//! there are no setters here and the SQLite backend rejects UPDATEs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  observation::{
    Aggression, Appetite, CoatCondition, EnergyLevel, HydrationStatus,
    MucousMembraneColor,
  },
  pet::Species,
};

// ─── Discriminator ───────────────────────────────────────────────────────────

/// Names the table a polymorphic reference resolves against. The variant name
/// is the discriminator string stored on the envelope.
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
pub enum SpeciesRecordKind {
  CatHealthRecord,
  DogHealthRecord,
}

impl SpeciesRecordKind {
  pub fn for_species(species: Species) -> Self {
    match species {
      Species::Cat => Self::CatHealthRecord,
      Species::Dog => Self::DogHealthRecord,
    }
  }

  pub fn species(self) -> Species {
    match self {
      Self::CatHealthRecord => Species::Cat,
      Self::DogHealthRecord => Species::Dog,
    }
  }

  /// The discriminator string stored in the database.
  pub fn discriminant(self) -> &'static str {
    match self {
      Self::CatHealthRecord => "CatHealthRecord",
      Self::DogHealthRecord => "DogHealthRecord",
    }
  }

  /// Resolve a stored discriminator string.
  pub fn from_discriminant(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownRecordKind(s.to_owned()))
  }
}

/// The polymorphic reference from an envelope to its detail record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesRecordRef {
  #[serde(rename = "species_health_record_id")]
  pub record_id: Uuid,
  #[serde(rename = "species_health_record_model")]
  pub kind:      SpeciesRecordKind,
}

// ─── Detail sub-types ────────────────────────────────────────────────────────

/// Who the pet was at the time of analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetSnapshot {
  pub name:          String,
  pub breed:         String,
  pub date_of_birth: NaiveDate,
  pub age_in_months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
  pub value: f64,
  pub unit:  String,
}

impl Measurement {
  pub fn new(value: f64, unit: &str) -> Self {
    Self { value, unit: unit.to_owned() }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
  pub systolic:  u32,
  pub diastolic: u32,
  pub unit:      String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
  pub weight:           Measurement,
  pub temperature:      Measurement,
  pub heart_rate:       Measurement,
  pub respiratory_rate: Measurement,
  pub blood_pressure:   BloodPressure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatMetrics {
  pub body_condition_score:  u8,
  pub hydration_status:      HydrationStatus,
  pub mucous_membrane_color: MucousMembraneColor,
  pub coat_condition:        CoatCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DogMetrics {
  pub body_condition_score:  u8,
  pub hydration_status:      HydrationStatus,
  pub mucous_membrane_color: MucousMembraneColor,
}

/// Species-specific clinical metrics, before they are bound to a record id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeciesMetrics {
  Cat(CatMetrics),
  Dog(DogMetrics),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
  pub appetite:     Appetite,
  pub energy_level: EnergyLevel,
  pub aggression:   Aggression,
  pub vomiting:     bool,
  pub diarrhea:     bool,
  pub coughing:     bool,
  pub limping:      bool,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
  #[default]
  Mild,
  Moderate,
  Severe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllergyEntry {
  pub allergen: String,
  pub severity: Severity,
  pub notes:    String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEntry {
  pub condition: String,
  pub severity:  Severity,
  pub notes:     String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionEntry {
  pub medication: String,
  pub dosage:     String,
  pub frequency:  String,
  pub notes:      String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaccinationStatus {
  UpToDate,
  DueSoon,
  Overdue,
  NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinationEntry {
  pub vaccine_name:      String,
  pub administered_date: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub next_due_date:     Option<DateTime<Utc>>,
  pub status:            VaccinationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
  Image,
  Pdf,
  Document,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
  pub file_name:   String,
  pub file_url:    String,
  pub file_type:   AttachmentKind,
  pub uploaded_at: DateTime<Utc>,
}

/// Everything a detail record holds apart from its species metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalSnapshot {
  pub pet_snapshot:       PetSnapshot,
  pub vitals:             Vitals,
  pub behavior:           Behavior,
  pub vaccinations:       Vec<VaccinationEntry>,
  pub diagnosis:          String,
  pub treatment:          String,
  pub allergies:          Vec<AllergyEntry>,
  pub chronic_conditions: Vec<ConditionEntry>,
  pub prescriptions:      Vec<PrescriptionEntry>,
  #[serde(default)]
  pub attachments:        Vec<Attachment>,
}

// ─── Detail records ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatHealthRecord {
  pub record_id:   Uuid,
  pub created_at:  DateTime<Utc>,
  pub cat_metrics: CatMetrics,
  #[serde(flatten)]
  pub clinical:    ClinicalSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DogHealthRecord {
  pub record_id:   Uuid,
  pub created_at:  DateTime<Utc>,
  pub dog_metrics: DogMetrics,
  #[serde(flatten)]
  pub clinical:    ClinicalSnapshot,
}

/// A species detail record, resolved from an envelope's discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SpeciesHealthRecord {
  CatHealthRecord(CatHealthRecord),
  DogHealthRecord(DogHealthRecord),
}

impl SpeciesHealthRecord {
  pub fn record_id(&self) -> Uuid {
    match self {
      Self::CatHealthRecord(r) => r.record_id,
      Self::DogHealthRecord(r) => r.record_id,
    }
  }

  pub fn kind(&self) -> SpeciesRecordKind {
    match self {
      Self::CatHealthRecord(_) => SpeciesRecordKind::CatHealthRecord,
      Self::DogHealthRecord(_) => SpeciesRecordKind::DogHealthRecord,
    }
  }

  pub fn created_at(&self) -> DateTime<Utc> {
    match self {
      Self::CatHealthRecord(r) => r.created_at,
      Self::DogHealthRecord(r) => r.created_at,
    }
  }

  pub fn clinical(&self) -> &ClinicalSnapshot {
    match self {
      Self::CatHealthRecord(r) => &r.clinical,
      Self::DogHealthRecord(r) => &r.clinical,
    }
  }

  pub fn reference(&self) -> SpeciesRecordRef {
    SpeciesRecordRef { record_id: self.record_id(), kind: self.kind() }
  }
}

/// Input to [`crate::store::HealthRecordStore::insert_species_record`].
/// The id and creation timestamp are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSpeciesRecord {
  pub metrics:  SpeciesMetrics,
  pub clinical: ClinicalSnapshot,
}

impl NewSpeciesRecord {
  pub fn kind(&self) -> SpeciesRecordKind {
    match self.metrics {
      SpeciesMetrics::Cat(_) => SpeciesRecordKind::CatHealthRecord,
      SpeciesMetrics::Dog(_) => SpeciesRecordKind::DogHealthRecord,
    }
  }

  pub fn into_record(
    self,
    record_id: Uuid,
    created_at: DateTime<Utc>,
  ) -> SpeciesHealthRecord {
    match self.metrics {
      SpeciesMetrics::Cat(cat_metrics) => {
        SpeciesHealthRecord::CatHealthRecord(CatHealthRecord {
          record_id,
          created_at,
          cat_metrics,
          clinical: self.clinical,
        })
      }
      SpeciesMetrics::Dog(dog_metrics) => {
        SpeciesHealthRecord::DogHealthRecord(DogHealthRecord {
          record_id,
          created_at,
          dog_metrics,
          clinical: self.clinical,
        })
      }
    }
  }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// Who (or what) authored an envelope.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CreatorType {
  Vet,
  PetOwner,
  MlModel,
}

/// The common health record. References, but does not contain, the species
/// detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonHealthRecord {
  pub record_id:       Uuid,
  pub pet_id:          Uuid,
  pub created_by:      Uuid,
  pub created_by_type: CreatorType,
  pub species_type:    Species,
  #[serde(flatten)]
  pub species_record:  SpeciesRecordRef,
  pub visit_date:      DateTime<Utc>,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::HealthRecordStore::insert_common_record`].
#[derive(Debug, Clone)]
pub struct NewCommonRecord {
  pub pet_id:          Uuid,
  pub created_by:      Uuid,
  pub created_by_type: CreatorType,
  pub species_type:    Species,
  pub species_record:  SpeciesRecordRef,
  /// Defaults to the insertion time.
  pub visit_date:      Option<DateTime<Utc>>,
}

impl NewCommonRecord {
  /// The discriminator must name the table for `species_type`.
  pub fn check_discriminator(&self) -> Result<()> {
    if self.species_record.kind.species() != self.species_type {
      return Err(Error::DiscriminatorMismatch {
        species: match self.species_type {
          Species::Cat => "cat",
          Species::Dog => "dog",
        },
        kind:    self.species_record.kind.discriminant(),
      });
    }
    Ok(())
  }
}
