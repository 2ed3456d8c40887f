//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 UTC with a fixed microsecond precision, so string
//! order matches time order. Species metrics and the clinical snapshot are
//! stored as compact JSON. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use petvitals_core::{
  pet::{PetProfile, Species},
  record::{
    CatHealthRecord, CommonHealthRecord, CreatorType, DogHealthRecord,
    SpeciesHealthRecord, SpeciesMetrics, SpeciesRecordKind, SpeciesRecordRef,
  },
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ────────────────────────────────────────────────────────────

pub fn decode_species(s: &str) -> Result<Species> {
  s.parse().map_err(|_| Error::UnknownValue { column: "species", value: s.to_owned() })
}

pub fn decode_creator_type(s: &str) -> Result<CreatorType> {
  s.parse().map_err(|_| Error::UnknownValue {
    column: "created_by_type",
    value:  s.to_owned(),
  })
}

/// The detail table a discriminator resolves to.
pub fn detail_table(kind: SpeciesRecordKind) -> &'static str {
  match kind {
    SpeciesRecordKind::CatHealthRecord => "cat_health_records",
    SpeciesRecordKind::DogHealthRecord => "dog_health_records",
  }
}

pub fn encode_metrics(metrics: &SpeciesMetrics) -> Result<String> {
  Ok(match metrics {
    SpeciesMetrics::Cat(m) => serde_json::to_string(m)?,
    SpeciesMetrics::Dog(m) => serde_json::to_string(m)?,
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `pets` row.
pub struct RawPet {
  pub pet_id:        String,
  pub name:          String,
  pub species:       String,
  pub breed:         Option<String>,
  pub date_of_birth: String,
}

impl RawPet {
  pub fn into_pet(self) -> Result<PetProfile> {
    Ok(PetProfile {
      pet_id:        decode_uuid(&self.pet_id)?,
      name:          self.name,
      species:       decode_species(&self.species)?,
      breed:         self.breed,
      date_of_birth: decode_date(&self.date_of_birth)?,
    })
  }
}

/// Raw strings read from either detail table.
pub struct RawSpeciesRecord {
  pub record_id:     String,
  pub created_at:    String,
  pub metrics_json:  String,
  pub clinical_json: String,
}

impl RawSpeciesRecord {
  /// Decode against the table `kind` names.
  pub fn into_record(self, kind: SpeciesRecordKind) -> Result<SpeciesHealthRecord> {
    let record_id = decode_uuid(&self.record_id)?;
    let created_at = decode_dt(&self.created_at)?;
    let clinical = serde_json::from_str(&self.clinical_json)?;

    Ok(match kind {
      SpeciesRecordKind::CatHealthRecord => {
        SpeciesHealthRecord::CatHealthRecord(CatHealthRecord {
          record_id,
          created_at,
          cat_metrics: serde_json::from_str(&self.metrics_json)?,
          clinical,
        })
      }
      SpeciesRecordKind::DogHealthRecord => {
        SpeciesHealthRecord::DogHealthRecord(DogHealthRecord {
          record_id,
          created_at,
          dog_metrics: serde_json::from_str(&self.metrics_json)?,
          clinical,
        })
      }
    })
  }
}

/// Raw strings read directly from a `common_health_records` row.
pub struct RawCommonRecord {
  pub record_id:                   String,
  pub pet_id:                      String,
  pub created_by:                  String,
  pub created_by_type:             String,
  pub species_type:                String,
  pub species_health_record_id:    String,
  pub species_health_record_model: String,
  pub visit_date:                  String,
  pub created_at:                  String,
}

impl RawCommonRecord {
  pub const COLUMNS: &'static str = "record_id, pet_id, created_by, created_by_type, \
     species_type, species_health_record_id, species_health_record_model, visit_date, \
     created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:                   row.get(0)?,
      pet_id:                      row.get(1)?,
      created_by:                  row.get(2)?,
      created_by_type:             row.get(3)?,
      species_type:                row.get(4)?,
      species_health_record_id:    row.get(5)?,
      species_health_record_model: row.get(6)?,
      visit_date:                  row.get(7)?,
      created_at:                  row.get(8)?,
    })
  }

  pub fn into_common(self) -> Result<CommonHealthRecord> {
    Ok(CommonHealthRecord {
      record_id:       decode_uuid(&self.record_id)?,
      pet_id:          decode_uuid(&self.pet_id)?,
      created_by:      decode_uuid(&self.created_by)?,
      created_by_type: decode_creator_type(&self.created_by_type)?,
      species_type:    decode_species(&self.species_type)?,
      species_record:  SpeciesRecordRef {
        record_id: decode_uuid(&self.species_health_record_id)?,
        kind:      SpeciesRecordKind::from_discriminant(&self.species_health_record_model)?,
      },
      visit_date:      decode_dt(&self.visit_date)?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}
