//! [`SqliteStore`]: the SQLite implementation of [`HealthRecordStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use petvitals_core::{
  pet::{NewPet, PetProfile},
  record::{
    CommonHealthRecord, NewCommonRecord, NewSpeciesRecord, SpeciesHealthRecord,
    SpeciesRecordKind, SpeciesRecordRef,
  },
  store::HealthRecordStore,
};

use crate::{
  Error, Result,
  encode::{
    RawCommonRecord, RawPet, RawSpeciesRecord, decode_uuid, detail_table, encode_date,
    encode_dt, encode_metrics, encode_uuid,
  },
  schema::{DANGLING, IMMUTABLE, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A health-record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Register a pet. Pet management otherwise lives outside this store;
  /// this exists for operators and tests.
  pub async fn insert_pet(&self, input: NewPet) -> Result<PetProfile> {
    let pet = PetProfile {
      pet_id:        Uuid::new_v4(),
      name:          input.name,
      species:       input.species,
      breed:         input.breed,
      date_of_birth: input.date_of_birth,
    };

    let id_str      = encode_uuid(pet.pet_id);
    let name        = pet.name.clone();
    let species_str = pet.species.to_string();
    let breed       = pet.breed.clone();
    let dob_str     = encode_date(pet.date_of_birth);
    let at_str      = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pets (pet_id, name, species, breed, date_of_birth, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, species_str, breed, dob_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(pet)
  }

  pub async fn list_pets(&self) -> Result<Vec<PetProfile>> {
    let raws: Vec<RawPet> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT pet_id, name, species, breed, date_of_birth FROM pets ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawPet {
              pet_id:        row.get(0)?,
              name:          row.get(1)?,
              species:       row.get(2)?,
              breed:         row.get(3)?,
              date_of_birth: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPet::into_pet).collect()
  }
}

/// Map trigger aborts onto their domain errors.
fn classify(e: tokio_rusqlite::Error) -> Error {
  if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(_, Some(msg))) = &e {
    if msg.contains(IMMUTABLE) {
      tracing::warn!("rejected write to an immutable health record");
      return Error::Immutable;
    }
    if msg.contains(DANGLING) {
      tracing::warn!("rejected envelope referencing a missing detail record");
      return Error::DanglingReference;
    }
  }
  Error::Database(e)
}

// ─── HealthRecordStore impl ──────────────────────────────────────────────────

impl HealthRecordStore for SqliteStore {
  type Error = Error;

  // ── Pet collaborator ──────────────────────────────────────────────────────

  async fn find_pet(&self, pet_id: Uuid) -> Result<Option<PetProfile>> {
    let id_str = encode_uuid(pet_id);

    let raw: Option<RawPet> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT pet_id, name, species, breed, date_of_birth FROM pets WHERE pet_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawPet {
                pet_id:        row.get(0)?,
                name:          row.get(1)?,
                species:       row.get(2)?,
                breed:         row.get(3)?,
                date_of_birth: row.get(4)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPet::into_pet).transpose()
  }

  // ── Append-only writes ────────────────────────────────────────────────────

  async fn insert_species_record(
    &self,
    input: NewSpeciesRecord,
  ) -> Result<SpeciesHealthRecord> {
    let kind = input.kind();
    let record_id = Uuid::new_v4();
    let created_at = Utc::now();

    let id_str        = encode_uuid(record_id);
    let at_str        = encode_dt(created_at);
    let metrics_json  = encode_metrics(&input.metrics)?;
    let clinical_json = serde_json::to_string(&input.clinical)?;
    let sql = format!(
      "INSERT INTO {} (record_id, created_at, metrics_json, clinical_json)
       VALUES (?1, ?2, ?3, ?4)",
      detail_table(kind)
    );

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params![id_str, at_str, metrics_json, clinical_json])?;
        Ok(())
      })
      .await
      .map_err(classify)?;

    Ok(input.into_record(record_id, created_at))
  }

  async fn insert_common_record(&self, input: NewCommonRecord) -> Result<CommonHealthRecord> {
    input.check_discriminator()?;

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

    let id_str      = encode_uuid(record.record_id);
    let pet_str     = encode_uuid(record.pet_id);
    let by_str      = encode_uuid(record.created_by);
    let by_type     = record.created_by_type.to_string();
    let species_str = record.species_type.to_string();
    let ref_id_str  = encode_uuid(record.species_record.record_id);
    let model       = record.species_record.kind.discriminant();
    let visit_str   = encode_dt(record.visit_date);
    let at_str      = encode_dt(record.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO common_health_records (
             record_id, pet_id, created_by, created_by_type, species_type,
             species_health_record_id, species_health_record_model,
             visit_date, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            pet_str,
            by_str,
            by_type,
            species_str,
            ref_id_str,
            model,
            visit_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(classify)?;

    Ok(record)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_common_record(&self, record_id: Uuid) -> Result<Option<CommonHealthRecord>> {
    let id_str = encode_uuid(record_id);
    let sql = format!(
      "SELECT {} FROM common_health_records WHERE record_id = ?1",
      RawCommonRecord::COLUMNS
    );

    let raw: Option<RawCommonRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawCommonRecord::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCommonRecord::into_common).transpose()
  }

  async fn get_species_record(
    &self,
    reference: SpeciesRecordRef,
  ) -> Result<Option<SpeciesHealthRecord>> {
    let id_str = encode_uuid(reference.record_id);
    let sql = format!(
      "SELECT record_id, created_at, metrics_json, clinical_json FROM {} WHERE record_id = ?1",
      detail_table(reference.kind)
    );

    let raw: Option<RawSpeciesRecord> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(&sql, rusqlite::params![id_str], |row| {
            Ok(RawSpeciesRecord {
              record_id:     row.get(0)?,
              created_at:    row.get(1)?,
              metrics_json:  row.get(2)?,
              clinical_json: row.get(3)?,
            })
          })
          .optional()?)
      })
      .await?;

    raw.map(|r| r.into_record(reference.kind)).transpose()
  }

  async fn list_common_records(
    &self,
    pet_id: Uuid,
    limit: usize,
  ) -> Result<Vec<CommonHealthRecord>> {
    let pet_str = encode_uuid(pet_id);
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);
    let sql = format!(
      "SELECT {} FROM common_health_records
       WHERE pet_id = ?1
       ORDER BY visit_date DESC, created_at DESC, rowid DESC
       LIMIT ?2",
      RawCommonRecord::COLUMNS
    );

    let raws: Vec<RawCommonRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![pet_str, limit_val], RawCommonRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCommonRecord::into_common).collect()
  }

  // ── Reconciliation ────────────────────────────────────────────────────────

  async fn find_orphan_species_records(
    &self,
    created_before: DateTime<Utc>,
  ) -> Result<Vec<SpeciesRecordRef>> {
    let before_str = encode_dt(created_before);

    let raws: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT d.record_id, 'CatHealthRecord' FROM cat_health_records d
            WHERE d.created_at < ?1
              AND NOT EXISTS (
                SELECT 1 FROM common_health_records c
                 WHERE c.species_health_record_model = 'CatHealthRecord'
                   AND c.species_health_record_id = d.record_id)
           UNION ALL
           SELECT d.record_id, 'DogHealthRecord' FROM dog_health_records d
            WHERE d.created_at < ?1
              AND NOT EXISTS (
                SELECT 1 FROM common_health_records c
                 WHERE c.species_health_record_model = 'DogHealthRecord'
                   AND c.species_health_record_id = d.record_id)",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![before_str], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(id, model)| {
        Ok(SpeciesRecordRef {
          record_id: decode_uuid(&id)?,
          kind:      SpeciesRecordKind::from_discriminant(&model)?,
        })
      })
      .collect()
  }

  async fn remove_orphan_species_record(&self, reference: SpeciesRecordRef) -> Result<bool> {
    let id_str = encode_uuid(reference.record_id);
    let model = reference.kind.discriminant();
    let sql = format!(
      "DELETE FROM {} WHERE record_id = ?1
         AND NOT EXISTS (
           SELECT 1 FROM common_health_records
            WHERE species_health_record_model = ?2
              AND species_health_record_id = ?1)",
      detail_table(reference.kind)
    );

    let removed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![id_str, model])?))
      .await
      .map_err(classify)?;

    if removed > 0 {
      tracing::debug!(record_id = %reference.record_id, kind = model, "deleted orphan detail record");
    }
    Ok(removed > 0)
  }
}
