//! The `HealthRecordStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `petvitals-store-sqlite`). The writer, reader and reconciliation sweep
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  pet::PetProfile,
  record::{
    CommonHealthRecord, NewCommonRecord, NewSpeciesRecord, SpeciesHealthRecord,
    SpeciesRecordRef,
  },
};

/// Abstraction over a health-record backend plus the read-only pet
/// collaborator.
///
/// Record writes are append-only. There is no update path, and the only
/// delete is for detail records that no envelope references.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait HealthRecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Pet collaborator ──────────────────────────────────────────────────

  /// Resolve a pet by id. Returns `None` if not found.
  fn find_pet(
    &self,
    pet_id: Uuid,
  ) -> impl Future<Output = Result<Option<PetProfile>, Self::Error>> + Send + '_;

  // ── Append-only writes ────────────────────────────────────────────────

  /// Persist a species detail record. The id and `created_at` are assigned
  /// by the store.
  fn insert_species_record(
    &self,
    input: NewSpeciesRecord,
  ) -> impl Future<Output = Result<SpeciesHealthRecord, Self::Error>> + Send + '_;

  /// Persist an envelope. The referenced detail record must already exist;
  /// backends reject the write otherwise.
  fn insert_common_record(
    &self,
    input: NewCommonRecord,
  ) -> impl Future<Output = Result<CommonHealthRecord, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn get_common_record(
    &self,
    record_id: Uuid,
  ) -> impl Future<Output = Result<Option<CommonHealthRecord>, Self::Error>> + Send + '_;

  /// Follow a polymorphic reference to the table its discriminator names.
  fn get_species_record(
    &self,
    reference: SpeciesRecordRef,
  ) -> impl Future<Output = Result<Option<SpeciesHealthRecord>, Self::Error>> + Send + '_;

  /// Envelopes for `pet_id`, newest visit first, at most `limit` of them.
  fn list_common_records(
    &self,
    pet_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<CommonHealthRecord>, Self::Error>> + Send + '_;

  // ── Reconciliation ────────────────────────────────────────────────────

  /// Detail records created before `created_before` that no envelope
  /// references.
  fn find_orphan_species_records(
    &self,
    created_before: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<SpeciesRecordRef>, Self::Error>> + Send + '_;

  /// Delete a detail record if it is still unreferenced. Returns whether a
  /// record was removed.
  fn remove_orphan_species_record(
    &self,
    reference: SpeciesRecordRef,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
