//! RecordReader: envelope listings and envelope+detail lookups.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  pet::{PetProfile, Species},
  record::{CommonHealthRecord, CreatorType, SpeciesHealthRecord},
  store::HealthRecordStore,
};

/// Upper bound on one page of [`RecordReader::list_by_pet`].
pub const MAX_PAGE: usize = 100;

pub const DIAGNOSIS_PLACEHOLDER: &str = "Error loading diagnosis";
pub const TREATMENT_PLACEHOLDER: &str = "Error loading treatment";

/// One row of a pet's analysis history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummary {
  #[serde(rename = "commonRecordId")]
  pub common_record_id:  Uuid,
  #[serde(rename = "speciesRecordId")]
  pub species_record_id: Uuid,
  #[serde(rename = "visitDate")]
  pub visit_date:        DateTime<Utc>,
  pub created_by_type:   CreatorType,
  pub species_type:      Species,
  pub diagnosis:         String,
  pub treatment:         String,
  /// Set when the detail record could not be resolved and the text fields
  /// hold placeholders.
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub degraded:          bool,
}

/// An envelope together with the detail record it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRecordDetail {
  #[serde(rename = "commonRecord")]
  pub common_record:  CommonHealthRecord,
  #[serde(rename = "speciesRecord")]
  pub species_record: SpeciesHealthRecord,
  #[serde(rename = "petInfo", skip_serializing_if = "Option::is_none")]
  pub pet:            Option<PetProfile>,
}

pub struct RecordReader<S> {
  store: Arc<S>,
}

impl<S> Clone for RecordReader<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store) }
  }
}

impl<S: HealthRecordStore> RecordReader<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// Summaries for `pet_id`, newest visit first. `limit` is capped at
  /// [`MAX_PAGE`] and defaults to it.
  ///
  /// Each envelope is resolved independently; one that cannot be resolved
  /// degrades to placeholder text instead of failing the whole list.
  pub async fn list_by_pet(
    &self,
    pet_id: Uuid,
    limit: Option<usize>,
  ) -> Result<Vec<RecordSummary>> {
    let limit = limit.unwrap_or(MAX_PAGE).min(MAX_PAGE);
    let mut envelopes = self
      .store
      .list_common_records(pet_id, limit)
      .await
      .map_err(Error::store)?;

    envelopes.sort_by(|a, b| b.visit_date.cmp(&a.visit_date));
    envelopes.truncate(limit);

    Ok(join_all(envelopes.into_iter().map(|e| self.summarise(e))).await)
  }

  async fn summarise(&self, envelope: CommonHealthRecord) -> RecordSummary {
    let resolved = match self.store.get_species_record(envelope.species_record).await {
      Ok(Some(detail)) => Some(detail),
      Ok(None) => {
        tracing::warn!(
          common_record_id = %envelope.record_id,
          species_record_id = %envelope.species_record.record_id,
          "species record missing"
        );
        None
      }
      Err(e) => {
        tracing::warn!(
          common_record_id = %envelope.record_id,
          error = %e,
          "failed to resolve species record"
        );
        None
      }
    };

    let (diagnosis, treatment, degraded) = match resolved {
      Some(detail) => {
        let clinical = detail.clinical();
        (clinical.diagnosis.clone(), clinical.treatment.clone(), false)
      }
      None => (
        DIAGNOSIS_PLACEHOLDER.to_owned(),
        TREATMENT_PLACEHOLDER.to_owned(),
        true,
      ),
    };

    RecordSummary {
      common_record_id: envelope.record_id,
      species_record_id: envelope.species_record.record_id,
      visit_date: envelope.visit_date,
      created_by_type: envelope.created_by_type,
      species_type: envelope.species_type,
      diagnosis,
      treatment,
      degraded,
    }
  }

  /// The envelope `common_record_id` plus its detail record.
  pub async fn get_detail(&self, common_record_id: Uuid) -> Result<HealthRecordDetail> {
    let common_record = self
      .store
      .get_common_record(common_record_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::RecordNotFound(common_record_id))?;

    let reference = common_record.species_record;
    let species_record = self
      .store
      .get_species_record(reference)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SpeciesRecordNotFound {
        common_record_id,
        record_id: reference.record_id,
        kind: reference.kind.discriminant(),
      })?;

    let pet = match self.store.find_pet(common_record.pet_id).await {
      Ok(pet) => pet,
      Err(e) => {
        tracing::warn!(pet_id = %common_record.pet_id, error = %e, "failed to resolve pet");
        None
      }
    };

    Ok(HealthRecordDetail { common_record, species_record, pet })
  }
}
