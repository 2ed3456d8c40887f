//! Error types for `petvitals-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::pet::Species;

#[derive(Debug, Error)]
pub enum Error {
  #[error("pet not found: {0}")]
  PetNotFound(Uuid),

  #[error("pet {pet_id} is a {pet_species}, not a {requested}")]
  SpeciesMismatch {
    pet_id:      Uuid,
    pet_species: Species,
    requested:   Species,
  },

  #[error("health record not found: {0}")]
  RecordNotFound(Uuid),

  #[error("{kind} {record_id} referenced by health record {common_record_id} not found")]
  SpeciesRecordNotFound {
    common_record_id: Uuid,
    record_id:        Uuid,
    kind:             &'static str,
  },

  #[error("unknown species record discriminator: {0:?}")]
  UnknownRecordKind(String),

  #[error("discriminator {kind} does not resolve against species {species}")]
  DiscriminatorMismatch {
    species: &'static str,
    kind:    &'static str,
  },

  /// The species detail record was written but its envelope was not.
  #[error("species record {species_record_id} stored without envelope: {source}")]
  PartialPersistence {
    species_record_id: Uuid,
    #[source]
    source:            Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::PetNotFound(_)
        | Self::RecordNotFound(_)
        | Self::SpeciesRecordNotFound { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
