//! The pet collaborator: species and the read-only pet profile.
//!
//! Pet CRUD lives outside this system. The pipeline only ever resolves a pet
//! by id to take a snapshot of it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// The species a pipeline run is scored and stored against.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Species {
  Cat,
  Dog,
}

impl Species {
  pub const ALL: [Species; 2] = [Species::Cat, Species::Dog];

  /// Inclusive body-condition-score scale for the species.
  pub fn body_condition_range(self) -> (u8, u8) {
    match self {
      Self::Cat => (1, 6),
      Self::Dog => (1, 9),
    }
  }
}

/// A pet as returned by the pet collaborator's `findById`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetProfile {
  pub pet_id:        Uuid,
  pub name:          String,
  pub species:       Species,
  pub breed:         Option<String>,
  pub date_of_birth: NaiveDate,
}

/// Input to a backend's pet registration. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPet {
  pub name:          String,
  pub species:       Species,
  #[serde(default)]
  pub breed:         Option<String>,
  pub date_of_birth: NaiveDate,
}
