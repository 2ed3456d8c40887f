//! Error type for `petvitals-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] petvitals_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {column} value: {value:?}")]
  UnknownValue {
    column: &'static str,
    value:  String,
  },

  /// A write-once trigger rejected an update or delete.
  #[error("health records are immutable")]
  Immutable,

  /// An envelope named a detail record that does not exist.
  #[error("referenced species health record does not exist")]
  DanglingReference,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
