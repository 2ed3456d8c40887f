//! SQLite backend for petvitals health records.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Write-once and detail-before-envelope
//! are enforced by the schema itself, not only by the code that calls it.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
