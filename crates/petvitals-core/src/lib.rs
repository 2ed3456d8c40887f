//! Core types and trait definitions for the petvitals health-analysis
//! pipeline.
//!
//! This crate is deliberately free of HTTP, process and database
//! dependencies. The inference engine and the record store are reached
//! through the [`engine::InferenceEngine`] and [`store::HealthRecordStore`]
//! traits; everything else here is pure.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod engine;
pub mod error;
pub mod forms;
pub mod mapper;
pub mod observation;
pub mod pet;
pub mod prediction;
pub mod reader;
pub mod reconcile;
pub mod record;
pub mod store;
pub mod validate;
pub mod writer;

pub use error::{Error, Result};

#[cfg(test)]
pub(crate) mod testing;
