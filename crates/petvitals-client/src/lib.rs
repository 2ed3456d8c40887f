//! Caller-side access to the petvitals API.
//!
//! [`ResilientClient`] wraps every HTTP call in a [`RetryPolicy`] so a busy
//! or restarting server (`429`, `5xx`) is ridden out with exponential
//! backoff, while genuine rejections come back immediately.

pub mod client;
pub mod retry;

pub use client::{
  AnalysisRequest, ClientConfig, ClientError, ResilientClient, RetryNotice,
};
pub use retry::{RetryEvent, RetryPolicy};
