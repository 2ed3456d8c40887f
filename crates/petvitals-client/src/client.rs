//! Async HTTP client for the petvitals JSON API.
//!
//! Every call goes through the same [`RetryPolicy`]: `429` and `5xx`
//! responses are retried with backoff, any other non-success status is
//! returned at once with the server's body attached.

use std::{sync::Arc, time::Duration};

use petvitals_core::pet::Species;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::retry::RetryPolicy;

/// Header the server reads the creator id from.
pub const CREATOR_HEADER: &str = "x-creator-id";

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
  /// `429` or `5xx`, still failing once the retry budget was spent.
  #[error("server unavailable ({status}): {body}")]
  Retryable { status: StatusCode, body: String },

  /// Any other non-success status. Never retried.
  #[error("request rejected ({status}): {body}")]
  Rejected { status: StatusCode, body: String },

  #[error("transport error: {0}")]
  Transport(#[source] reqwest::Error),

  #[error("could not decode response: {0}")]
  Decode(#[source] reqwest::Error),
}

impl ClientError {
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::Retryable { .. })
  }

  /// HTTP status, when the server answered at all.
  pub fn status(&self) -> Option<StatusCode> {
    match self {
      Self::Retryable { status, .. } | Self::Rejected { status, .. } => {
        Some(*status)
      }
      Self::Transport(_) | Self::Decode(_) => None,
    }
  }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

fn retryable_status(status: StatusCode) -> bool {
  status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// The response text, or a note saying why it could not be read.
async fn read_body(resp: reqwest::Response) -> String {
  match resp.text().await {
    Ok(body) => body,
    Err(e) => format!("<body unreadable: {e}>"),
  }
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Connection settings for the petvitals API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub base_url:   String,
  /// Sent as `x-creator-id` on every attempt when set.
  pub creator_id: Option<Uuid>,
  pub retry:      RetryPolicy,
  /// Per-attempt request timeout.
  pub timeout:    Duration,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url:   "http://localhost:8080".to_string(),
      creator_id: None,
      retry:      RetryPolicy::default(),
      timeout:    Duration::from_secs(90),
    }
  }
}

/// What a caller-supplied observer learns about each retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryNotice {
  pub attempt: u32,
  pub delay:   Duration,
  pub status:  Option<StatusCode>,
}

type RetryObserver = Arc<dyn Fn(RetryNotice) + Send + Sync>;

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
  pub pet_id:     Uuid,
  pub pet_name:   String,
  pub species:    Species,
  /// The observation, passed through as-is so the server does the
  /// validation.
  pub input_data: Value,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Retrying client for the petvitals API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ResilientClient {
  client:   Client,
  config:   ClientConfig,
  observer: Option<RetryObserver>,
}

impl ResilientClient {
  pub fn new(config: ClientConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(ClientError::Transport)?;
    Ok(Self { client, config, observer: None })
  }

  /// Register a callback invoked before every backoff sleep.
  pub fn on_retry(mut self, f: impl Fn(RetryNotice) + Send + Sync + 'static) -> Self {
    self.observer = Some(Arc::new(f));
    self
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn prepare(&self, req: RequestBuilder) -> RequestBuilder {
    match self.config.creator_id {
      Some(id) => req.header(CREATOR_HEADER, id.to_string()),
      None => req,
    }
  }

  /// One attempt: send, then sort the response into success or a
  /// retryable or terminal failure.
  async fn exchange<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let resp = req.send().await.map_err(ClientError::Transport)?;
    let status = resp.status();
    if status.is_success() {
      return resp.json().await.map_err(ClientError::Decode);
    }
    let body = read_body(resp).await;
    if retryable_status(status) {
      Err(ClientError::Retryable { status, body })
    } else {
      Err(ClientError::Rejected { status, body })
    }
  }

  /// Issue the request built by `build` under the retry policy. `build` is
  /// called once per attempt so every attempt carries identical headers.
  async fn call<T, B>(&self, label: &str, build: B) -> Result<T>
  where
    T: DeserializeOwned,
    B: Fn(&Client) -> RequestBuilder,
  {
    self
      .config
      .retry
      .run(
        |_| Self::exchange::<T>(self.prepare(build(&self.client))),
        ClientError::is_retryable,
        |event| {
          let status = event.error.status();
          warn!(
            request = label,
            attempt = event.attempt,
            delay_ms = event.delay.as_millis() as u64,
            status = status.map(|s| s.as_u16()),
            "retrying request"
          );
          if let Some(observer) = &self.observer {
            observer(RetryNotice { attempt: event.attempt, delay: event.delay, status });
          }
        },
      )
      .await
  }

  // ── Analysis ──────────────────────────────────────────────────────────────

  /// `POST /analyze`
  pub async fn analyze(&self, request: &AnalysisRequest) -> Result<Value> {
    let url = self.url("/analyze");
    self
      .call("POST /analyze", |c| c.post(&url).json(request))
      .await
  }

  // ── Records ───────────────────────────────────────────────────────────────

  /// `GET /health-records/pet/{pet_id}[?limit=n]`
  pub async fn list_records(&self, pet_id: Uuid, limit: Option<usize>) -> Result<Value> {
    let url = self.url(&format!("/health-records/pet/{pet_id}"));
    self
      .call("GET /health-records/pet", |c| {
        let req = c.get(&url);
        match limit {
          Some(n) => req.query(&[("limit", n)]),
          None => req,
        }
      })
      .await
  }

  /// `GET /health-records/{record_id}`
  pub async fn get_record(&self, record_id: Uuid) -> Result<Value> {
    let url = self.url(&format!("/health-records/{record_id}"));
    self.call("GET /health-records", |c| c.get(&url)).await
  }

  // ── Forms ─────────────────────────────────────────────────────────────────

  /// `GET /form-definitions?species=<species>`
  pub async fn form_definitions(&self, species: Species) -> Result<Value> {
    let url = self.url("/form-definitions");
    self
      .call("GET /form-definitions", |c| {
        c.get(&url).query(&[("species", species.as_ref())])
      })
      .await
  }
}
