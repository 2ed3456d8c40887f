//! Bounded exponential backoff.
//!
//! The wait after a failed attempt `n` (counting from 0) is
//! `unit * 2^n + jitter`, with `jitter` drawn uniformly from `[0, unit)`.
//! Because the jitter never reaches a whole unit, each wait is strictly
//! longer than the one before it.

use std::{future::Future, time::Duration};

use rand_core::{OsRng, RngCore as _};

/// Default number of attempts, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default backoff unit.
pub const DEFAULT_UNIT: Duration = Duration::from_millis(1_000);

/// How often and how patiently an operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, the first one included. Zero behaves like one.
  pub max_attempts: u32,
  /// Base time unit the exponential backoff is scaled by.
  pub unit:         Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_attempts: DEFAULT_MAX_ATTEMPTS, unit: DEFAULT_UNIT }
  }
}

/// Handed to the observer before each backoff sleep.
#[derive(Debug)]
pub struct RetryEvent<'a, E> {
  /// The attempt that just failed, counting from 0.
  pub attempt: u32,
  /// How long the policy will wait before the next attempt.
  pub delay:   Duration,
  pub error:   &'a E,
}

impl RetryPolicy {
  pub fn new(max_attempts: u32, unit: Duration) -> Self {
    Self { max_attempts, unit }
  }

  /// Backoff before the attempt following `attempt`.
  pub fn delay(&self, attempt: u32) -> Duration {
    let base = self.unit.saturating_mul(2u32.saturating_pow(attempt));
    base.saturating_add(self.jitter())
  }

  fn jitter(&self) -> Duration {
    let span = u64::try_from(self.unit.as_nanos()).unwrap_or(u64::MAX);
    if span == 0 {
      return Duration::ZERO;
    }
    Duration::from_nanos(OsRng.next_u64() % span)
  }

  /// Run `op` until it succeeds, fails with an error `retryable` rejects,
  /// or the attempt budget is spent. The last error is returned unchanged.
  ///
  /// `op` receives the attempt number. `observe` is called once per retry,
  /// before the sleep.
  pub async fn run<T, E, Op, Fut, P, O>(
    &self,
    mut op: Op,
    retryable: P,
    mut observe: O,
  ) -> Result<T, E>
  where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    O: FnMut(RetryEvent<'_, E>),
  {
    let budget = self.max_attempts.max(1);
    let mut attempt = 0;
    loop {
      let error = match op(attempt).await {
        Ok(value) => return Ok(value),
        Err(error) => error,
      };
      if attempt + 1 >= budget || !retryable(&error) {
        return Err(error);
      }
      let delay = self.delay(attempt);
      observe(RetryEvent { attempt, delay, error: &error });
      tokio::time::sleep(delay).await;
      attempt += 1;
    }
  }
}
