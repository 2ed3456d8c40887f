//! Orphan sweep for detail records whose envelope was never written.
//!
//! An orphan is only eligible once it is older than the grace period, so a
//! detail record whose envelope write is still in flight is never touched.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{Error, Result, store::HealthRecordStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
  pub examined: usize,
  pub removed:  usize,
}

/// Remove detail records older than `now - grace` that no envelope
/// references.
pub async fn sweep_orphans<S: HealthRecordStore>(
  store: &S,
  grace: Duration,
  now: DateTime<Utc>,
) -> Result<SweepReport> {
  let cutoff = now - grace;
  let candidates = store
    .find_orphan_species_records(cutoff)
    .await
    .map_err(Error::store)?;

  let mut report = SweepReport { examined: candidates.len(), removed: 0 };
  for reference in candidates {
    // Re-checked by the store; an envelope may have landed since the scan.
    if store
      .remove_orphan_species_record(reference)
      .await
      .map_err(Error::store)?
    {
      tracing::info!(
        species_record_id = %reference.record_id,
        kind = %reference.kind,
        "removed orphaned species record"
      );
      report.removed += 1;
    }
  }

  if report.examined > 0 {
    tracing::info!(examined = report.examined, removed = report.removed, "orphan sweep finished");
  }
  Ok(report)
}
