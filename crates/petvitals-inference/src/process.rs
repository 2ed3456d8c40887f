//! [`ProcessEngine`]: one subprocess per inference call.

use std::{
  collections::HashMap, future::Future, path::PathBuf, process::Stdio, time::Duration,
};

use petvitals_core::{
  engine::{EngineOutput, EnginePayload, InferenceEngine, InferenceError},
  observation::HealthObservation,
  pet::Species,
  prediction::PredictionResult,
};
use serde::Deserialize;
use tokio::{
  io::{AsyncReadExt as _, AsyncWriteExt as _},
  time::Instant,
};

fn default_timeout_secs() -> u64 { 60 }

/// How to launch the engine for one species.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSpec {
  pub command:       PathBuf,
  #[serde(default)]
  pub args:          Vec<String>,
  #[serde(default)]
  pub working_dir:   Option<PathBuf>,
  pub model_version: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:  u64,
}

impl EngineSpec {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

/// Spawns the configured engine for each call. No process outlives the call
/// that started it: the child is killed on timeout and when the call's
/// future is dropped.
#[derive(Debug, Clone, Default)]
pub struct ProcessEngine {
  engines: HashMap<Species, EngineSpec>,
}

impl ProcessEngine {
  pub fn new(engines: HashMap<Species, EngineSpec>) -> Self { Self { engines } }

  pub fn with_engine(mut self, species: Species, spec: EngineSpec) -> Self {
    self.engines.insert(species, spec);
    self
  }

  pub fn supports(&self, species: Species) -> bool { self.engines.contains_key(&species) }

  async fn run(
    &self,
    species: Species,
    observation: &HealthObservation,
  ) -> Result<PredictionResult, InferenceError> {
    let spec = self
      .engines
      .get(&species)
      .ok_or(InferenceError::Unsupported(species))?;

    let encode_failed = |e: serde_json::Error| InferenceError::Protocol {
      reason: format!("failed to encode payload: {e}"),
      stdout: String::new(),
    };
    let payload = EnginePayload::from_observation(observation).map_err(encode_failed)?;
    let mut input = serde_json::to_vec(&payload).map_err(encode_failed)?;
    input.push(b'\n');

    let mut cmd = tokio::process::Command::new(&spec.command);
    cmd.args(&spec.args);
    if let Some(dir) = &spec.working_dir {
      cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let started = Instant::now();
    let mut child = cmd
      .spawn()
      .map_err(|e| InferenceError::ProcessSpawn(format!("{}: {e}", spec.command.display())))?;
    tracing::debug!(%species, pid = ?child.id(), "spawned inference engine");

    let stdin = child.stdin.take();
    let mut stdout = child
      .stdout
      .take()
      .ok_or_else(|| InferenceError::ProcessSpawn("stdout not captured".to_owned()))?;
    let mut stderr = child
      .stderr
      .take()
      .ok_or_else(|| InferenceError::ProcessSpawn("stderr not captured".to_owned()))?;

    let timeout = spec.timeout();
    // Input is fed while output is drained, so neither side can stall on a
    // full pipe. Dropping `stdin` after the write closes the engine's input.
    let feed = async move {
      let Some(mut stdin) = stdin else { return };
      // An engine that exits without reading is reported by its exit status.
      if let Err(e) = stdin.write_all(&input).await {
        tracing::debug!(%species, error = %e, "engine closed stdin early");
      }
    };
    let outcome = tokio::time::timeout(timeout, async {
      let mut out = Vec::new();
      let mut err = Vec::new();
      let ((), out_res, err_res, status) = tokio::join!(
        feed,
        stdout.read_to_end(&mut out),
        stderr.read_to_end(&mut err),
        child.wait()
      );
      if let Err(e) = out_res.and(err_res) {
        tracing::debug!(%species, error = %e, "error reading engine output");
      }
      (status, out, err)
    })
    .await;

    let (status, stdout, stderr) = match outcome {
      Ok(done) => done,
      Err(_) => {
        let _ = child.kill().await;
        tracing::warn!(%species, ?timeout, "inference engine timed out; killed");
        return Err(InferenceError::Timeout(timeout));
      }
    };
    let status = status.map_err(|e| InferenceError::ProcessSpawn(e.to_string()))?;
    let stderr = String::from_utf8_lossy(&stderr).into_owned();

    tracing::info!(
      %species,
      exit_code = ?status.code(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "inference engine exited"
    );

    if !status.success() {
      return Err(InferenceError::Process { exit_code: status.code(), stderr });
    }
    if !stderr.trim().is_empty() {
      tracing::debug!(%species, stderr = %stderr.trim(), "inference engine stderr");
    }

    let output = EngineOutput::parse(&stdout)?;
    output.into_prediction(species, &spec.model_version)
  }
}

impl InferenceEngine for ProcessEngine {
  fn predict<'a>(
    &'a self,
    species: Species,
    observation: &'a HealthObservation,
  ) -> impl Future<Output = Result<PredictionResult, InferenceError>> + Send + 'a {
    async move {
      let result = self.run(species, observation).await;
      if let Err(e) = &result {
        tracing::warn!(%species, kind = e.kind(), error = %e, "inference failed");
      }
      result
    }
  }
}

#[cfg(test)]
mod tests {
  use petvitals_core::{
    observation::{
      Aggression, Appetite, CoatCondition, EnergyLevel, HydrationStatus,
      MucousMembraneColor,
    },
    prediction::HealthStatus,
  };

  use super::*;

  fn observation() -> HealthObservation {
    HealthObservation {
      breed:                    "Persian".into(),
      age_in_months:            24.0,
      weight_kg:                4.2,
      temperature:              38.5,
      heart_rate:               150.0,
      respiratory_rate:         30.0,
      blood_pressure_systolic:  120.0,
      blood_pressure_diastolic: 80.0,
      body_condition_score:     5.0,
      hydration_status:         HydrationStatus::Normal,
      mucous_membrane_color:    MucousMembraneColor::Pink,
      coat_condition:           CoatCondition::Healthy,
      appetite:                 Appetite::Normal,
      energy_level:             EnergyLevel::Normal,
      aggression:               Aggression::None,
      vomiting:                 false,
      diarrhea:                 false,
      coughing:                 false,
      limping:                  false,
      allergies:                Vec::new(),
      chronic_conditions:       Vec::new(),
      prescriptions:            Vec::new(),
      vaccinations:             Vec::new(),
    }
  }

  fn sh(script: &str) -> EngineSpec {
    EngineSpec {
      command:       "sh".into(),
      args:          vec!["-c".into(), script.into()],
      working_dir:   None,
      model_version: "cat-v1".into(),
      timeout_secs:  5,
    }
  }

  fn cat_engine(script: &str) -> ProcessEngine {
    ProcessEngine::default().with_engine(Species::Cat, sh(script))
  }

  const HEALTHY: &str = r#"{"success":true,"status":"Healthy","confidence_scores":{"Healthy":0.9,"At Risk":0.07,"Unhealthy":0.03},"diagnosis_text":"No significant findings","treatment_text":"Routine check-up","prescriptions":[],"prediction_timestamp":"2026-01-01T00:00:00"}"#;

  #[tokio::test]
  async fn success_reads_payload_and_normalises_output() {
    let script = format!(
      r#"read line; case "$line" in *'"breed":"Persian"'*'"vaccinations":"[]"'*) echo '{HEALTHY}';; *) exit 9;; esac"#
    );
    let prediction = cat_engine(&script)
      .predict(Species::Cat, &observation())
      .await
      .unwrap();

    assert_eq!(prediction.predicted_status, HealthStatus::Healthy);
    assert_eq!(prediction.confidence_scores.at_risk, 0.07);
    assert_eq!(prediction.model_version, "cat-v1");
    assert_eq!(prediction.species, Species::Cat);
  }

  #[tokio::test]
  async fn nonzero_exit_carries_stderr() {
    let err = cat_engine("cat >/dev/null; echo 'model file missing' >&2; exit 3")
      .predict(Species::Cat, &observation())
      .await
      .unwrap_err();

    let InferenceError::Process { exit_code, stderr } = &err else {
      panic!("expected process error, got {err:?}");
    };
    assert_eq!(*exit_code, Some(3));
    assert!(stderr.contains("model file missing"));
    assert_eq!(err.kind(), "InferenceProcessError");
  }

  #[tokio::test]
  async fn unparseable_output_is_protocol_error() {
    let err = cat_engine("cat >/dev/null; echo 'Loading model...'")
      .predict(Species::Cat, &observation())
      .await
      .unwrap_err();

    let InferenceError::Protocol { stdout, .. } = &err else {
      panic!("expected protocol error, got {err:?}");
    };
    assert!(stdout.contains("Loading model"));
  }

  #[tokio::test]
  async fn failure_flag_is_logic_error() {
    let err = cat_engine(r#"cat >/dev/null; echo '{"success":false,"error":"feature mismatch"}'"#)
      .predict(Species::Cat, &observation())
      .await
      .unwrap_err();

    assert!(matches!(err, InferenceError::Logic(ref m) if m == "feature mismatch"));
  }

  #[tokio::test]
  async fn missing_binary_is_spawn_error() {
    let engine = ProcessEngine::default().with_engine(Species::Cat, EngineSpec {
      command: "/nonexistent/petvitals-engine".into(),
      ..sh("")
    });
    let err = engine.predict(Species::Cat, &observation()).await.unwrap_err();
    assert_eq!(err.kind(), "ProcessSpawnError");
  }

  #[tokio::test]
  async fn slow_engine_times_out() {
    let engine = ProcessEngine::default().with_engine(Species::Cat, EngineSpec {
      timeout_secs: 1,
      ..sh("exec sleep 30")
    });
    let started = std::time::Instant::now();
    let err = engine.predict(Species::Cat, &observation()).await.unwrap_err();

    assert!(matches!(err, InferenceError::Timeout(d) if d == Duration::from_secs(1)));
    assert!(started.elapsed() < Duration::from_secs(10));
  }

  fn oversized_observation() -> HealthObservation {
    HealthObservation {
      allergies: (0..8_192).map(|i| format!("allergen-{i:058}")).collect(),
      ..observation()
    }
  }

  #[tokio::test]
  async fn timeout_covers_an_engine_that_never_reads() {
    let engine = ProcessEngine::default().with_engine(Species::Cat, EngineSpec {
      timeout_secs: 1,
      ..sh("exec sleep 30")
    });
    let started = std::time::Instant::now();
    let outcome = tokio::time::timeout(
      Duration::from_secs(8),
      engine.predict(Species::Cat, &oversized_observation()),
    )
    .await
    .expect("predict should resolve once the engine timeout fires");

    assert!(matches!(outcome, Err(InferenceError::Timeout(d)) if d == Duration::from_secs(1)));
    assert!(started.elapsed() < Duration::from_secs(8));
  }

  #[tokio::test]
  async fn engine_echoing_large_input_to_stderr_does_not_deadlock() {
    let script = format!("cat >&2; echo '{HEALTHY}'");
    let prediction = tokio::time::timeout(
      Duration::from_secs(8),
      cat_engine(&script).predict(Species::Cat, &oversized_observation()),
    )
    .await
    .expect("engine output should be drained while input is written")
    .unwrap();

    assert_eq!(prediction.predicted_status, HealthStatus::Healthy);
  }

  #[tokio::test]
  async fn unconfigured_species_is_unsupported() {
    let err = cat_engine("true")
      .predict(Species::Dog, &observation())
      .await
      .unwrap_err();
    assert!(matches!(err, InferenceError::Unsupported(Species::Dog)));
  }
}
