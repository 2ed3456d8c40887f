//! [`InProcessEngine`]: a closure standing in for the engine process.

use std::future::Future;

use petvitals_core::{
  engine::{EngineOutput, EnginePayload, InferenceEngine, InferenceError},
  observation::HealthObservation,
  pet::Species,
  prediction::PredictionResult,
};

/// Runs `F` on the same payload a process engine would receive and
/// normalises its output the same way.
pub struct InProcessEngine<F> {
  model_version: String,
  score:         F,
}

impl<F> InProcessEngine<F>
where
  F: Fn(Species, &EnginePayload) -> Result<EngineOutput, InferenceError> + Send + Sync,
{
  pub fn new(model_version: impl Into<String>, score: F) -> Self {
    Self { model_version: model_version.into(), score }
  }
}

impl<F> InferenceEngine for InProcessEngine<F>
where
  F: Fn(Species, &EnginePayload) -> Result<EngineOutput, InferenceError> + Send + Sync,
{
  fn predict<'a>(
    &'a self,
    species: Species,
    observation: &'a HealthObservation,
  ) -> impl Future<Output = Result<PredictionResult, InferenceError>> + Send + 'a {
    async move {
      let payload = EnginePayload::from_observation(observation).map_err(|e| {
        InferenceError::Protocol { reason: e.to_string(), stdout: String::new() }
      })?;
      (self.score)(species, &payload)?.into_prediction(species, &self.model_version)
    }
  }
}
