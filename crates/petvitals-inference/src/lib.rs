//! InferenceGateway implementations.
//!
//! [`ProcessEngine`] runs one fresh engine process per call and speaks the
//! JSON-over-stdio protocol defined in [`petvitals_core::engine`].
//! [`InProcessEngine`] feeds the same payload to a closure instead. Both
//! normalise through [`EngineOutput::into_prediction`], so callers cannot
//! tell them apart.
//!
//! [`EngineOutput::into_prediction`]: petvitals_core::engine::EngineOutput::into_prediction

mod in_process;
mod process;

pub use in_process::InProcessEngine;
pub use process::{EngineSpec, ProcessEngine};
