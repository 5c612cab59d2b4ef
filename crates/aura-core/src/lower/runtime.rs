//! Seams to the external tensor runtime.
//!
//! The compiler never runs tensor math. Emitted training and route actions
//! describe what to do; these traits are what a runtime implements so the
//! described behavior (batch back-off, request handling) can be executed.

use thiserror::Error;

/// A failure reported by a runtime collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeFailure {
    /// The device ran out of memory. Training reacts by shrinking the batch.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("{0}")]
    Other(String),
}

/// Runs training epochs for one model.
pub trait TrainingRuntime {
    /// Runs one epoch (1-based) at `batch_size` and returns its mean loss.
    fn run_epoch(&mut self, epoch: u32, batch_size: u32) -> Result<f64, RuntimeFailure>;
}

/// Runs a forward pass of a constructed network model.
pub trait InferenceRuntime {
    /// Returns the output row for a single flattened input row.
    fn forward(&self, model: &str, input: &[f64]) -> Result<Vec<f64>, RuntimeFailure>;
}
