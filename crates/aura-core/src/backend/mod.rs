//! Backends render an [`EmittedProgram`] for a specific target runtime.

mod pytorch;

pub use pytorch::PyTorchFlaskBackend;

pub use crate::errors::EmitError;
use crate::lower::EmittedProgram;

/// A target runtime renderer.
pub trait Backend {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Renders `program` as source text for this backend.
    fn emit(&self, program: &EmittedProgram) -> Result<String, EmitError>;
}
