//! # Aura Core
//!
//! Compiler pipeline for the Aura DSL: parse, transform, resolve, lower, and
//! optionally render through a [`Backend`].
//!
//! ```ignore
//! use aura_core::{backend::PyTorchFlaskBackend, compile, Compiler, CompilerConfig};
//!
//! let program = compile(source)?;
//! let python = Compiler::default()
//!     .compile_to_source(source, &PyTorchFlaskBackend)?
//!     .source;
//! ```

pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod lower;

// Re-export commonly used types
pub use backend::{Backend, PyTorchFlaskBackend};
pub use config::CompilerConfig;
pub use diagnostics::{render_diagnostic, CompileError, CompileState, ErrorKind, Stage, Warning};
pub use errors::{EmitError, LoweringError};
pub use lower::{lower_program, EmittedProgram};

use aura_frontend::parse_with_recovery;
use aura_ir::{resolve_program, transform_program};

/// Output of a successful [`Compiler::compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    pub program: EmittedProgram,
    /// Set when recovery changed the source before it parsed.
    pub warnings: Vec<Warning>,
    /// States the compile went through, starting at [`CompileState::Source`].
    pub trace: Vec<CompileState>,
}

/// Output of a successful [`Compiler::compile_to_source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendering {
    /// Text produced by the backend.
    pub source: String,
    pub warnings: Vec<Warning>,
    /// Compile states, ending at [`CompileState::Emitted`].
    pub trace: Vec<CompileState>,
}

/// Runs the pipeline with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles `source` into emitted actions.
    pub fn compile(&self, source: &str) -> Result<Compilation, CompileError> {
        let mut trace = vec![CompileState::Source];

        let parsed = parse_with_recovery(source, self.config.recovery)?;
        trace.push(CompileState::Parsed);
        let warnings: Vec<Warning> = parsed.repair.iter().map(Warning::from).collect();

        let ir = transform_program(&parsed.cst, &self.config.defaults)?;
        trace.push(CompileState::Validated);

        let resolved = resolve_program(ir).map_err(CompileError::resolving)?;
        trace.push(CompileState::Resolved);

        let program = lower_program(&resolved)?;
        trace.push(CompileState::Lowered);

        tracing::debug!(
            models = program.models.len(),
            routes = program.routes.len(),
            warnings = warnings.len(),
            "compiled program"
        );
        Ok(Compilation {
            program,
            warnings,
            trace,
        })
    }

    /// Compiles `source` and renders it with `backend`.
    pub fn compile_to_source(
        &self,
        source: &str,
        backend: &dyn Backend,
    ) -> Result<Rendering, CompileError> {
        let Compilation {
            program,
            warnings,
            mut trace,
        } = self.compile(source)?;
        let text = backend.emit(&program)?;
        trace.push(CompileState::Emitted);
        tracing::debug!(backend = backend.name(), bytes = text.len(), "emitted source");
        Ok(Rendering {
            source: text,
            warnings,
            trace,
        })
    }
}

/// Compiles `source` with the default configuration.
pub fn compile(source: &str) -> Result<EmittedProgram, CompileError> {
    Compiler::default()
        .compile(source)
        .map(|compilation| compilation.program)
}
