//! # Aura IR
//!
//! Validated intermediate representation of an Aura program, the transformer
//! that builds it from the CST, and the reference resolver.
//!
//! ## Usage
//!
//! ```ignore
//! use aura_frontend::parse_program;
//! use aura_ir::{resolve_program, transform_program, Defaults};
//!
//! let cst = parse_program(source)?;
//! let ir = transform_program(&cst, &Defaults::default())?;
//! let resolved = resolve_program(ir)?;
//! ```

pub mod defaults;
pub mod errors;
pub mod layer;
pub mod program;
pub mod resolve;
pub mod symbol;
pub mod transform;

pub use defaults::Defaults;
pub use errors::{DeclKind, IrError};
pub use layer::{Activation, Layer};
pub use program::{
    DatasetDecl, DatasetHost, Declaration, EvaluateDecl, HttpMethod, ModelDecl, ModelVariant,
    NameTable, ProgramIR, ResponseFormat, RouteDecl, RunDecl, Split, TrainDecl,
};
pub use resolve::{resolve_program, ResolvedProgram};
pub use symbol::{Interner, Symbol};
pub use transform::transform_program;
