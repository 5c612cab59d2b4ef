//! # Aura Frontend
//!
//! Grammar, concrete syntax tree, and parser for the Aura DSL.

pub mod cst;
pub mod errors;
pub mod parser;
pub mod preprocess;
pub mod repair;

// Re-export commonly used types
pub use cst::*;
pub use errors::{FrontendError, SourcePosition, SourceRange, SyntaxError};
pub use parser::parse_program;
pub use preprocess::strip_comments;
pub use repair::{parse_with_recovery, Parsed, RecoveryMode, Repair};
