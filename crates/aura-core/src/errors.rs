//! Error types for lowering and backend emission.

use thiserror::Error;

/// Errors raised while lowering a resolved program.
///
/// A resolved program always lowers; seeing one of these means an earlier
/// stage let an inconsistent program through.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoweringError {
    #[error("cannot lower {node}: {reason}")]
    Node { node: String, reason: String },
}

impl LoweringError {
    pub(crate) fn node(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Node {
            node: node.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by a [`crate::backend::Backend`] while rendering.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EmitError {
    /// The program uses a value the backend has no rendering for.
    #[error("{backend} backend does not support {what} '{value}'")]
    Unsupported {
        backend: &'static str,
        what: &'static str,
        value: String,
    },

    #[error("formatting failed: {0}")]
    Format(#[from] std::fmt::Error),
}
