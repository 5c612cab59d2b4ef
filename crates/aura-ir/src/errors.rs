//! Error types for semantic transformation and reference resolution.

use std::fmt;

use aura_frontend::SourceRange;
use thiserror::Error;

/// Kind of declaration an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Dataset,
    Model,
    Train,
    Evaluate,
    Route,
    Run,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dataset => "dataset",
            Self::Model => "model",
            Self::Train => "train",
            Self::Evaluate => "evaluate",
            Self::Route => "route",
            Self::Run => "run",
        })
    }
}

/// Errors that can occur while building or resolving the program IR.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IrError {
    /// Two declarations of the same kind share a name.
    #[error("duplicate {kind} declaration '{name}'")]
    DuplicateDeclaration {
        kind: DeclKind,
        name: String,
        range: Option<SourceRange>,
    },

    /// A declaration names a model or dataset that is not declared anywhere.
    #[error("undefined {kind} '{name}' referenced by {referenced_by}")]
    UndefinedReference {
        kind: DeclKind,
        name: String,
        referenced_by: String,
        range: Option<SourceRange>,
    },

    /// A literal is out of range or a body mixes incompatible lines.
    #[error("invalid value in {context}: {message}")]
    InvalidValue {
        context: String,
        message: String,
        range: Option<SourceRange>,
    },
}

impl IrError {
    pub(crate) fn invalid(
        context: impl Into<String>,
        message: impl Into<String>,
        range: SourceRange,
    ) -> Self {
        Self::InvalidValue {
            context: context.into(),
            message: message.into(),
            range: Some(range),
        }
    }

    /// Source range of the offending declaration or token, when known.
    pub fn range(&self) -> Option<SourceRange> {
        match self {
            Self::DuplicateDeclaration { range, .. }
            | Self::UndefinedReference { range, .. }
            | Self::InvalidValue { range, .. } => *range,
        }
    }
}
