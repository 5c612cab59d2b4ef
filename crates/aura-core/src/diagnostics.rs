//! # Diagnostics
//!
//! Every stage error is converted into one [`CompileError`] carrying the stage
//! it came from, a coarse [`ErrorKind`], a message, an optional remediation
//! hint, and the source position when one is known.
//!
//! A compile advances through [`CompileState`]s:
//!
//! ```text
//! Source -> Parsed -> Validated -> Resolved -> Lowered -> Emitted
//! ```
//!
//! and any step may end in `Failed` instead. Nothing is retried except the
//! opt-in parser recovery.

use std::fmt;

use aura_frontend::{FrontendError, Repair, SourcePosition};
use aura_ir::{DeclKind, IrError};
use thiserror::Error;

use crate::errors::{EmitError, LoweringError};

/// Pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Parse,
    Transform,
    Resolve,
    Lower,
    Emit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parse => "parse",
            Self::Transform => "transform",
            Self::Resolve => "resolve",
            Self::Lower => "lower",
            Self::Emit => "emit",
        })
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    DuplicateDeclaration,
    UndefinedReference,
    InvalidValue,
    Lowering,
    Unsupported,
    Internal,
}

/// Where a compile is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileState {
    Source,
    Parsed,
    Validated,
    Resolved,
    Lowered,
    Emitted,
    Failed { stage: Stage, kind: ErrorKind },
}

/// A compile failure, as reported to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{stage} error: {message}")]
pub struct CompileError {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
    pub hint: Option<String>,
    pub location: Option<SourcePosition>,
}

impl CompileError {
    /// The terminal state this error puts a compile in.
    pub fn state(&self) -> CompileState {
        CompileState::Failed {
            stage: self.stage,
            kind: self.kind,
        }
    }

    /// Converts an error raised by the reference resolver. Every such error
    /// belongs to [`Stage::Resolve`], whatever its kind.
    pub(crate) fn resolving(err: IrError) -> Self {
        CompileError {
            stage: Stage::Resolve,
            ..CompileError::from(err)
        }
    }
}

impl From<FrontendError> for CompileError {
    fn from(err: FrontendError) -> Self {
        match err {
            FrontendError::Syntax(syntax) => {
                let message = if syntax.expected.is_empty() {
                    "unexpected input".to_string()
                } else {
                    format!("expected {}", syntax.expected.join(" or "))
                };
                CompileError {
                    stage: Stage::Parse,
                    kind: ErrorKind::Syntax,
                    message,
                    hint: Some(syntax.hint),
                    location: Some(syntax.location),
                }
            }
            other => CompileError {
                stage: Stage::Parse,
                kind: ErrorKind::Internal,
                message: other.to_string(),
                hint: None,
                location: None,
            },
        }
    }
}

impl From<IrError> for CompileError {
    fn from(err: IrError) -> Self {
        let location = err.range().map(|r| r.start);
        let message = err.to_string();
        let (stage, kind, hint) = match &err {
            IrError::DuplicateDeclaration {
                kind: DeclKind::Run,
                ..
            } => (
                Stage::Transform,
                ErrorKind::DuplicateDeclaration,
                Some("remove the extra `run web` line".to_string()),
            ),
            IrError::DuplicateDeclaration { kind, .. } => (
                Stage::Transform,
                ErrorKind::DuplicateDeclaration,
                Some(format!("rename one of the {} declarations", kind)),
            ),
            IrError::UndefinedReference { kind, name, .. } => (
                Stage::Resolve,
                ErrorKind::UndefinedReference,
                Some(format!("declare {} '{}' or fix the name", kind, name)),
            ),
            IrError::InvalidValue { .. } => (Stage::Transform, ErrorKind::InvalidValue, None),
            _ => (Stage::Transform, ErrorKind::Internal, None),
        };
        CompileError {
            stage,
            kind,
            message,
            hint,
            location,
        }
    }
}

impl From<LoweringError> for CompileError {
    fn from(err: LoweringError) -> Self {
        CompileError {
            stage: Stage::Lower,
            kind: ErrorKind::Lowering,
            message: err.to_string(),
            hint: Some("this is a compiler bug; the program passed validation".to_string()),
            location: None,
        }
    }
}

impl From<EmitError> for CompileError {
    fn from(err: EmitError) -> Self {
        let (kind, hint) = match &err {
            EmitError::Unsupported { backend, what, .. } => (
                ErrorKind::Unsupported,
                Some(format!("choose a {} supported by the {} backend", what, backend)),
            ),
            _ => (ErrorKind::Internal, None),
        };
        CompileError {
            stage: Stage::Emit,
            kind,
            message: err.to_string(),
            hint,
            location: None,
        }
    }
}

/// A non-fatal notice attached to a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub location: Option<SourcePosition>,
}

impl From<&Repair> for Warning {
    fn from(repair: &Repair) -> Self {
        let location = repair
            .reindented_lines
            .first()
            .map(|&line| SourcePosition { line, column: 1 });
        Warning {
            message: repair.to_string(),
            location,
        }
    }
}

/// Formats `err` for a terminal, quoting the offending line of `source`.
///
/// ```text
/// error: parse error: expected `end`
///  --> 3:1
///   |
/// 3 | model broken neural_network do
///   | ^
///   = hint: a block opened with `do` was never closed; add `end` on its own line
/// ```
pub fn render_diagnostic(err: &CompileError, source: &str) -> String {
    let mut out = format!("error: {}\n", err);
    if let Some(pos) = err.location {
        let number = pos.line.to_string();
        let gutter = " ".repeat(number.len());
        out.push_str(&format!("{} --> {}\n", gutter, pos));
        if let Some(text) = source.lines().nth(pos.line.saturating_sub(1) as usize) {
            let caret_pad: String = text
                .chars()
                .take(pos.column.saturating_sub(1) as usize)
                .map(|c| if c == '\t' { '\t' } else { ' ' })
                .collect();
            out.push_str(&format!("{} |\n", gutter));
            out.push_str(&format!("{} | {}\n", number, text));
            out.push_str(&format!("{} | {}^\n", gutter, caret_pad));
        }
        if let Some(hint) = &err.hint {
            out.push_str(&format!("{} = hint: {}\n", gutter, hint));
        }
    } else if let Some(hint) = &err.hint {
        out.push_str(&format!("  = hint: {}\n", hint));
    }
    out
}
