//! Error types for parsing.

use std::fmt;

use thiserror::Error;

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Source range with inclusive start and end positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceRange {
    pub(crate) fn from_span(span: pest::Span<'_>) -> Self {
        let (start_line, start_col) = span.start_pos().line_col();
        let (end_line, end_col) = span.end_pos().line_col();
        Self {
            start: SourcePosition {
                line: start_line as u32,
                column: start_col as u32,
            },
            end: SourcePosition {
                line: end_line as u32,
                column: end_col as u32,
            },
        }
    }
}

pub(crate) const HINT_BLOCK: &str =
    "check indentation (block bodies need two spaces) or a missing `end`";
pub(crate) const HINT_MISSING_END: &str =
    "a block opened with `do` was never closed; add `end` on its own line";
pub(crate) const HINT_EMPTY_BLOCK: &str =
    "empty block: add at least one indented line between `do` and `end`";

/// A syntax error with the furthest matched position and the alternatives the
/// grammar would have accepted there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub location: SourcePosition,
    pub expected: Vec<String>,
    pub hint: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error at {}", self.location)?;
        if !self.expected.is_empty() {
            write!(f, ": expected {}", self.expected.join(" or "))?;
        }
        write!(f, " (hint: {})", self.hint)
    }
}

/// Errors that can occur while turning source text into a CST.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrontendError {
    /// Source text does not match the grammar.
    #[error("parse error: {0}")]
    Syntax(SyntaxError),

    /// The grammar matched but produced a tree the builders do not recognise.
    #[error("internal parse error: {0}")]
    Internal(String),
}

impl FrontendError {
    /// Returns the syntax error details if present.
    pub fn syntax_error(&self) -> Option<&SyntaxError> {
        match self {
            Self::Syntax(err) => Some(err),
            _ => None,
        }
    }
}
