//! Forgiveness recovery: one best-effort repair of common structural mistakes.
//!
//! Recovery is opt-in. When enabled and the first parse fails, every body line
//! of an open `do` block that is not indented gets one indentation unit, and
//! a single `end` is appended when the last block was never closed. The
//! repaired text is parsed exactly once; if that also fails the original error
//! is returned. A successful repair is always reported back to the caller,
//! because the repaired program may differ from what the user meant.

use std::fmt;

use crate::cst::ProgramCst;
use crate::errors::FrontendError;
use crate::parser::{opens_block, parse_stripped};
use crate::preprocess::strip_comments;

/// Whether a failed parse may be retried on repaired input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RecoveryMode {
    /// Syntax errors are returned as-is.
    #[default]
    Disabled,
    /// One repair attempt is made before giving up.
    Forgiving,
}

/// Description of the changes a repair made to the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repair {
    /// The repaired (comment-stripped) source that was parsed.
    pub source: String,
    /// 1-based numbers of the lines that were re-indented.
    pub reindented_lines: Vec<u32>,
    /// Whether a trailing `end` was appended.
    pub appended_terminator: bool,
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recovery altered the program structure:")?;
        if !self.reindented_lines.is_empty() {
            let lines: Vec<String> = self
                .reindented_lines
                .iter()
                .map(|l| l.to_string())
                .collect();
            write!(f, " re-indented line(s) {}", lines.join(", "))?;
            if self.appended_terminator {
                write!(f, ";")?;
            }
        }
        if self.appended_terminator {
            write!(f, " appended a closing `end`")?;
        }
        Ok(())
    }
}

/// Result of a parse that may have gone through recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub cst: ProgramCst,
    pub repair: Option<Repair>,
}

/// Parses source, applying at most one repair when `mode` allows it.
pub fn parse_with_recovery(source: &str, mode: RecoveryMode) -> Result<Parsed, FrontendError> {
    let stripped = strip_comments(source);
    let err = match parse_stripped(&stripped) {
        Ok(cst) => return Ok(Parsed { cst, repair: None }),
        Err(err) => err,
    };
    if mode == RecoveryMode::Disabled {
        return Err(err);
    }
    let Some(repair) = repair_source(&stripped) else {
        return Err(err);
    };
    match parse_stripped(&repair.source) {
        Ok(cst) => {
            tracing::warn!(
                reindented = repair.reindented_lines.len(),
                appended_terminator = repair.appended_terminator,
                "parse succeeded only after recovery"
            );
            Ok(Parsed {
                cst,
                repair: Some(repair),
            })
        }
        Err(retry_err) => {
            tracing::debug!(error = %retry_err, "recovery retry failed");
            Err(err)
        }
    }
}

/// Computes the repaired source, or `None` if there is nothing to repair.
pub fn repair_source(source: &str) -> Option<Repair> {
    let mut out: Vec<String> = Vec::new();
    let mut reindented_lines = Vec::new();
    let mut in_block = false;

    for (idx, line) in source.lines().enumerate() {
        let trimmed = line.trim();
        if !in_block {
            in_block = opens_block(trimmed);
            out.push(line.to_string());
        } else if trimmed == "end" {
            in_block = false;
            out.push(line.to_string());
        } else if trimmed.is_empty() || line.starts_with("  ") {
            out.push(line.to_string());
        } else {
            reindented_lines.push(idx as u32 + 1);
            out.push(format!("  {}", line.trim_start()));
        }
    }

    let appended_terminator = in_block;
    if appended_terminator {
        out.push("end".to_string());
    }
    if reindented_lines.is_empty() && !appended_terminator {
        return None;
    }

    let mut repaired = out.join("\n");
    repaired.push('\n');
    Some(Repair {
        source: repaired,
        reindented_lines,
        appended_terminator,
    })
}
