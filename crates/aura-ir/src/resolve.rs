//! Reference resolution.
//!
//! Checks that every model and dataset named by a `train`, `evaluate`, or
//! `route` declaration is declared somewhere in the program. Declarations may
//! appear in any order; the first unresolved reference in source order is
//! reported.
//!
//! A `train` declaration must also name a network model: a text model has no
//! parameters to optimize.

use std::ops::Deref;

use crate::errors::{DeclKind, IrError};
use crate::program::{Declaration, ProgramIR};

/// A [`ProgramIR`] whose cross-references are known to resolve.
///
/// Only [`resolve_program`] constructs this type, so downstream stages can
/// look names up without handling the missing case as an input error.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProgram(ProgramIR);

impl ResolvedProgram {
    pub fn program(&self) -> &ProgramIR {
        &self.0
    }

    pub fn into_inner(self) -> ProgramIR {
        self.0
    }
}

impl Deref for ResolvedProgram {
    type Target = ProgramIR;

    fn deref(&self) -> &ProgramIR {
        &self.0
    }
}

/// Resolves references in `program`, failing on the first undefined name.
pub fn resolve_program(program: ProgramIR) -> Result<ResolvedProgram, IrError> {
    for decl in &program.declarations {
        match decl {
            Declaration::Train(t) => {
                let by = format!("train '{}'", t.model);
                require_model(&program, &t.model, &by, decl)?;
                require_dataset(&program, &t.dataset, &by, decl)?;
                if program.model(&t.model).is_some_and(|m| m.is_text()) {
                    return Err(IrError::invalid(
                        by,
                        format!("model '{}' is a text model and cannot be trained", t.model),
                        t.range,
                    ));
                }
            }
            Declaration::Evaluate(e) => {
                let by = format!("evaluate '{}'", e.model);
                require_model(&program, &e.model, &by, decl)?;
                require_dataset(&program, &e.dataset, &by, decl)?;
            }
            Declaration::Route(r) => {
                let by = format!("route {} {}", r.method, r.path);
                require_model(&program, &r.model, &by, decl)?;
            }
            Declaration::Dataset(_) | Declaration::Model(_) | Declaration::Run(_) => {}
        }
    }
    tracing::debug!(declarations = program.declarations.len(), "resolved references");
    Ok(ResolvedProgram(program))
}

fn require_model(
    program: &ProgramIR,
    name: &str,
    referenced_by: &str,
    decl: &Declaration,
) -> Result<(), IrError> {
    match program.names.model_index(name) {
        Some(_) => Ok(()),
        None => Err(undefined(DeclKind::Model, name, referenced_by, decl)),
    }
}

fn require_dataset(
    program: &ProgramIR,
    name: &str,
    referenced_by: &str,
    decl: &Declaration,
) -> Result<(), IrError> {
    match program.names.dataset_index(name) {
        Some(_) => Ok(()),
        None => Err(undefined(DeclKind::Dataset, name, referenced_by, decl)),
    }
}

fn undefined(kind: DeclKind, name: &str, referenced_by: &str, decl: &Declaration) -> IrError {
    let range = match decl {
        Declaration::Train(t) => Some(t.range),
        Declaration::Evaluate(e) => Some(e.range),
        Declaration::Route(r) => Some(r.range),
        _ => None,
    };
    IrError::UndefinedReference {
        kind,
        name: name.to_string(),
        referenced_by: referenced_by.to_string(),
        range,
    }
}
