//! # Semantic Transformer
//!
//! Turns a [`ProgramCst`] into a [`ProgramIR`]:
//!
//! - string literals are unquoted, numeric literals parsed (integer or float
//!   according to the token the grammar matched), symbols interned
//! - optional fields take the values in [`Defaults`]
//! - model bodies are classified as text or network variants
//! - duplicate model, dataset, and `run` declarations are rejected
//!
//! The transformer is a pure function of its inputs. The [`NameTable`] is
//! threaded explicitly: each declaration step consumes the table built so far
//! and returns the extended one.
//!
//! ## Option precedence
//!
//! When a train body repeats a key, the last occurrence wins. `learning_rate`
//! is its own key: an `optimizer` line without it keeps an earlier rate.

use std::collections::BTreeSet;

use aura_frontend::cst::{
    DatasetStmt, EvaluateStmt, ModelLine, ModelStmt, NumberLit, ProgramCst, RouteStmt, RunStmt,
    Statement, StatementKind, Token, TrainOption, TrainStmt,
};
use aura_frontend::SourceRange;

use crate::defaults::Defaults;
use crate::errors::IrError;
use crate::layer::{Activation, Layer};
use crate::program::*;
use crate::symbol::Interner;

/// Transforms a parsed program into IR, applying `defaults` to omitted fields.
/// `defaults` are validated first; see [`Defaults::validate`].
///
/// References between declarations are not checked here; see
/// [`crate::resolve::resolve_program`].
pub fn transform_program(cst: &ProgramCst, defaults: &Defaults) -> Result<ProgramIR, IrError> {
    defaults.validate()?;
    let mut interner = Interner::default();
    let mut names = NameTable::default();
    let mut declarations = Vec::with_capacity(cst.statements.len());

    for stmt in &cst.statements {
        let decl = transform_statement(stmt, defaults, &mut interner)?;
        names = names.declare(&decl, declarations.len())?;
        declarations.push(decl);
    }

    let run = declarations
        .iter()
        .find_map(|d| match d {
            Declaration::Run(run) => Some(run.clone()),
            _ => None,
        })
        .unwrap_or(RunDecl {
            port: defaults.port,
            range: None,
        });

    tracing::debug!(
        declarations = declarations.len(),
        symbols = interner.len(),
        "transformed program"
    );
    Ok(ProgramIR {
        declarations,
        names,
        run,
    })
}

fn transform_statement(
    stmt: &Statement,
    defaults: &Defaults,
    interner: &mut Interner,
) -> Result<Declaration, IrError> {
    Ok(match &stmt.kind {
        StatementKind::Dataset(d) => Declaration::Dataset(transform_dataset(d, stmt.range)?),
        StatementKind::Model(m) => Declaration::Model(transform_model(m, stmt.range, defaults)?),
        StatementKind::Train(t) => {
            Declaration::Train(transform_train(t, stmt.range, defaults, interner)?)
        }
        StatementKind::Evaluate(e) => Declaration::Evaluate(transform_evaluate(e, stmt.range)),
        StatementKind::Route(r) => Declaration::Route(transform_route(r, stmt.range)?),
        StatementKind::Run(r) => Declaration::Run(transform_run(r, stmt.range)?),
    })
}

fn transform_dataset(stmt: &DatasetStmt, range: SourceRange) -> Result<DatasetDecl, IrError> {
    let name = unquote(&stmt.name);
    let context = format!("dataset '{}'", name);
    if name.is_empty() {
        return Err(IrError::invalid(context, "dataset name must not be empty", stmt.name.range));
    }
    let host = DatasetHost::from_name(&stmt.host.text).ok_or_else(|| {
        IrError::invalid(
            &context,
            format!("unsupported dataset host '{}'", stmt.host.text),
            stmt.host.range,
        )
    })?;
    let source = unquote(&stmt.source);
    if source.is_empty() {
        return Err(IrError::invalid(context, "dataset source must not be empty", stmt.source.range));
    }

    let splits = if stmt.splits.is_empty() {
        BTreeSet::from([Split::Train, Split::Test])
    } else {
        stmt.splits
            .iter()
            .map(|t| {
                Split::from_name(symbol_name(t)).ok_or_else(|| {
                    IrError::invalid(
                        &context,
                        format!(
                            "unknown split {} (expected :train, :test or :validation)",
                            t.text
                        ),
                        t.range,
                    )
                })
            })
            .collect::<Result<BTreeSet<_>, _>>()?
    };

    Ok(DatasetDecl {
        name,
        host,
        source,
        splits,
        range,
    })
}

fn transform_model(
    stmt: &ModelStmt,
    range: SourceRange,
    defaults: &Defaults,
) -> Result<ModelDecl, IrError> {
    let name = stmt.name.text.clone();
    let context = format!("model '{}'", name);
    let is_text = stmt
        .body
        .iter()
        .any(|line| matches!(line, ModelLine::TextInput(_)));
    let variant = if is_text {
        text_variant(&stmt.body, &context, defaults)?
    } else {
        network_variant(&stmt.body, &context, defaults)?
    };
    Ok(ModelDecl {
        name,
        variant,
        range,
    })
}

fn text_variant(
    body: &[ModelLine],
    context: &str,
    defaults: &Defaults,
) -> Result<ModelVariant, IrError> {
    if let Some(line) = body.iter().find(|line| line.is_numeric()) {
        return Err(IrError::invalid(
            context,
            "a model with `input text` cannot declare numeric layers",
            line.range(),
        ));
    }
    let greeting = body
        .iter()
        .find_map(|line| match line {
            ModelLine::Greeting(text) => Some(unquote(text)),
            _ => None,
        })
        .unwrap_or_else(|| defaults.greeting.clone());
    Ok(ModelVariant::Text { greeting })
}

fn network_variant(
    body: &[ModelLine],
    context: &str,
    defaults: &Defaults,
) -> Result<ModelVariant, IrError> {
    let mut layers = Vec::with_capacity(body.len());
    let mut input_units = None;

    for line in body {
        let layer = match line {
            ModelLine::TextInput(_) => continue,
            ModelLine::Greeting(text) => {
                return Err(IrError::invalid(
                    context,
                    "`output greeting` requires `input text`",
                    text.range,
                ));
            }
            ModelLine::InputShape { dims, range, .. } => {
                if input_units.is_some() {
                    return Err(IrError::invalid(
                        context,
                        "only one `input shape` line is allowed",
                        *range,
                    ));
                }
                if !layers.is_empty() {
                    return Err(IrError::invalid(
                        context,
                        "`input shape` must come before any layer",
                        *range,
                    ));
                }
                let dims = dims
                    .iter()
                    .map(|t| positive_int(t, "input dimension", context))
                    .collect::<Result<Vec<_>, _>>()?;
                let units = dims
                    .iter()
                    .try_fold(1u32, |acc, &d| acc.checked_mul(d))
                    .ok_or_else(|| {
                        IrError::invalid(context, "flattened input shape is too large", *range)
                    })?;
                input_units = Some(units);
                Layer::InputShape { dims }
            }
            ModelLine::Dense { units, activation } => Layer::Dense {
                units: positive_int(units, "dense units", context)?,
                activation: match activation {
                    Some(token) => parse_activation(token, context)?,
                    None => Activation::default(),
                },
            },
            ModelLine::Dropout { rate } => {
                let value = number(rate, "dropout rate", context)?;
                if !(0.0..1.0).contains(&value) {
                    return Err(IrError::invalid(
                        context,
                        format!("dropout rate {} must be in [0, 1)", rate.token().text),
                        rate.token().range,
                    ));
                }
                Layer::Dropout { rate: value }
            }
            ModelLine::Output { units, activation } => Layer::Output {
                units: positive_int(units, "output units", context)?,
                activation: parse_activation(activation, context)?,
            },
        };
        layers.push(layer);
    }

    Ok(ModelVariant::Network {
        layers,
        input_units: input_units.unwrap_or(defaults.input_units),
    })
}

fn transform_train(
    stmt: &TrainStmt,
    range: SourceRange,
    defaults: &Defaults,
    interner: &mut Interner,
) -> Result<TrainDecl, IrError> {
    let model = stmt.model.text.clone();
    let dataset = unquote(&stmt.dataset);
    let context = format!("train '{}'", model);

    let mut epochs = None;
    let mut batch_size = None;
    let mut optimizer = None;
    let mut learning_rate = None;
    let mut loss = None;
    let mut metrics = None;

    for option in &stmt.options {
        match option {
            TrainOption::Epochs(t) => epochs = Some(positive_int(t, "epochs", &context)?),
            TrainOption::BatchSize(t) => {
                batch_size = Some(positive_int(t, "batch size", &context)?)
            }
            TrainOption::Optimizer {
                name,
                learning_rate: lr,
            } => {
                optimizer = Some(interner.intern(&name.text));
                if let Some(lr) = lr {
                    let value = number(lr, "learning rate", &context)?;
                    if !(value.is_finite() && value > 0.0) {
                        return Err(IrError::invalid(
                            &context,
                            "learning rate must be greater than 0",
                            lr.token().range,
                        ));
                    }
                    learning_rate = Some(value);
                }
            }
            TrainOption::Loss(t) => loss = Some(interner.intern(&t.text)),
            TrainOption::Metrics(t) => metrics = Some(interner.intern(&t.text)),
        }
    }

    Ok(TrainDecl {
        model,
        dataset,
        epochs: epochs.unwrap_or(defaults.epochs),
        batch_size: batch_size.unwrap_or(defaults.batch_size),
        optimizer: optimizer.unwrap_or_else(|| interner.intern(&defaults.optimizer)),
        learning_rate: learning_rate.unwrap_or(defaults.learning_rate),
        loss,
        metrics,
        range,
    })
}

fn transform_evaluate(stmt: &EvaluateStmt, range: SourceRange) -> EvaluateDecl {
    EvaluateDecl {
        model: stmt.model.text.clone(),
        dataset: unquote(&stmt.dataset),
        range,
    }
}

fn transform_route(stmt: &RouteStmt, range: SourceRange) -> Result<RouteDecl, IrError> {
    let path = unquote(&stmt.path);
    let method = HttpMethod::from_name(&stmt.method.text).ok_or_else(|| {
        IrError::invalid(
            format!("route '{}'", path),
            format!("unsupported HTTP method '{}'", stmt.method.text),
            stmt.method.range,
        )
    })?;
    let context = format!("route {} {}", method, path);
    if !path.starts_with('/') {
        return Err(IrError::invalid(context, "route path must start with '/'", stmt.path.range));
    }

    let line = match stmt.body.as_slice() {
        [line] => line,
        [] => return Err(IrError::invalid(context, "route body is empty", range)),
        [_, extra, ..] => {
            return Err(IrError::invalid(
                context,
                "a route body must contain exactly one `output prediction` line",
                extra.range,
            ));
        }
    };

    let format = match &line.format {
        Some(token) => ResponseFormat::from_name(symbol_name(token)).ok_or_else(|| {
            IrError::invalid(
                &context,
                format!("unsupported format {} (expected :json or :html)", token.text),
                token.range,
            )
        })?,
        None => ResponseFormat::default(),
    };

    Ok(RouteDecl {
        path,
        method,
        model: line.model.text.clone(),
        input_field: line.input_field.text.clone(),
        format,
        range,
    })
}

fn transform_run(stmt: &RunStmt, range: SourceRange) -> Result<RunDecl, IrError> {
    let port = positive_int(&stmt.port, "port", "run web")?;
    let port = u16::try_from(port).map_err(|_| {
        IrError::invalid("run web", "port must be between 1 and 65535", stmt.port.range)
    })?;
    Ok(RunDecl {
        port,
        range: Some(range),
    })
}

/// Helper to extract a string literal without quotes
fn unquote(token: &Token) -> String {
    let text = token.text.as_str();
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
        .to_string()
}

fn symbol_name(token: &Token) -> &str {
    token.text.strip_prefix(':').unwrap_or(&token.text)
}

fn positive_int(token: &Token, what: &str, context: &str) -> Result<u32, IrError> {
    let value: u32 = token.text.parse().map_err(|_| {
        IrError::invalid(
            context,
            format!("{} {} is out of range", what, token.text),
            token.range,
        )
    })?;
    if value == 0 {
        return Err(IrError::invalid(
            context,
            format!("{} must be at least 1", what),
            token.range,
        ));
    }
    Ok(value)
}

fn number(lit: &NumberLit, what: &str, context: &str) -> Result<f64, IrError> {
    let token = lit.token();
    token.text.parse::<f64>().map_err(|e| {
        IrError::invalid(
            context,
            format!("invalid {} {}: {}", what, token.text, e),
            token.range,
        )
    })
}

fn parse_activation(token: &Token, context: &str) -> Result<Activation, IrError> {
    Activation::from_name(symbol_name(token)).ok_or_else(|| {
        let known: Vec<String> = Activation::ALL.iter().map(|a| format!(":{}", a)).collect();
        IrError::invalid(
            context,
            format!(
                "unknown activation {} (expected one of {})",
                token.text,
                known.join(", ")
            ),
            token.range,
        )
    })
}
