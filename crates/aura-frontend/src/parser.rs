//! # Aura Parser
//!
//! This module implements the parser for the Aura DSL using the Pest parser generator.
//!
//! ## Overview
//!
//! The parser transforms source text into a [`ProgramCst`] without coercing
//! literals or checking references. It handles:
//!
//! - Dataset declarations
//! - Model blocks with text or layered network bodies
//! - Training blocks with optional hyperparameter lines
//! - Evaluation declarations
//! - Route blocks binding an HTTP method and path to a model prediction
//! - The web server port declaration
//!
//! ## Error Handling
//!
//! Grammar failures are reported as [`SyntaxError`] values carrying the furthest
//! matched position, the alternatives the grammar would have accepted there,
//! and a canned hint. Blocks whose body matched zero lines are rejected here
//! as well, since an empty body is a structural mistake rather than a semantic one.
//!
//! ## Grammar
//!
//! The grammar is defined in `grammar.pest` using Pest's PEG syntax. Statement
//! alternatives are ordered; the first one that matches wins.

use pest::error::{ErrorVariant, LineColLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

use crate::cst::*;
use crate::errors::{
    FrontendError, SourcePosition, SourceRange, SyntaxError, HINT_BLOCK, HINT_EMPTY_BLOCK,
    HINT_MISSING_END,
};
use crate::preprocess::strip_comments;

#[derive(Parser)]
#[grammar = "../grammar.pest"]
pub struct AuraParser;

/// Parses Aura source into a concrete syntax tree.
///
/// Trailing comments are stripped first (see [`strip_comments`]). This is a
/// purely syntactic pass; use `aura_ir::transform_program` to obtain the IR.
///
/// # Example
///
/// ```rust,ignore
/// use aura_frontend::parse_program;
///
/// let cst = parse_program("run web on port: 8080\n")?;
/// assert_eq!(cst.statements.len(), 1);
/// ```
pub fn parse_program(source: &str) -> Result<ProgramCst, FrontendError> {
    parse_stripped(&strip_comments(source))
}

/// Parses source that has already had its comments removed.
pub(crate) fn parse_stripped(source: &str) -> Result<ProgramCst, FrontendError> {
    let mut pairs =
        AuraParser::parse(Rule::program, source).map_err(|e| syntax_error(e, source))?;

    let mut statements = Vec::new();
    if let Some(program_pair) = pairs.next() {
        debug_assert_eq!(program_pair.as_rule(), Rule::program);
        for inner in program_pair.into_inner() {
            if let Some(stmt) = build_statement(inner)? {
                statements.push(stmt);
            }
        }
    }

    tracing::debug!(statements = statements.len(), "parsed program");
    Ok(ProgramCst { statements })
}

fn build_statement(pair: Pair<Rule>) -> Result<Option<Statement>, FrontendError> {
    let range = SourceRange::from_span(pair.as_span());
    let kind = match pair.as_rule() {
        Rule::dataset_decl => StatementKind::Dataset(build_dataset(pair)?),
        Rule::model_decl => StatementKind::Model(build_model(pair)?),
        Rule::train_decl => StatementKind::Train(build_train(pair)?),
        Rule::evaluate_decl => StatementKind::Evaluate(build_evaluate(pair)?),
        Rule::route_decl => StatementKind::Route(build_route(pair)?),
        Rule::run_decl => StatementKind::Run(build_run(pair)?),
        _ => return Ok(None),
    };
    Ok(Some(Statement { kind, range }))
}

fn build_dataset(pair: Pair<Rule>) -> Result<DatasetStmt, FrontendError> {
    let mut inner = pair.into_inner();
    let name = expect_token(&mut inner, Rule::string, "dataset name")?;
    let host = expect_token(&mut inner, Rule::dataset_host, "dataset host")?;
    let source = expect_token(&mut inner, Rule::string, "dataset source")?;
    let splits = inner
        .find(|p| p.as_rule() == Rule::splits_clause)
        .map(|clause| {
            clause
                .into_inner()
                .filter(|p| p.as_rule() == Rule::symbol)
                .map(|p| token(&p))
                .collect()
        })
        .unwrap_or_default();
    Ok(DatasetStmt {
        name,
        host,
        source,
        splits,
    })
}

fn build_model(pair: Pair<Rule>) -> Result<ModelStmt, FrontendError> {
    let mut inner = pair.into_inner();
    let name = expect_token(&mut inner, Rule::ident, "model name")?;
    let body_pair = expect_pair(&mut inner, Rule::model_body, "model body")?;
    let body_start = body_pair.as_span().start_pos();

    let mut body = Vec::new();
    for line in body_pair.into_inner() {
        let range = SourceRange::from_span(line.as_span());
        match line.as_rule() {
            Rule::text_input_line => body.push(ModelLine::TextInput(range)),
            Rule::greeting_line => {
                let mut li = line.into_inner();
                let text = expect_token(&mut li, Rule::string, "greeting text")?;
                body.push(ModelLine::Greeting(text));
            }
            Rule::shape_line => {
                let mut dims = Vec::new();
                let mut flatten = false;
                for p in line.into_inner() {
                    match p.as_rule() {
                        Rule::int => dims.push(token(&p)),
                        Rule::flatten_flag => flatten = true,
                        _ => {}
                    }
                }
                body.push(ModelLine::InputShape {
                    dims,
                    flatten,
                    range,
                });
            }
            Rule::dense_line => {
                let mut li = line.into_inner();
                let units = expect_token(&mut li, Rule::int, "dense units")?;
                let activation = li.find(|p| p.as_rule() == Rule::symbol).map(|p| token(&p));
                body.push(ModelLine::Dense { units, activation });
            }
            Rule::dropout_line => {
                let mut li = line.into_inner();
                let number = expect_pair(&mut li, Rule::number, "dropout rate")?;
                body.push(ModelLine::Dropout {
                    rate: build_number(number)?,
                });
            }
            Rule::output_line => {
                let mut li = line.into_inner();
                let units = expect_token(&mut li, Rule::int, "output units")?;
                let activation = expect_token(&mut li, Rule::symbol, "output activation")?;
                body.push(ModelLine::Output { units, activation });
            }
            _ => {}
        }
    }

    require_body(
        body.len(),
        body_start,
        &[
            "`input text`",
            "`input shape(..)`",
            "`layer dense`",
            "`output units:`",
        ],
    )?;
    Ok(ModelStmt { name, body })
}

fn build_train(pair: Pair<Rule>) -> Result<TrainStmt, FrontendError> {
    let mut inner = pair.into_inner();
    let model = expect_token(&mut inner, Rule::ident, "model name")?;
    let dataset = expect_token(&mut inner, Rule::string, "dataset name")?;
    let body_pair = expect_pair(&mut inner, Rule::train_body, "train body")?;
    let body_start = body_pair.as_span().start_pos();

    let mut options = Vec::new();
    for opt in body_pair.into_inner() {
        let rule = opt.as_rule();
        let mut oi = opt.into_inner();
        let option = match rule {
            Rule::epochs_opt => TrainOption::Epochs(expect_token(&mut oi, Rule::int, "epochs")?),
            Rule::batch_size_opt => {
                TrainOption::BatchSize(expect_token(&mut oi, Rule::int, "batch size")?)
            }
            Rule::optimizer_opt => {
                let name = expect_token(&mut oi, Rule::symbol, "optimizer")?;
                let learning_rate = oi
                    .find(|p| p.as_rule() == Rule::number)
                    .map(build_number)
                    .transpose()?;
                TrainOption::Optimizer {
                    name,
                    learning_rate,
                }
            }
            Rule::loss_opt => TrainOption::Loss(expect_token(&mut oi, Rule::symbol, "loss")?),
            Rule::metrics_opt => {
                TrainOption::Metrics(expect_token(&mut oi, Rule::symbol, "metrics")?)
            }
            _ => continue,
        };
        options.push(option);
    }

    require_body(
        options.len(),
        body_start,
        &["`epochs`", "`batch_size`", "`optimizer`", "`loss`", "`metrics`"],
    )?;
    Ok(TrainStmt {
        model,
        dataset,
        options,
    })
}

fn build_evaluate(pair: Pair<Rule>) -> Result<EvaluateStmt, FrontendError> {
    let mut inner = pair.into_inner();
    let model = expect_token(&mut inner, Rule::ident, "model name")?;
    let dataset = expect_token(&mut inner, Rule::string, "dataset name")?;
    Ok(EvaluateStmt { model, dataset })
}

fn build_route(pair: Pair<Rule>) -> Result<RouteStmt, FrontendError> {
    let mut inner = pair.into_inner();
    let path = expect_token(&mut inner, Rule::string, "route path")?;
    let method = expect_token(&mut inner, Rule::http_method, "HTTP method")?;
    let body_pair = expect_pair(&mut inner, Rule::route_body, "route body")?;
    let body_start = body_pair.as_span().start_pos();

    let mut body = Vec::new();
    for line in body_pair.into_inner() {
        if line.as_rule() != Rule::route_line {
            continue;
        }
        let range = SourceRange::from_span(line.as_span());
        let mut li = line.into_inner();
        let model = expect_token(&mut li, Rule::ident, "model name")?;
        let input_field = expect_token(&mut li, Rule::ident, "input field")?;
        let format = li
            .find(|p| p.as_rule() == Rule::format_clause)
            .and_then(|clause| clause.into_inner().find(|p| p.as_rule() == Rule::symbol))
            .map(|p| token(&p));
        body.push(RouteLine {
            model,
            input_field,
            format,
            range,
        });
    }

    require_body(body.len(), body_start, &["`output prediction from`"])?;
    Ok(RouteStmt { path, method, body })
}

fn build_run(pair: Pair<Rule>) -> Result<RunStmt, FrontendError> {
    let mut inner = pair.into_inner();
    let port = expect_token(&mut inner, Rule::int, "port")?;
    Ok(RunStmt { port })
}

fn build_number(pair: Pair<Rule>) -> Result<NumberLit, FrontendError> {
    let lit = pair
        .into_inner()
        .next()
        .ok_or_else(|| FrontendError::Internal("empty number".to_string()))?;
    match lit.as_rule() {
        Rule::float => Ok(NumberLit::Float(token(&lit))),
        Rule::int => Ok(NumberLit::Int(token(&lit))),
        other => Err(FrontendError::Internal(format!(
            "unexpected number literal {:?}",
            other
        ))),
    }
}

fn token(pair: &Pair<Rule>) -> Token {
    Token {
        text: pair.as_str().to_string(),
        range: SourceRange::from_span(pair.as_span()),
    }
}

/// Helper to extract the next pair of a given rule from an iterator
fn expect_pair<'i>(
    iter: &mut Pairs<'i, Rule>,
    rule: Rule,
    what: &str,
) -> Result<Pair<'i, Rule>, FrontendError> {
    iter.find(|p| p.as_rule() == rule)
        .ok_or_else(|| FrontendError::Internal(format!("missing {}", what)))
}

fn expect_token(
    iter: &mut Pairs<Rule>,
    rule: Rule,
    what: &str,
) -> Result<Token, FrontendError> {
    expect_pair(iter, rule, what).map(|p| token(&p))
}

fn require_body(
    len: usize,
    start: pest::Position<'_>,
    expected: &[&str],
) -> Result<(), FrontendError> {
    if len > 0 {
        return Ok(());
    }
    let (line, column) = start.line_col();
    Err(FrontendError::Syntax(SyntaxError {
        location: SourcePosition {
            line: line as u32,
            column: column as u32,
        },
        expected: expected.iter().map(|s| s.to_string()).collect(),
        hint: HINT_EMPTY_BLOCK.to_string(),
    }))
}

fn syntax_error(err: pest::error::Error<Rule>, source: &str) -> FrontendError {
    let (line, column) = match err.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    let mut expected: Vec<String> = Vec::new();
    if let ErrorVariant::ParsingError { positives, .. } = &err.variant {
        for rule in positives {
            let name = describe_rule(*rule).to_string();
            if !expected.contains(&name) {
                expected.push(name);
            }
        }
    }
    FrontendError::Syntax(SyntaxError {
        location: SourcePosition {
            line: line as u32,
            column: column as u32,
        },
        expected,
        hint: block_hint(source).to_string(),
    })
}

/// Picks a hint by comparing block openers against `end` lines.
fn block_hint(source: &str) -> &'static str {
    let mut open: i64 = 0;
    for line in source.lines() {
        let trimmed = line.trim();
        if opens_block(trimmed) {
            open += 1;
        } else if trimmed == "end" {
            open -= 1;
        }
    }
    if open > 0 {
        HINT_MISSING_END
    } else {
        HINT_BLOCK
    }
}

/// Whether a trimmed line starts a `do ... end` block.
pub(crate) fn opens_block(trimmed: &str) -> bool {
    let keyword = trimmed.split_whitespace().next().unwrap_or_default();
    matches!(keyword, "model" | "train" | "route")
        && trimmed.split_whitespace().last() == Some("do")
}

fn describe_rule(rule: Rule) -> &'static str {
    match rule {
        Rule::dataset_decl => "`dataset` declaration",
        Rule::model_decl => "`model` block",
        Rule::train_decl => "`train` block",
        Rule::evaluate_decl => "`evaluate` declaration",
        Rule::route_decl => "`route` block",
        Rule::run_decl => "`run web` declaration",
        Rule::indent => "indented body line",
        Rule::block_end => "`end`",
        Rule::text_input_line => "`input text`",
        Rule::greeting_line => "`output greeting`",
        Rule::shape_line => "`input shape(..)`",
        Rule::dense_line => "`layer dense`",
        Rule::dropout_line => "`layer dropout`",
        Rule::output_line => "`output units:`",
        Rule::epochs_opt => "`epochs`",
        Rule::batch_size_opt => "`batch_size`",
        Rule::optimizer_opt => "`optimizer`",
        Rule::loss_opt => "`loss`",
        Rule::metrics_opt => "`metrics`",
        Rule::route_line => "`output prediction from`",
        Rule::ident => "identifier",
        Rule::string => "string literal",
        Rule::int => "integer",
        Rule::float | Rule::number => "number",
        Rule::symbol => "symbol (`:name`)",
        Rule::http_method => "`get` or `post`",
        Rule::dataset_host => "`huggingface`",
        Rule::splits_clause => "`splits`",
        Rule::flatten_flag => "`flatten`",
        Rule::format_clause => "`format`",
        Rule::EOI => "end of input",
        _ => "statement",
    }
}
