//! # Concrete Syntax Tree
//!
//! The CST is the direct, shape-preserving result of the grammar. Literal text
//! is kept raw (string tokens still carry their quotes, numbers are unparsed,
//! symbols keep the leading `:`); coercion to semantic types happens in the
//! IR transformer.
//!
//! Every body line is tagged with the keyword alternative that matched it, so
//! a `layer dense units: ..` line and an `output units: ..` line never share a
//! variant even though their fields have the same shape.

use crate::errors::SourceRange;

/// A raw token with the source range it was matched at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub range: SourceRange,
}

/// A numeric literal, tagged by whether it contained a decimal point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberLit {
    Int(Token),
    Float(Token),
}

impl NumberLit {
    pub fn token(&self) -> &Token {
        match self {
            Self::Int(t) | Self::Float(t) => t,
        }
    }
}

/// The root of a parsed program: top-level statements in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramCst {
    pub statements: Vec<Statement>,
}

/// One top-level statement with the range it spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Dataset(DatasetStmt),
    Model(ModelStmt),
    Train(TrainStmt),
    Evaluate(EvaluateStmt),
    Route(RouteStmt),
    Run(RunStmt),
}

/// `dataset "<name>" from <host> "<source>" [splits :a, :b]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetStmt {
    pub name: Token,
    pub host: Token,
    pub source: Token,
    pub splits: Vec<Token>,
}

/// `model <name> neural_network do ... end`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStmt {
    pub name: Token,
    pub body: Vec<ModelLine>,
}

/// A single line of a model body, tagged by the alternative that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelLine {
    /// `input text`
    TextInput(SourceRange),
    /// `output greeting "<text>"`
    Greeting(Token),
    /// `input shape(<int>, ...) [flatten]`
    InputShape {
        dims: Vec<Token>,
        flatten: bool,
        range: SourceRange,
    },
    /// `layer dense units: <int>[, activation: :<sym>]`
    Dense {
        units: Token,
        activation: Option<Token>,
    },
    /// `layer dropout rate: <number>`
    Dropout { rate: NumberLit },
    /// `output units: <int>, activation: :<sym>`
    Output { units: Token, activation: Token },
}

impl ModelLine {
    /// Whether this line belongs to the numeric network variant.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::TextInput(_) | Self::Greeting(_))
    }

    /// Source range used when reporting problems with this line.
    pub fn range(&self) -> SourceRange {
        match self {
            Self::TextInput(range) => *range,
            Self::Greeting(t) => t.range,
            Self::InputShape { range, .. } => *range,
            Self::Dense { units, .. } | Self::Output { units, .. } => units.range,
            Self::Dropout { rate } => rate.token().range,
        }
    }
}

/// `train <model> on "<dataset>" do ... end`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainStmt {
    pub model: Token,
    pub dataset: Token,
    pub options: Vec<TrainOption>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainOption {
    Epochs(Token),
    BatchSize(Token),
    Optimizer {
        name: Token,
        learning_rate: Option<NumberLit>,
    },
    Loss(Token),
    Metrics(Token),
}

/// `evaluate <model> on "<dataset>"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluateStmt {
    pub model: Token,
    pub dataset: Token,
}

/// `route "<path>" get|post do ... end`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStmt {
    pub path: Token,
    pub method: Token,
    pub body: Vec<RouteLine>,
}

/// `output prediction from <model>.predict(<field>) [format :<sym>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLine {
    pub model: Token,
    pub input_field: Token,
    pub format: Option<Token>,
    pub range: SourceRange,
}

/// `run web on port: <int>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStmt {
    pub port: Token,
}
