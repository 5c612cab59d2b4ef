//! Program IR for Aura.
//!
//! Every record is built once by the transformer and never mutated. The
//! [`NameTable`] maps declared model and dataset names to their index in
//! [`ProgramIR::declarations`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use aura_frontend::SourceRange;

use crate::errors::{DeclKind, IrError};
use crate::layer::Layer;
use crate::symbol::Symbol;

/// Where a dataset is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DatasetHost {
    HuggingFace,
}

impl DatasetHost {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "huggingface" => Some(Self::HuggingFace),
            _ => None,
        }
    }
}

impl fmt::Display for DatasetHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HuggingFace => f.write_str("huggingface"),
        }
    }
}

/// A dataset split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Split {
    Train,
    Test,
    Validation,
}

impl Split {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "train" => Some(Self::Train),
            "test" => Some(Self::Test),
            "validation" => Some(Self::Validation),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
            Self::Validation => "validation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDecl {
    pub name: String,
    pub host: DatasetHost,
    pub source: String,
    pub splits: BTreeSet<Split>,
    pub range: SourceRange,
}

/// The two mutually exclusive model bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelVariant {
    /// Raw text pass-through returning a fixed greeting.
    Text { greeting: String },
    /// Layered numeric network. `input_units` is the flattened input shape,
    /// or the configured default when no shape is declared.
    Network { layers: Vec<Layer>, input_units: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelDecl {
    pub name: String,
    pub variant: ModelVariant,
    pub range: SourceRange,
}

impl ModelDecl {
    pub fn is_text(&self) -> bool {
        matches!(self.variant, ModelVariant::Text { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainDecl {
    pub model: String,
    pub dataset: String,
    pub epochs: u32,
    pub batch_size: u32,
    pub optimizer: Symbol,
    pub learning_rate: f64,
    pub loss: Option<Symbol>,
    pub metrics: Option<Symbol>,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluateDecl {
    pub model: String,
    pub dataset: String,
    pub range: SourceRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body format of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ResponseFormat {
    #[default]
    Json,
    Html,
}

impl ResponseFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "json" => Some(Self::Json),
            "html" => Some(Self::Html),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Html => "text/html",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecl {
    pub path: String,
    pub method: HttpMethod,
    pub model: String,
    pub input_field: String,
    pub format: ResponseFormat,
    pub range: SourceRange,
}

/// Server configuration. `range` is `None` when the port is the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDecl {
    pub port: u16,
    pub range: Option<SourceRange>,
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Dataset(DatasetDecl),
    Model(ModelDecl),
    Train(TrainDecl),
    Evaluate(EvaluateDecl),
    Route(RouteDecl),
    Run(RunDecl),
}

impl Declaration {
    pub fn kind(&self) -> DeclKind {
        match self {
            Self::Dataset(_) => DeclKind::Dataset,
            Self::Model(_) => DeclKind::Model,
            Self::Train(_) => DeclKind::Train,
            Self::Evaluate(_) => DeclKind::Evaluate,
            Self::Route(_) => DeclKind::Route,
            Self::Run(_) => DeclKind::Run,
        }
    }
}

/// Declared model and dataset names, mapped to declaration indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    models: BTreeMap<String, usize>,
    datasets: BTreeMap<String, usize>,
    run: Option<usize>,
}

impl NameTable {
    pub fn model_index(&self, name: &str) -> Option<usize> {
        self.models.get(name).copied()
    }

    pub fn dataset_index(&self, name: &str) -> Option<usize> {
        self.datasets.get(name).copied()
    }

    /// Returns the table extended with `decl` at `index`, or a duplicate error.
    pub fn declare(mut self, decl: &Declaration, index: usize) -> Result<Self, IrError> {
        let (table, name, range) = match decl {
            Declaration::Model(m) => (&mut self.models, &m.name, m.range),
            Declaration::Dataset(d) => (&mut self.datasets, &d.name, d.range),
            Declaration::Run(r) => {
                if self.run.is_some() {
                    return Err(IrError::DuplicateDeclaration {
                        kind: DeclKind::Run,
                        name: "web".to_string(),
                        range: r.range,
                    });
                }
                self.run = Some(index);
                return Ok(self);
            }
            _ => return Ok(self),
        };
        if table.contains_key(name) {
            return Err(IrError::DuplicateDeclaration {
                kind: decl.kind(),
                name: name.clone(),
                range: Some(range),
            });
        }
        table.insert(name.clone(), index);
        Ok(self)
    }
}

/// A transformed program in IR form.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramIR {
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
    /// Name table derived from `declarations`.
    pub names: NameTable,
    /// Effective server configuration (declared or default).
    pub run: RunDecl,
}

impl ProgramIR {
    pub fn model(&self, name: &str) -> Option<&ModelDecl> {
        match self.declarations.get(self.names.model_index(name)?) {
            Some(Declaration::Model(m)) => Some(m),
            _ => None,
        }
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetDecl> {
        match self.declarations.get(self.names.dataset_index(name)?) {
            Some(Declaration::Dataset(d)) => Some(d),
            _ => None,
        }
    }

    pub fn datasets(&self) -> impl Iterator<Item = &DatasetDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Dataset(ds) => Some(ds),
            _ => None,
        })
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Model(m) => Some(m),
            _ => None,
        })
    }

    pub fn trains(&self) -> impl Iterator<Item = &TrainDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Train(t) => Some(t),
            _ => None,
        })
    }

    pub fn evaluations(&self) -> impl Iterator<Item = &EvaluateDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Evaluate(e) => Some(e),
            _ => None,
        })
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Route(r) => Some(r),
            _ => None,
        })
    }
}
