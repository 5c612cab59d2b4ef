//! # Lowering
//!
//! Maps a resolved program onto backend-agnostic actions. The resulting
//! [`EmittedProgram`] is plain data: a [`crate::backend::Backend`] renders it
//! for one target runtime, and the runtime traits in [`runtime`] let a caller
//! execute the described route and training behavior directly.

pub mod model;
pub mod route;
pub mod runtime;
pub mod train;

use std::collections::BTreeMap;

use aura_ir::{DatasetHost, ResolvedProgram, Split};

use crate::errors::LoweringError;

pub use model::{ModelAction, ModelOp};
pub use route::{HandlerResponse, HandlerSpec, RouteAction};
pub use runtime::{InferenceRuntime, RuntimeFailure, TrainingRuntime};
pub use train::{OutOfMemoryPolicy, TrainAction, TrainReport};

/// A dataset the storage collaborator must provide.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetAction {
    pub name: String,
    pub host: DatasetHost,
    pub source: String,
    pub splits: Vec<Split>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluateAction {
    pub model: String,
    pub dataset: String,
    /// Input width of the evaluated model; `None` for a pass-through model.
    pub input_features: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunAction {
    pub port: u16,
}

/// Everything an external runtime needs to build, train, and serve a program.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmittedProgram {
    pub datasets: Vec<DatasetAction>,
    pub models: BTreeMap<String, ModelAction>,
    pub trains: Vec<TrainAction>,
    pub evaluations: Vec<EvaluateAction>,
    pub routes: Vec<RouteAction>,
    pub run: RunAction,
}

impl EmittedProgram {
    pub fn model(&self, name: &str) -> Option<&ModelAction> {
        self.models.get(name)
    }

    /// Finds the route bound to `method` and `path`.
    pub fn route(&self, method: aura_ir::HttpMethod, path: &str) -> Option<&RouteAction> {
        self.routes
            .iter()
            .find(|r| r.method == method && r.path == path)
    }

    /// Dispatches one request to the matching route; `None` if no route matches.
    pub fn handle(
        &self,
        method: aura_ir::HttpMethod,
        path: &str,
        body: &str,
        runtime: &dyn InferenceRuntime,
    ) -> Option<HandlerResponse> {
        let route = self.route(method, path)?;
        let model = self.model(&route.handler.model)?;
        Some(route.respond(body, model, runtime))
    }
}

/// Lowers a resolved program into emitted actions.
pub fn lower_program(program: &ResolvedProgram) -> Result<EmittedProgram, LoweringError> {
    let models = program
        .models()
        .map(|m| Ok((m.name.clone(), model::lower_model(m)?)))
        .collect::<Result<BTreeMap<_, _>, LoweringError>>()?;

    let datasets = program
        .datasets()
        .map(|d| DatasetAction {
            name: d.name.clone(),
            host: d.host,
            source: d.source.clone(),
            splits: d.splits.iter().copied().collect(),
        })
        .collect();

    let trains = program
        .trains()
        .map(|t| {
            let node = format!("train '{}'", t.model);
            let action = lookup(&models, &t.model, &node)?;
            match (action.input_features(), action.output_features()) {
                (Some(input), Some(output)) => Ok(TrainAction::lower(t, input, output)),
                _ => Err(LoweringError::node(node, "a text model has no parameters to train")),
            }
        })
        .collect::<Result<Vec<_>, LoweringError>>()?;

    let evaluations = program
        .evaluations()
        .map(|e| {
            let node = format!("evaluate '{}'", e.model);
            let action = lookup(&models, &e.model, &node)?;
            Ok(EvaluateAction {
                model: e.model.clone(),
                dataset: e.dataset.clone(),
                input_features: action.input_features(),
            })
        })
        .collect::<Result<Vec<_>, LoweringError>>()?;

    let routes = program
        .routes()
        .map(|r| {
            let node = format!("route {} {}", r.method, r.path);
            lookup(&models, &r.model, &node)?;
            Ok(RouteAction::lower(r))
        })
        .collect::<Result<Vec<_>, LoweringError>>()?;

    tracing::debug!(
        models = models.len(),
        trains = trains.len(),
        routes = routes.len(),
        "lowered program"
    );

    Ok(EmittedProgram {
        datasets,
        models,
        trains,
        evaluations,
        routes,
        run: RunAction {
            port: program.run.port,
        },
    })
}

fn lookup<'a>(
    models: &'a BTreeMap<String, ModelAction>,
    name: &str,
    node: &str,
) -> Result<&'a ModelAction, LoweringError> {
    models
        .get(name)
        .ok_or_else(|| LoweringError::node(node, format!("model '{}' was not lowered", name)))
}
