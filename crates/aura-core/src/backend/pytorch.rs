//! Python backend: torch models and training loops served by Flask.

use std::collections::BTreeMap;
use std::fmt::Write;

use aura_ir::{Activation, ResponseFormat, Symbol};

use crate::backend::Backend;
use crate::errors::EmitError;
use crate::lower::{
    DatasetAction, EmittedProgram, EvaluateAction, ModelAction, ModelOp, RouteAction, TrainAction,
};

const NAME: &str = "pytorch-flask";

/// Samples per evaluation batch.
const EVAL_BATCH: u32 = 32;

/// Renders one Python module that builds the models, runs the training and
/// evaluation jobs, and serves the routes with Flask.
#[derive(Debug, Clone, Copy, Default)]
pub struct PyTorchFlaskBackend;

impl Backend for PyTorchFlaskBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn emit(&self, program: &EmittedProgram) -> Result<String, EmitError> {
        let mut out = String::new();
        write_header(&mut out)?;
        write_datasets(&mut out, &program.datasets)?;
        write_models(&mut out, &program.models)?;
        for (index, train) in program.trains.iter().enumerate() {
            write_train(&mut out, index, train)?;
        }
        for (index, eval) in program.evaluations.iter().enumerate() {
            write_evaluation(&mut out, index, eval, &program.models)?;
        }
        writeln!(out, "app = Flask(__name__)")?;
        for (index, route) in program.routes.iter().enumerate() {
            write_route(&mut out, index, route, &program.models)?;
        }
        write_main(&mut out, program)?;
        tracing::debug!(backend = NAME, bytes = out.len(), "emitted program");
        Ok(out)
    }
}

fn write_header(out: &mut String) -> Result<(), EmitError> {
    writeln!(out, "# Generated by aura. Do not edit.")?;
    writeln!(out, "import json")?;
    writeln!(out)?;
    writeln!(out, "import torch")?;
    writeln!(out, "import torch.nn as nn")?;
    writeln!(out, "from flask import Flask, jsonify, request")?;
    writeln!(out)?;
    writeln!(
        out,
        "device = \"cuda\" if torch.cuda.is_available() else \"cpu\""
    )?;
    writeln!(out)?;
    Ok(())
}

fn write_datasets(out: &mut String, datasets: &[DatasetAction]) -> Result<(), EmitError> {
    if datasets.is_empty() {
        writeln!(out, "DATASETS = {{}}")?;
        writeln!(out)?;
        return Ok(());
    }
    writeln!(out, "DATASETS = {{")?;
    for ds in datasets {
        let splits: Vec<String> = ds.splits.iter().map(|s| py_str(s.name())).collect();
        writeln!(
            out,
            "    {}: {{\"host\": {}, \"source\": {}, \"splits\": [{}]}},",
            py_str(&ds.name),
            py_str(&ds.host.to_string()),
            py_str(&ds.source),
            splits.join(", ")
        )?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;
    Ok(())
}

fn write_models(out: &mut String, models: &BTreeMap<String, ModelAction>) -> Result<(), EmitError> {
    for (name, model) in models {
        match model {
            ModelAction::PassThrough { greeting } => {
                writeln!(out, "def {}_model(_input):", name)?;
                writeln!(out, "    return {}", py_str(greeting))?;
            }
            ModelAction::Sequential { ops, .. } => {
                writeln!(out, "{}_model = nn.Sequential(", name)?;
                for op in ops {
                    writeln!(out, "    {},", module(op))?;
                }
                writeln!(out, ").to(device)")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn module(op: &ModelOp) -> String {
    match op {
        ModelOp::Flatten { .. } => "nn.Flatten()".to_string(),
        ModelOp::Linear {
            in_features,
            out_features,
        } => format!("nn.Linear({}, {})", in_features, out_features),
        ModelOp::Activation { function } => activation(*function).to_string(),
        ModelOp::Dropout { rate } => format!("nn.Dropout(p={})", rate),
    }
}

fn activation(function: Activation) -> &'static str {
    match function {
        Activation::Relu => "nn.ReLU()",
        Activation::Sigmoid => "nn.Sigmoid()",
        Activation::Softmax => "nn.Softmax(dim=1)",
        Activation::Tanh => "nn.Tanh()",
        Activation::Gelu => "nn.GELU()",
        Activation::Identity => "nn.Identity()",
    }
}

fn optimizer(symbol: &Symbol) -> Result<&'static str, EmitError> {
    Ok(match symbol.as_str() {
        "adam" => "torch.optim.Adam",
        "adamw" => "torch.optim.AdamW",
        "sgd" => "torch.optim.SGD",
        "rmsprop" => "torch.optim.RMSprop",
        "adagrad" => "torch.optim.Adagrad",
        other => return Err(unsupported("optimizer", other)),
    })
}

/// Loss module, and whether it takes class indices as targets.
fn loss(symbol: &Symbol) -> Result<(&'static str, bool), EmitError> {
    Ok(match symbol.as_str() {
        "cross_entropy" => ("nn.CrossEntropyLoss()", true),
        "nll" => ("nn.NLLLoss()", true),
        "mse" => ("nn.MSELoss()", false),
        "l1" => ("nn.L1Loss()", false),
        "bce" => ("nn.BCELoss()", false),
        other => return Err(unsupported("loss", other)),
    })
}

fn unsupported(what: &'static str, value: &str) -> EmitError {
    EmitError::Unsupported {
        backend: NAME,
        what,
        value: value.to_string(),
    }
}

fn train_fn(index: usize, train: &TrainAction) -> String {
    format!("train_{}_{}", train.model, index)
}

fn write_train(out: &mut String, index: usize, train: &TrainAction) -> Result<(), EmitError> {
    let optimizer = optimizer(&train.optimizer)?;
    let (loss_fn, class_targets) = loss(&train.loss)?;
    let targets = if class_targets {
        format!(
            "torch.randint(0, {}, (batch_size,), device=device)",
            train.output_features
        )
    } else {
        format!(
            "torch.rand(batch_size, {}, device=device)",
            train.output_features
        )
    };

    writeln!(out, "def {}():", train_fn(index, train))?;
    writeln!(out, "    model = {}_model", train.model)?;
    writeln!(out, "    model.train()")?;
    writeln!(
        out,
        "    optimizer = {}(model.parameters(), lr={})",
        optimizer, train.learning_rate
    )?;
    writeln!(out, "    loss_fn = {}", loss_fn)?;
    writeln!(out, "    batch_size = {}", train.batch_size)?;
    writeln!(out, "    for epoch in range({}):", train.epochs)?;
    writeln!(out, "        for attempt in range(2):")?;
    writeln!(out, "            try:")?;
    writeln!(
        out,
        "                inputs = torch.randn(batch_size, {}, device=device)",
        train.input_features
    )?;
    writeln!(out, "                targets = {}", targets)?;
    writeln!(out, "                loss = loss_fn(model(inputs), targets)")?;
    writeln!(out, "                optimizer.zero_grad()")?;
    writeln!(out, "                loss.backward()")?;
    writeln!(out, "                optimizer.step()")?;
    writeln!(out, "                break")?;
    writeln!(out, "            except torch.cuda.OutOfMemoryError:")?;
    writeln!(out, "                if attempt == 1:")?;
    writeln!(out, "                    raise")?;
    writeln!(out, "                batch_size = max(1, batch_size // 2)")?;
    writeln!(
        out,
        "                print(f\"out of memory in epoch {{epoch + 1}}, retrying with batch size {{batch_size}}\")"
    )?;
    writeln!(
        out,
        "    print({})",
        py_str(&format!("trained {} on {}", train.model, train.dataset))
    )?;
    writeln!(out)?;
    Ok(())
}

fn eval_fn(index: usize, eval: &EvaluateAction) -> String {
    format!("evaluate_{}_{}", eval.model, index)
}

fn write_evaluation(
    out: &mut String,
    index: usize,
    eval: &EvaluateAction,
    models: &BTreeMap<String, ModelAction>,
) -> Result<(), EmitError> {
    writeln!(out, "def {}():", eval_fn(index, eval))?;
    let widths = models
        .get(&eval.model)
        .and_then(|m| Some((m.input_features()?, m.output_features()?)));
    match widths {
        Some((input, output)) => {
            writeln!(out, "    model = {}_model", eval.model)?;
            writeln!(out, "    model.eval()")?;
            writeln!(out, "    with torch.no_grad():")?;
            writeln!(
                out,
                "        inputs = torch.randn({}, {}, device=device)",
                EVAL_BATCH, input
            )?;
            writeln!(
                out,
                "        targets = torch.randint(0, {}, ({},), device=device)",
                output, EVAL_BATCH
            )?;
            writeln!(
                out,
                "        accuracy = (model(inputs).argmax(1) == targets).float().mean().item()"
            )?;
            writeln!(
                out,
                "    print(f\"evaluated {} on {}: accuracy={{accuracy:.4f}}\")",
                eval.model,
                py_fescape(&eval.dataset)
            )?;
        }
        None => writeln!(
            out,
            "    print({})",
            py_str(&format!(
                "evaluated {} on {}: pass-through model",
                eval.model, eval.dataset
            ))
        )?,
    }
    writeln!(out)?;
    Ok(())
}

fn write_route(
    out: &mut String,
    index: usize,
    route: &RouteAction,
    models: &BTreeMap<String, ModelAction>,
) -> Result<(), EmitError> {
    let handler = &route.handler;
    let method = route.method.as_str();
    let fn_name = format!(
        "route_{}_{}{}",
        index,
        method.to_lowercase(),
        identifier_suffix(&route.path)
    );

    writeln!(out)?;
    writeln!(out)?;
    writeln!(
        out,
        "@app.route({}, methods=[{}])",
        py_str(&route.path),
        py_str(method)
    )?;
    writeln!(out, "def {}():", fn_name)?;
    writeln!(out, "    try:")?;
    writeln!(out, "        payload = request.get_data(as_text=True)")?;
    writeln!(
        out,
        "        data = json.loads(payload) if payload.strip() else {{}}"
    )?;
    writeln!(out, "    except json.JSONDecodeError:")?;
    writeln!(
        out,
        "        return jsonify(error={}), 400",
        py_str(&route.invalid_body_message())
    )?;
    writeln!(out, "    try:")?;
    writeln!(out, "        if not isinstance(data, dict):")?;
    writeln!(
        out,
        "            raise ValueError(\"request body must be a JSON object\")"
    )?;
    writeln!(out, "        value = data.get({})", py_str(&handler.input_field))?;

    let pass_through = models
        .get(&handler.model)
        .is_some_and(ModelAction::is_pass_through);
    if pass_through {
        writeln!(out, "        prediction = {}_model(value)", handler.model)?;
    } else {
        writeln!(out, "        if value is None:")?;
        writeln!(out, "            value = [1.0]")?;
        writeln!(
            out,
            "        inputs = torch.tensor(value, dtype=torch.float32, device=device).reshape(1, -1)"
        )?;
        writeln!(out, "        with torch.no_grad():")?;
        writeln!(
            out,
            "            prediction = {}_model(inputs).argmax(1).item()",
            handler.model
        )?;
    }
    writeln!(out, "    except Exception as e:")?;
    writeln!(
        out,
        "        return jsonify(error=f\"Something went wrong: {{e}}\"), 500"
    )?;
    match handler.format {
        ResponseFormat::Json => writeln!(out, "    return jsonify(prediction=prediction)")?,
        ResponseFormat::Html => writeln!(
            out,
            "    return f\"<h1>Prediction: {{prediction}}</h1>\", 200, {{\"Content-Type\": \"text/html\"}}"
        )?,
    }
    Ok(())
}

fn write_main(out: &mut String, program: &EmittedProgram) -> Result<(), EmitError> {
    writeln!(out)?;
    writeln!(out)?;
    writeln!(out, "if __name__ == \"__main__\":")?;
    for (index, train) in program.trains.iter().enumerate() {
        writeln!(out, "    {}()", train_fn(index, train))?;
    }
    for (index, eval) in program.evaluations.iter().enumerate() {
        writeln!(out, "    {}()", eval_fn(index, eval))?;
    }
    for (name, model) in &program.models {
        if !model.is_pass_through() {
            writeln!(out, "    {}_model.eval()", name)?;
        }
    }
    writeln!(out, "    app.run(port={})", program.run.port)?;
    Ok(())
}

/// Path characters mapped into a Python identifier suffix.
fn identifier_suffix(path: &str) -> String {
    path.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Double-quoted Python string literal.
fn py_str(s: &str) -> String {
    format!("\"{}\"", py_escape(s))
}

fn py_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Escapes `s` for the literal part of a Python f-string.
fn py_fescape(s: &str) -> String {
    py_escape(s).replace('{', "{{").replace('}', "}}")
}
