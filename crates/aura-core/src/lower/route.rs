//! HTTP route actions and the request handler contract.
//!
//! A handler parses the JSON body (an empty body is an empty object), reads
//! the configured input field, and asks the model for a prediction:
//!
//! - a pass-through model answers with its greeting
//! - a network gets the field flattened to one row (`[1.0]` when missing),
//!   and the prediction is the arg-max index of the output row
//!
//! An unparseable body is a 400; every other failure is a 500 carrying the
//! underlying message.

use aura_ir::{HttpMethod, ResponseFormat, RouteDecl};
use serde_json::{json, Value};

use crate::lower::model::ModelAction;
use crate::lower::runtime::InferenceRuntime;

/// Input used when the request does not carry the input field.
pub const MISSING_INPUT: [f64; 1] = [1.0];

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandlerSpec {
    pub model: String,
    pub input_field: String,
    pub format: ResponseFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteAction {
    pub method: HttpMethod,
    pub path: String,
    pub handler: HandlerSpec,
}

/// What a handler sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl RouteAction {
    pub(crate) fn lower(decl: &RouteDecl) -> RouteAction {
        RouteAction {
            method: decl.method,
            path: decl.path.clone(),
            handler: HandlerSpec {
                model: decl.model.clone(),
                input_field: decl.input_field.clone(),
                format: decl.format,
            },
        }
    }

    /// Message of the 400 response sent for an unparseable body.
    pub fn invalid_body_message(&self) -> String {
        format!(
            "Invalid JSON. Send {{ \"{}\": [...] }}",
            self.handler.input_field
        )
    }

    /// Handles one request body against `model`, the action of the model
    /// named by the handler.
    pub fn respond(
        &self,
        body: &str,
        model: &ModelAction,
        runtime: &dyn InferenceRuntime,
    ) -> HandlerResponse {
        let data: Value = if body.is_empty() {
            Value::Object(Default::default())
        } else {
            match serde_json::from_str(body) {
                Ok(data) => data,
                Err(err) => {
                    tracing::debug!(path = %self.path, error = %err, "rejected request body");
                    return error_response(400, self.invalid_body_message());
                }
            }
        };

        match self.predict(&data, model, runtime) {
            Ok(prediction) => self.render(&prediction),
            Err(reason) => error_response(500, format!("Something went wrong: {}", reason)),
        }
    }

    fn predict(
        &self,
        data: &Value,
        model: &ModelAction,
        runtime: &dyn InferenceRuntime,
    ) -> Result<Value, String> {
        let fields = data
            .as_object()
            .ok_or_else(|| "request body must be a JSON object".to_string())?;
        let value = fields.get(&self.handler.input_field);

        if let Some(greeting) = model.greeting() {
            return Ok(Value::String(greeting.to_string()));
        }

        let input = match value {
            None | Some(Value::Null) => MISSING_INPUT.to_vec(),
            Some(value) => {
                let mut row = Vec::new();
                flatten_numbers(value, &mut row).map_err(|_| {
                    format!(
                        "field '{}' must be a number or a nested array of numbers",
                        self.handler.input_field
                    )
                })?;
                row
            }
        };

        let output = runtime
            .forward(&self.handler.model, &input)
            .map_err(|e| e.to_string())?;
        let index = argmax(&output).ok_or_else(|| "model produced an empty output".to_string())?;
        Ok(Value::from(index))
    }

    fn render(&self, prediction: &Value) -> HandlerResponse {
        match self.handler.format {
            ResponseFormat::Json => HandlerResponse {
                status: 200,
                content_type: ResponseFormat::Json.content_type(),
                body: json!({ "prediction": prediction }).to_string(),
            },
            ResponseFormat::Html => {
                let shown = match prediction {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                HandlerResponse {
                    status: 200,
                    content_type: ResponseFormat::Html.content_type(),
                    body: format!("<h1>Prediction: {}</h1>", shown),
                }
            }
        }
    }
}

fn error_response(status: u16, message: String) -> HandlerResponse {
    HandlerResponse {
        status,
        content_type: ResponseFormat::Json.content_type(),
        body: json!({ "error": message }).to_string(),
    }
}

fn flatten_numbers(value: &Value, out: &mut Vec<f64>) -> Result<(), ()> {
    match value {
        Value::Number(n) => {
            out.push(n.as_f64().ok_or(())?);
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(|item| flatten_numbers(item, out)),
        _ => Err(()),
    }
}

/// Index of the first maximum, skipping NaN.
fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
