//! Model construction actions.

use aura_ir::{Activation, Layer, ModelDecl, ModelVariant};

use crate::errors::LoweringError;

/// One step of a sequential network, in execution order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "op", rename_all = "snake_case"))]
pub enum ModelOp {
    /// Flattens an input of shape `dims` into `features` values.
    Flatten { dims: Vec<u32>, features: u32 },
    Linear { in_features: u32, out_features: u32 },
    Activation { function: Activation },
    Dropout { rate: f64 },
}

/// How to construct a declared model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ModelAction {
    /// Ignores its input and returns `greeting`.
    PassThrough { greeting: String },
    /// Layers applied in order to a flattened input of `input_features`.
    Sequential {
        input_features: u32,
        output_features: u32,
        ops: Vec<ModelOp>,
    },
}

impl ModelAction {
    /// What a pass-through model answers to any input; `None` for a network.
    pub fn greeting(&self) -> Option<&str> {
        match self {
            Self::PassThrough { greeting } => Some(greeting),
            Self::Sequential { .. } => None,
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::PassThrough { .. })
    }

    /// Flattened input width of a network; `None` for a pass-through.
    pub fn input_features(&self) -> Option<u32> {
        match self {
            Self::Sequential { input_features, .. } => Some(*input_features),
            Self::PassThrough { .. } => None,
        }
    }

    pub fn output_features(&self) -> Option<u32> {
        match self {
            Self::Sequential {
                output_features, ..
            } => Some(*output_features),
            Self::PassThrough { .. } => None,
        }
    }
}

pub(crate) fn lower_model(model: &ModelDecl) -> Result<ModelAction, LoweringError> {
    let (layers, input_units) = match &model.variant {
        ModelVariant::Text { greeting } => {
            return Ok(ModelAction::PassThrough {
                greeting: greeting.clone(),
            });
        }
        ModelVariant::Network {
            layers,
            input_units,
        } => (layers, *input_units),
    };

    let node = || format!("model '{}'", model.name);
    let mut features = input_units;
    let mut ops = Vec::with_capacity(layers.len() * 2);

    for layer in layers {
        match layer {
            Layer::InputShape { dims } => {
                let flattened = layer.flattened_units().unwrap_or_default();
                if flattened != u64::from(input_units) {
                    return Err(LoweringError::node(
                        node(),
                        format!(
                            "input shape flattens to {} features but the model expects {}",
                            flattened, input_units
                        ),
                    ));
                }
                ops.push(ModelOp::Flatten {
                    dims: dims.clone(),
                    features,
                });
            }
            Layer::Dense { units, activation } | Layer::Output { units, activation } => {
                ops.push(ModelOp::Linear {
                    in_features: features,
                    out_features: *units,
                });
                ops.push(ModelOp::Activation {
                    function: *activation,
                });
                features = *units;
            }
            Layer::Dropout { rate } => ops.push(ModelOp::Dropout { rate: *rate }),
        }
    }

    Ok(ModelAction::Sequential {
        input_features: input_units,
        output_features: features,
        ops,
    })
}
