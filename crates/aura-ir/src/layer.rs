//! Network layer IR.

use std::fmt;

/// Activation function applied after an affine layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Activation {
    #[default]
    Relu,
    Sigmoid,
    Softmax,
    Tanh,
    Gelu,
    Identity,
}

impl Activation {
    pub const ALL: [Activation; 6] = [
        Self::Relu,
        Self::Sigmoid,
        Self::Softmax,
        Self::Tanh,
        Self::Gelu,
        Self::Identity,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Relu => "relu",
            Self::Sigmoid => "sigmoid",
            Self::Softmax => "softmax",
            Self::Tanh => "tanh",
            Self::Gelu => "gelu",
            Self::Identity => "identity",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One layer of a network model, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// Input dimensions; always flattened to their product.
    InputShape { dims: Vec<u32> },
    /// Fully connected hidden layer.
    Dense { units: u32, activation: Activation },
    /// Dropout with rate in `[0, 1)`.
    Dropout { rate: f64 },
    /// Fully connected output layer. The activation has no default.
    Output { units: u32, activation: Activation },
}

impl Layer {
    /// Number of features produced when this is an input shape.
    pub fn flattened_units(&self) -> Option<u64> {
        match self {
            Self::InputShape { dims } => Some(dims.iter().map(|&d| u64::from(d)).product()),
            _ => None,
        }
    }
}
