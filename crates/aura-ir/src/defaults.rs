//! Canonical default values applied by the transformer.

use crate::errors::IrError;

/// Values used when a program leaves an optional field out.
///
/// `Default` returns the canonical set; callers may override individual
/// fields through `aura_core::CompilerConfig`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Defaults {
    pub epochs: u32,
    pub batch_size: u32,
    pub optimizer: String,
    pub learning_rate: f64,
    pub port: u16,
    /// Input feature count of a network model with no `input shape` line.
    pub input_units: u32,
    /// Greeting of a text model with no `output greeting` line.
    pub greeting: String,
}

pub const DEFAULT_EPOCHS: u32 = 5;
pub const DEFAULT_BATCH_SIZE: u32 = 32;
pub const DEFAULT_OPTIMIZER: &str = "adam";
pub const DEFAULT_LEARNING_RATE: f64 = 0.001;
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_INPUT_UNITS: u32 = 784;
pub const DEFAULT_GREETING: &str = "Hello!";

impl Default for Defaults {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            optimizer: DEFAULT_OPTIMIZER.to_string(),
            learning_rate: DEFAULT_LEARNING_RATE,
            port: DEFAULT_PORT,
            input_units: DEFAULT_INPUT_UNITS,
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

impl Defaults {
    /// Checks the same ranges the transformer enforces on source literals.
    pub fn validate(&self) -> Result<(), IrError> {
        let positive = [
            ("epochs", self.epochs),
            ("batch_size", self.batch_size),
            ("input_units", self.input_units),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(invalid(field, "must be at least 1"));
            }
        }
        if self.port == 0 {
            return Err(invalid("port", "must be in 1..=65535"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(invalid("learning_rate", "must be greater than 0"));
        }
        if self.optimizer.trim_start_matches(':').is_empty() {
            return Err(invalid("optimizer", "must name an optimizer"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> IrError {
    IrError::InvalidValue {
        context: format!("default {}", field),
        message: message.to_string(),
        range: None,
    }
}
