//! Shared fixtures for the Aura integration tests: demo programs and
//! scripted runtimes standing in for the tensor engine.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::PathBuf;

use aura_core::lower::{InferenceRuntime, RuntimeFailure, TrainingRuntime};

/// Directory holding the `.aura` demo programs.
pub fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos")
}

pub fn read_demo(name: &str) -> io::Result<String> {
    fs::read_to_string(demos_dir().join(name))
}

/// Every demo as `(file name, source)`, sorted by name.
pub fn all_demos() -> io::Result<Vec<(String, String)>> {
    let mut demos = Vec::new();
    for entry in fs::read_dir(demos_dir())? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("aura") {
            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            demos.push((name, fs::read_to_string(&path)?));
        }
    }
    demos.sort();
    Ok(demos)
}

/// Inference runtime returning the same output row for every model, and
/// recording the inputs it was given.
#[derive(Debug, Default)]
pub struct FixedOutput {
    pub output: Vec<f64>,
    pub calls: RefCell<Vec<(String, Vec<f64>)>>,
}

impl FixedOutput {
    pub fn new(output: Vec<f64>) -> Self {
        Self {
            output,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl InferenceRuntime for FixedOutput {
    fn forward(&self, model: &str, input: &[f64]) -> Result<Vec<f64>, RuntimeFailure> {
        self.calls
            .borrow_mut()
            .push((model.to_string(), input.to_vec()));
        Ok(self.output.clone())
    }
}

/// Training runtime that runs out of memory above `capacity` and records
/// every `(epoch, batch_size)` attempt.
#[derive(Debug)]
pub struct MemoryLimited {
    pub capacity: u32,
    pub attempts: Vec<(u32, u32)>,
}

impl MemoryLimited {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            attempts: Vec::new(),
        }
    }
}

impl TrainingRuntime for MemoryLimited {
    fn run_epoch(&mut self, epoch: u32, batch_size: u32) -> Result<f64, RuntimeFailure> {
        self.attempts.push((epoch, batch_size));
        if batch_size > self.capacity {
            Err(RuntimeFailure::OutOfMemory(format!(
                "tried to allocate a batch of {}",
                batch_size
            )))
        } else {
            Ok(1.0 / f64::from(epoch))
        }
    }
}
