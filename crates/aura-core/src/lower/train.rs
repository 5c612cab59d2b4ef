//! Training job actions and the out-of-memory back-off policy.

use aura_ir::{Symbol, TrainDecl};

use crate::lower::runtime::{RuntimeFailure, TrainingRuntime};

/// Loss used when a train body declares none.
pub const DEFAULT_LOSS: &str = "cross_entropy";

/// What a training loop does when the device runs out of memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutOfMemoryPolicy {
    /// Halve the batch size (minimum 1) and retry the same epoch once. The
    /// reduced size is kept for the remaining epochs.
    #[default]
    HalveBatchAndRetryOnce,
}

impl OutOfMemoryPolicy {
    pub fn reduced_batch_size(self, batch_size: u32) -> u32 {
        match self {
            Self::HalveBatchAndRetryOnce => (batch_size / 2).max(1),
        }
    }
}

/// An epoch-bounded training loop description.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainAction {
    pub model: String,
    pub dataset: String,
    pub epochs: u32,
    pub batch_size: u32,
    pub optimizer: Symbol,
    pub learning_rate: f64,
    pub loss: Symbol,
    pub metrics: Option<Symbol>,
    /// Flattened input width of the trained model.
    pub input_features: u32,
    /// Output width of the trained model, i.e. the number of classes.
    pub output_features: u32,
    pub on_out_of_memory: OutOfMemoryPolicy,
}

/// Outcome of [`TrainAction::execute`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainReport {
    /// Loss of every completed epoch, in order.
    pub losses: Vec<f64>,
    /// Epochs that were retried after running out of memory.
    pub retried_epochs: Vec<u32>,
    /// Batch size in effect when training finished.
    pub final_batch_size: u32,
}

impl TrainAction {
    pub(crate) fn lower(
        decl: &TrainDecl,
        input_features: u32,
        output_features: u32,
    ) -> TrainAction {
        TrainAction {
            model: decl.model.clone(),
            dataset: decl.dataset.clone(),
            epochs: decl.epochs,
            batch_size: decl.batch_size,
            optimizer: decl.optimizer.clone(),
            learning_rate: decl.learning_rate,
            loss: decl
                .loss
                .clone()
                .unwrap_or_else(|| Symbol::new(DEFAULT_LOSS)),
            metrics: decl.metrics.clone(),
            input_features,
            output_features,
            on_out_of_memory: OutOfMemoryPolicy::default(),
        }
    }

    /// Runs the loop against `runtime`, applying the out-of-memory policy.
    ///
    /// A failure of the retried epoch, or any failure that is not out of
    /// memory, is returned unchanged.
    pub fn execute<R>(&self, runtime: &mut R) -> Result<TrainReport, RuntimeFailure>
    where
        R: TrainingRuntime + ?Sized,
    {
        let mut batch_size = self.batch_size;
        let mut report = TrainReport::default();

        for epoch in 1..=self.epochs {
            let loss = match runtime.run_epoch(epoch, batch_size) {
                Ok(loss) => loss,
                Err(RuntimeFailure::OutOfMemory(reason)) => {
                    let reduced = self.on_out_of_memory.reduced_batch_size(batch_size);
                    tracing::debug!(
                        model = %self.model,
                        epoch,
                        from = batch_size,
                        to = reduced,
                        %reason,
                        "out of memory, retrying epoch with a smaller batch"
                    );
                    batch_size = reduced;
                    report.retried_epochs.push(epoch);
                    runtime.run_epoch(epoch, batch_size)?
                }
                Err(other) => return Err(other),
            };
            report.losses.push(loss);
        }

        report.final_batch_size = batch_size;
        Ok(report)
    }
}
