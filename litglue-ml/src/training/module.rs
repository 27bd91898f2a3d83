//! The hook surface a training-loop driver calls.

use crate::data::{SplitSource, StepOutput, TextBatch};
use crate::error::Result;
use crate::training::Stage;
use crate::training::optimizer::OptimizerPlan;
use crate::training::sink::MetricSink;

/// Step outputs collected over one epoch of a stage.
///
/// Drivers serving several dataloaders for a stage hand back one list per
/// dataloader, in dataloader order.
#[derive(Debug, Clone, PartialEq)]
pub enum EpochOutputs {
    Single(Vec<StepOutput>),
    PerDataloader(Vec<Vec<StepOutput>>),
}

impl EpochOutputs {
    pub fn is_empty(&self) -> bool {
        match self {
            EpochOutputs::Single(outputs) => outputs.is_empty(),
            EpochOutputs::PerDataloader(groups) => groups.iter().all(Vec::is_empty),
        }
    }

    /// All outputs in order, ignoring dataloader boundaries.
    pub fn flatten(&self) -> Vec<&StepOutput> {
        match self {
            EpochOutputs::Single(outputs) => outputs.iter().collect(),
            EpochOutputs::PerDataloader(groups) => groups.iter().flatten().collect(),
        }
    }
}

/// What the driver exposes to epoch-end hooks.
pub struct EpochContext<'a> {
    /// Sub-split names of the active data source, if it declares any.
    pub splits: Option<&'a dyn SplitSource>,
    pub sink: &'a mut dyn MetricSink,
}

impl<'a> EpochContext<'a> {
    pub fn new(sink: &'a mut dyn MetricSink) -> Self {
        Self { splits: None, sink }
    }

    pub fn with_splits(mut self, splits: &'a dyn SplitSource) -> Self {
        self.splits = Some(splits);
        self
    }
}

/// Hooks invoked synchronously by the loop driver, once per batch and once
/// per epoch end.
pub trait TrainingModule {
    /// Process one batch; `batch_idx` is the position within the dataloader.
    fn step(&mut self, stage: Stage, batch: &TextBatch, batch_idx: usize) -> Result<StepOutput>;

    /// Aggregate an epoch's outputs, log through `ctx.sink`, and optionally
    /// return an epoch loss.
    fn epoch_end(
        &mut self,
        stage: Stage,
        outputs: EpochOutputs,
        ctx: &mut EpochContext<'_>,
    ) -> Result<Option<f64>>;

    /// Optimizer and schedule for a run of `total_steps` optimizer steps.
    fn configure_optimizers(&self, total_steps: usize) -> Result<OptimizerPlan>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Targets;

    fn output(loss: f64) -> StepOutput {
        StepOutput {
            loss,
            preds: Targets::Classes(vec![1]),
            labels: Targets::Classes(vec![1]),
        }
    }

    #[test]
    fn test_epoch_outputs_flatten() {
        let outputs = EpochOutputs::PerDataloader(vec![vec![output(0.1)], vec![output(0.2), output(0.3)]]);
        let losses: Vec<f64> = outputs.flatten().iter().map(|o| o.loss).collect();
        assert_eq!(losses, vec![0.1, 0.2, 0.3]);
        assert!(!outputs.is_empty());
        assert!(EpochOutputs::PerDataloader(vec![vec![], vec![]]).is_empty());
        assert!(EpochOutputs::Single(Vec::new()).is_empty());
    }
}
