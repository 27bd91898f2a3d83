//! Training hooks: the module trait the loop driver calls, the GLUE adapter,
//! metric sinks, and optimizer/scheduler planning.

pub mod glue;
pub mod module;
pub mod optimizer;
pub mod scheduler;
pub mod sink;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use glue::{GlueTransformer, predict_from_logits};
pub use module::{EpochContext, EpochOutputs, TrainingModule};
pub use optimizer::{AdamWPlan, Interval, OptimizerPlan, ParamGroup, SchedulerPlan, group_parameters};
pub use scheduler::{LrSchedule, SchedulerKind};
pub use sink::{LoggedMetric, MetricSink, RecordedMetrics, TracingSink};

/// Loop phase a hook is called for. Its name prefixes every logged key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Train,
    Val,
    Test,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Train => "train",
            Stage::Val => "val",
            Stage::Test => "test",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
