//! Optimizer planning: weight-decay parameter groups for AdamW plus the
//! step-level schedule the loop driver applies.

use crate::training::scheduler::LrSchedule;
use serde::{Deserialize, Serialize};

/// Parameter-name fragments excluded from weight decay.
pub const NO_DECAY: &[&str] = &["bias", "LayerNorm.weight"];

/// Parameters sharing one weight-decay setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGroup {
    pub params: Vec<String>,
    pub weight_decay: f64,
}

/// AdamW over grouped parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdamWPlan {
    pub learning_rate: f64,
    pub epsilon: f64,
    pub param_groups: Vec<ParamGroup>,
}

/// How often the driver advances the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Step,
    Epoch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerPlan {
    pub schedule: LrSchedule,
    pub interval: Interval,
    pub frequency: usize,
}

/// Everything the driver needs to build its optimizer and scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerPlan {
    pub optimizer: AdamWPlan,
    pub scheduler: SchedulerPlan,
}

/// Whether a parameter is exempt from weight decay.
pub fn is_no_decay(name: &str) -> bool {
    NO_DECAY.iter().any(|fragment| name.contains(fragment))
}

/// Split parameters into `[decayed, not decayed]` groups.
pub fn group_parameters<I>(names: I, weight_decay: f64) -> Vec<ParamGroup>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let (no_decay, decay): (Vec<String>, Vec<String>) = names
        .into_iter()
        .map(Into::into)
        .partition(|name| is_no_decay(name));
    vec![
        ParamGroup {
            params: decay,
            weight_decay,
        },
        ParamGroup {
            params: no_decay,
            weight_decay: 0.0,
        },
    ]
}
