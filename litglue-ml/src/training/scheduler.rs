//! Step-level learning-rate schedules with linear warmup.
//!
//! Each schedule is a multiplier on the base learning rate as a function of
//! the optimizer step, following the usual transformer fine-tuning recipes.

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Final learning rate of the polynomial schedule.
pub const POLYNOMIAL_LR_END: f64 = 1e-7;

/// Supported schedule shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerKind {
    #[default]
    Linear,
    Cosine,
    CosineWithRestarts,
    Polynomial,
    Constant,
    ConstantWithWarmup,
    InverseSqrt,
}

impl SchedulerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SchedulerKind::Linear => "linear",
            SchedulerKind::Cosine => "cosine",
            SchedulerKind::CosineWithRestarts => "cosine_with_restarts",
            SchedulerKind::Polynomial => "polynomial",
            SchedulerKind::Constant => "constant",
            SchedulerKind::ConstantWithWarmup => "constant_with_warmup",
            SchedulerKind::InverseSqrt => "inverse_sqrt",
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully parameterised schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LrSchedule {
    pub kind: SchedulerKind,
    pub base_lr: f64,
    pub warmup_steps: usize,
    pub total_steps: usize,
}

impl LrSchedule {
    pub fn new(
        kind: SchedulerKind,
        base_lr: f64,
        warmup_steps: usize,
        total_steps: usize,
    ) -> Result<Self> {
        if kind == SchedulerKind::Polynomial && base_lr <= POLYNOMIAL_LR_END {
            return Err(AdapterError::config(format!(
                "polynomial schedule needs learning_rate above {POLYNOMIAL_LR_END}, got {base_lr}"
            )));
        }
        Ok(Self {
            kind,
            base_lr,
            warmup_steps,
            total_steps,
        })
    }

    /// Learning-rate multiplier at `step`.
    pub fn multiplier(&self, step: usize) -> f64 {
        let warmup = self.warmup_steps;
        if step < warmup && self.kind != SchedulerKind::Constant {
            return step as f64 / warmup.max(1) as f64;
        }

        let decay_steps = self.total_steps.saturating_sub(warmup).max(1) as f64;
        let progress = (step - warmup.min(step)) as f64 / decay_steps;

        match self.kind {
            SchedulerKind::Constant | SchedulerKind::ConstantWithWarmup => 1.0,
            SchedulerKind::Linear => {
                (self.total_steps.saturating_sub(step) as f64 / decay_steps).max(0.0)
            }
            SchedulerKind::Cosine => {
                let cycles = 0.5;
                (0.5 * (1.0 + (PI * cycles * 2.0 * progress).cos())).max(0.0)
            }
            SchedulerKind::CosineWithRestarts => {
                if progress >= 1.0 {
                    return 0.0;
                }
                let cycles = 1.0;
                (0.5 * (1.0 + (PI * ((cycles * progress) % 1.0)).cos())).max(0.0)
            }
            SchedulerKind::Polynomial => {
                let lr_end = POLYNOMIAL_LR_END;
                if step > self.total_steps {
                    return lr_end / self.base_lr;
                }
                let remaining = 1.0 - progress;
                ((self.base_lr - lr_end) * remaining + lr_end) / self.base_lr
            }
            SchedulerKind::InverseSqrt => {
                let timescale = if warmup == 0 { 10_000 } else { warmup };
                let shift = (timescale - warmup) as f64;
                1.0 / ((step as f64 + shift) / timescale as f64).sqrt()
            }
        }
    }

    pub fn learning_rate(&self, step: usize) -> f64 {
        self.base_lr * self.multiplier(step)
    }
}
