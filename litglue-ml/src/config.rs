//! Hyper-parameters of the GLUE training adapter.

use crate::error::{AdapterError, Result};
use crate::metrics::GlueTask;
use crate::training::SchedulerKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Settings read from the `model` section of a run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlueTransformerSettings {
    pub task_name: GlueTask,
    /// Local model directory or tokenizer file.
    pub model_name_or_path: String,
    pub num_labels: usize,
    /// Fixed encoding length; the model's maximum when unset.
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_adam_epsilon")]
    pub adam_epsilon: f64,
    #[serde(default)]
    pub warmup_steps: usize,
    #[serde(default)]
    pub weight_decay: f64,
    #[serde(default)]
    pub scheduler_type: SchedulerKind,
}

fn default_learning_rate() -> f64 {
    2e-5
}

fn default_adam_epsilon() -> f64 {
    1e-8
}

impl GlueTransformerSettings {
    pub fn new(task_name: GlueTask, model_name_or_path: impl Into<String>, num_labels: usize) -> Self {
        Self {
            task_name,
            model_name_or_path: model_name_or_path.into(),
            num_labels,
            max_length: None,
            learning_rate: default_learning_rate(),
            adam_epsilon: default_adam_epsilon(),
            warmup_steps: 0,
            weight_decay: 0.0,
            scheduler_type: SchedulerKind::default(),
        }
    }

    /// Parse a `model` section. Accepts either the arguments directly or a
    /// `{class_path, init_args}` descriptor.
    pub fn from_init_args(model: &Map<String, Value>) -> Result<Self> {
        let args = match model.get("init_args") {
            Some(Value::Object(inner)) => inner.clone(),
            _ => model.clone(),
        };
        let settings: Self = serde_json::from_value(Value::Object(args))
            .map_err(|e| AdapterError::config(format!("invalid model settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_labels == 0 {
            return Err(AdapterError::config("num_labels must be at least 1"));
        }
        if self.task_name.is_regression() && self.num_labels != 1 {
            tracing::warn!(
                task = %self.task_name,
                num_labels = self.num_labels,
                "regression task configured with more than one label"
            );
        }
        if self.learning_rate <= 0.0 {
            return Err(AdapterError::config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.adam_epsilon <= 0.0 {
            return Err(AdapterError::config(format!(
                "adam_epsilon must be positive, got {}",
                self.adam_epsilon
            )));
        }
        if self.weight_decay < 0.0 {
            return Err(AdapterError::config(format!(
                "weight_decay must not be negative, got {}",
                self.weight_decay
            )));
        }
        if self.max_length == Some(0) {
            return Err(AdapterError::config("max_length must be positive"));
        }
        Ok(())
    }

    /// Whether predictions are scalar scores rather than class ids.
    pub fn is_regression(&self) -> bool {
        self.num_labels == 1
    }
}
