//! Monitored-metric conventions: mode inference and the callback kinds that
//! watch a metric.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metric name fragments for which a lower value is better.
pub const LOWER_IS_BETTER: &[&str] = &["loss"];

/// Whether a monitored metric is minimised or maximised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricMode {
    Min,
    Max,
}

impl MetricMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricMode::Min => "min",
            MetricMode::Max => "max",
        }
    }
}

impl fmt::Display for MetricMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Infer the mode of a metric from its name (case-insensitive).
pub fn infer_metric_mode(metric: &str) -> MetricMode {
    let metric = metric.to_lowercase();
    if LOWER_IS_BETTER.iter().any(|m| metric.contains(m)) {
        MetricMode::Min
    } else {
        MetricMode::Max
    }
}

/// Callback kinds, by the last segment of their class path.
///
/// Callbacks outside the known set resolve to `Other` and pass through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallbackKind {
    EarlyStopping,
    ModelCheckpoint,
    LearningRateMonitor,
    RichProgressBar,
    RichModelSummary,
    Other,
}

impl CallbackKind {
    pub const ALL: [CallbackKind; 5] = [
        CallbackKind::EarlyStopping,
        CallbackKind::ModelCheckpoint,
        CallbackKind::LearningRateMonitor,
        CallbackKind::RichProgressBar,
        CallbackKind::RichModelSummary,
    ];

    /// Resolve a kind from the last segment of a dotted class path.
    pub fn from_class_path(class_path: &str) -> Self {
        let type_name = class_path.rsplit('.').next().unwrap_or(class_path);
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == type_name)
            .unwrap_or(CallbackKind::Other)
    }

    pub fn type_name(self) -> &'static str {
        match self {
            CallbackKind::EarlyStopping => "EarlyStopping",
            CallbackKind::ModelCheckpoint => "ModelCheckpoint",
            CallbackKind::LearningRateMonitor => "LearningRateMonitor",
            CallbackKind::RichProgressBar => "RichProgressBar",
            CallbackKind::RichModelSummary => "RichModelSummary",
            CallbackKind::Other => "Other",
        }
    }

    /// Stopping and checkpoint callbacks watch a metric and need `monitor`/`mode`.
    pub fn watches_metric(self) -> bool {
        matches!(
            self,
            CallbackKind::EarlyStopping | CallbackKind::ModelCheckpoint
        )
    }
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
