//! # litglue-ml
//!
//! Training adapter for transformer sequence classifiers on GLUE tasks:
//! fixed-length feature conversion, per-batch prediction, per-split epoch
//! aggregation with GLUE metrics, and AdamW/schedule planning for the loop
//! driver. Model execution and the loop itself stay behind the
//! [`SequenceClassifier`] and [`TrainingModule`] seams.

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model;
pub mod training;

pub use config::GlueTransformerSettings;
pub use data::{
    EncodedText, Features, HfTextEncoder, NamedSplits, SplitSource, StepOutput, Targets,
    TextBatch, TextEncoder,
};
pub use error::{AdapterError, Result};
pub use metrics::{GlueMetric, GlueTask, Metric};
pub use model::{ClassifierOutput, SequenceClassifier};
pub use training::{
    EpochContext, EpochOutputs, GlueTransformer, LrSchedule, MetricSink, OptimizerPlan,
    RecordedMetrics, SchedulerKind, Stage, TracingSink, TrainingModule,
};
