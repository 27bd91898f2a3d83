//! Sequence-classification adapter for GLUE tasks.
//!
//! [`GlueTransformer`] turns text batches into fixed-length features, runs
//! the wrapped model, derives predictions from logits, and aggregates each
//! epoch into a loss plus the task's GLUE metrics. Datasets that split a
//! stage into several named sub-splits (MNLI matched/mismatched) are
//! aggregated and logged per sub-split.

use crate::config::GlueTransformerSettings;
use crate::data::{
    Features, HfTextEncoder, StepOutput, Targets, TextBatch, TextEncoder, split_suffix,
};
use crate::error::{AdapterError, Result};
use crate::metrics::{GlueMetric, Metric};
use crate::model::SequenceClassifier;
use crate::training::module::{EpochContext, EpochOutputs, TrainingModule};
use crate::training::optimizer::{
    AdamWPlan, Interval, OptimizerPlan, SchedulerPlan, group_parameters,
};
use crate::training::scheduler::LrSchedule;
use crate::training::Stage;
use std::collections::BTreeMap;
use std::path::Path;

/// Training adapter wrapping a classifier, its text encoder, and a metric.
pub struct GlueTransformer<M, E> {
    settings: GlueTransformerSettings,
    model: M,
    encoder: E,
    metric: Box<dyn Metric>,
}

impl<M: SequenceClassifier, E: TextEncoder> GlueTransformer<M, E> {
    /// The encoder must produce rows of the configured `max_length`, or of
    /// the model's maximum when none is configured.
    pub fn new(settings: GlueTransformerSettings, model: M, encoder: E) -> Result<Self> {
        settings.validate()?;
        let expected = settings
            .max_length
            .unwrap_or_else(|| model.max_sequence_length());
        if encoder.max_length() != expected {
            return Err(AdapterError::config(format!(
                "encoder pads to {} tokens, expected {expected}",
                encoder.max_length()
            )));
        }
        let metric = Box::new(GlueMetric::new(settings.task_name));
        tracing::debug!(
            task = %settings.task_name,
            num_labels = settings.num_labels,
            max_length = expected,
            "glue adapter ready"
        );
        Ok(Self {
            settings,
            model,
            encoder,
            metric,
        })
    }

    /// Replace the task's GLUE metric.
    pub fn with_metric(mut self, metric: Box<dyn Metric>) -> Self {
        self.metric = metric;
        self
    }

    pub fn settings(&self) -> &GlueTransformerSettings {
        &self.settings
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Encode `batch.text` to fixed length and attach the labels unchanged.
    pub fn convert_to_features(&self, batch: &TextBatch) -> Result<Features> {
        if batch.text.len() != batch.labels.len() {
            return Err(AdapterError::shape(format!(
                "{} texts with {} labels",
                batch.text.len(),
                batch.labels.len()
            )));
        }

        let max_length = self.encoder.max_length();
        let rows = self.encoder.encode_fixed(&batch.text)?;
        if rows.len() != batch.text.len() {
            return Err(AdapterError::tokenizer(format!(
                "encoded {} rows for {} texts",
                rows.len(),
                batch.text.len()
            )));
        }

        let mut features = Features {
            input_ids: Vec::with_capacity(rows.len()),
            attention_mask: Vec::with_capacity(rows.len()),
            token_type_ids: Vec::with_capacity(rows.len()),
            labels: batch.labels.clone(),
        };
        for row in rows {
            if row.input_ids.len() != max_length {
                return Err(AdapterError::tokenizer(format!(
                    "row encoded to {} tokens, expected {max_length}",
                    row.input_ids.len()
                )));
            }
            features.input_ids.push(row.input_ids);
            features.attention_mask.push(row.attention_mask);
            features.token_type_ids.push(row.token_type_ids);
        }
        Ok(features)
    }

    /// Forward one batch and derive predictions. Shared by every stage.
    pub fn shared_step(&mut self, batch: &TextBatch) -> Result<StepOutput> {
        let features = self.convert_to_features(batch)?;
        let output = self.model.forward(&features)?;
        if output.logits.len() != features.batch_size() {
            return Err(AdapterError::model(format!(
                "model returned {} logit rows for a batch of {}",
                output.logits.len(),
                features.batch_size()
            )));
        }
        let preds = predict_from_logits(self.settings.num_labels, &output.logits)?;
        let labels = if self.settings.is_regression() {
            features.labels.into_scores()
        } else {
            features.labels
        };
        Ok(StepOutput {
            loss: output.loss,
            preds,
            labels,
        })
    }

    /// Mean loss and metric values over `outputs`.
    fn aggregate(&self, outputs: &[&StepOutput]) -> Result<(f64, BTreeMap<String, f64>)> {
        let preds = Targets::concat(outputs.iter().map(|o| &o.preds))?;
        let labels = Targets::concat(outputs.iter().map(|o| &o.labels))?;
        let loss = outputs.iter().map(|o| o.loss).sum::<f64>() / outputs.len() as f64;
        let metrics = self.metric.compute(&preds, &labels)?;
        Ok((loss, metrics))
    }
}

impl<M: SequenceClassifier> GlueTransformer<M, HfTextEncoder> {
    /// Load the tokenizer shipped with `settings.model_name_or_path`.
    pub fn from_tokenizer(settings: GlueTransformerSettings, model: M) -> Result<Self> {
        let max_length = settings
            .max_length
            .unwrap_or_else(|| model.max_sequence_length());
        let encoder =
            HfTextEncoder::from_pretrained_path(Path::new(&settings.model_name_or_path), max_length)?;
        Self::new(settings, model, encoder)
    }
}

/// Predictions from `[batch, num_labels]` logits: argmax class ids when
/// there are several labels, the squeezed score when there is one.
pub fn predict_from_logits(num_labels: usize, logits: &[Vec<f32>]) -> Result<Targets> {
    if let Some(row) = logits.iter().find(|row| row.len() != num_labels) {
        return Err(AdapterError::shape(format!(
            "logit row has {} values, expected {num_labels}",
            row.len()
        )));
    }
    match num_labels {
        0 => Err(AdapterError::config("num_labels must be at least 1")),
        1 => Ok(Targets::Scores(logits.iter().map(|row| row[0]).collect())),
        _ => Ok(Targets::Classes(
            logits.iter().map(|row| argmax(row) as i64).collect(),
        )),
    }
}

/// First index of the largest value.
fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, &value) in row.iter().enumerate().skip(1) {
        if value > row[best] {
            best = i;
        }
    }
    best
}

impl<M: SequenceClassifier, E: TextEncoder> TrainingModule for GlueTransformer<M, E> {
    fn step(&mut self, stage: Stage, batch: &TextBatch, batch_idx: usize) -> Result<StepOutput> {
        let output = self.shared_step(batch)?;
        tracing::trace!(%stage, batch_idx, loss = output.loss, "step");
        Ok(output)
    }

    fn epoch_end(
        &mut self,
        stage: Stage,
        outputs: EpochOutputs,
        ctx: &mut EpochContext<'_>,
    ) -> Result<Option<f64>> {
        if outputs.is_empty() {
            return Err(AdapterError::EmptyEpoch(stage.to_string()));
        }

        let sub_splits = ctx
            .splits
            .and_then(|source| source.splits(stage))
            .filter(|splits| splits.len() > 1);

        if let Some(splits) = sub_splits {
            let EpochOutputs::PerDataloader(groups) = outputs else {
                return Err(AdapterError::shape(format!(
                    "{stage} has {} sub-splits but outputs were not grouped per dataloader",
                    splits.len()
                )));
            };
            if groups.len() > splits.len() {
                return Err(AdapterError::shape(format!(
                    "{} dataloader outputs for {} {stage} sub-splits",
                    groups.len(),
                    splits.len()
                )));
            }

            // The epoch loss is that of the last sub-split processed.
            let mut last_loss = None;
            for (split, group) in splits.iter().zip(&groups) {
                if group.is_empty() {
                    return Err(AdapterError::EmptyEpoch(format!("{stage}/{split}")));
                }
                let suffix = split_suffix(split);
                let refs: Vec<&StepOutput> = group.iter().collect();
                let (loss, metrics) = self.aggregate(&refs)?;

                ctx.sink.log(&format!("{stage}/{suffix}_loss"), loss, false);
                for (name, value) in metrics {
                    ctx.sink
                        .log(&format!("{stage}/{suffix}_{name}"), value, true);
                }
                last_loss = Some(loss);
            }
            return Ok(last_loss);
        }

        let (loss, metrics) = self.aggregate(&outputs.flatten())?;
        ctx.sink.log(&format!("{stage}/loss"), loss, false);
        for (name, value) in metrics {
            ctx.sink.log(&format!("{stage}/{name}"), value, true);
        }
        Ok(None)
    }

    fn configure_optimizers(&self, total_steps: usize) -> Result<OptimizerPlan> {
        let settings = &self.settings;
        let param_groups = group_parameters(self.model.named_parameters(), settings.weight_decay);
        let schedule = LrSchedule::new(
            settings.scheduler_type,
            settings.learning_rate,
            settings.warmup_steps,
            total_steps,
        )?;
        if settings.warmup_steps > total_steps {
            tracing::warn!(
                warmup_steps = settings.warmup_steps,
                total_steps,
                "warmup is longer than the whole run"
            );
        }

        Ok(OptimizerPlan {
            optimizer: AdamWPlan {
                learning_rate: settings.learning_rate,
                epsilon: settings.adam_epsilon,
                param_groups,
            },
            scheduler: SchedulerPlan {
                schedule,
                interval: Interval::Step,
                frequency: 1,
            },
        })
    }
}
