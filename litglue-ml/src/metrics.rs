//! GLUE evaluation metrics keyed by task name.

use crate::data::Targets;
use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// GLUE benchmark tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlueTask {
    Cola,
    Sst2,
    Mrpc,
    Qqp,
    Stsb,
    Mnli,
    MnliMatched,
    MnliMismatched,
    Qnli,
    Rte,
    Wnli,
    Hans,
}

impl GlueTask {
    pub fn as_str(self) -> &'static str {
        match self {
            GlueTask::Cola => "cola",
            GlueTask::Sst2 => "sst2",
            GlueTask::Mrpc => "mrpc",
            GlueTask::Qqp => "qqp",
            GlueTask::Stsb => "stsb",
            GlueTask::Mnli => "mnli",
            GlueTask::MnliMatched => "mnli_matched",
            GlueTask::MnliMismatched => "mnli_mismatched",
            GlueTask::Qnli => "qnli",
            GlueTask::Rte => "rte",
            GlueTask::Wnli => "wnli",
            GlueTask::Hans => "hans",
        }
    }

    /// Whether the task is scored as regression (single output).
    pub fn is_regression(self) -> bool {
        self == GlueTask::Stsb
    }
}

impl fmt::Display for GlueTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric computed once per (sub-)split from concatenated predictions.
pub trait Metric {
    fn compute(&self, predictions: &Targets, references: &Targets)
    -> Result<BTreeMap<String, f64>>;
}

/// The GLUE metric set of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlueMetric {
    task: GlueTask,
}

impl GlueMetric {
    pub fn new(task: GlueTask) -> Self {
        Self { task }
    }

    pub fn task(&self) -> GlueTask {
        self.task
    }
}

impl Metric for GlueMetric {
    fn compute(
        &self,
        predictions: &Targets,
        references: &Targets,
    ) -> Result<BTreeMap<String, f64>> {
        if predictions.len() != references.len() {
            return Err(AdapterError::metric(format!(
                "{} predictions for {} references",
                predictions.len(),
                references.len()
            )));
        }

        let mut out = BTreeMap::new();
        match self.task {
            GlueTask::Cola => {
                let (p, r) = classes(predictions, references)?;
                out.insert("matthews_correlation".to_string(), matthews_corrcoef(p, r));
            }
            GlueTask::Stsb => {
                let (p, r) = (predictions.to_f64(), references.to_f64());
                out.insert("pearson".to_string(), pearson(&p, &r));
                out.insert("spearmanr".to_string(), spearman(&p, &r));
            }
            GlueTask::Mrpc | GlueTask::Qqp => {
                let (p, r) = classes(predictions, references)?;
                out.insert("accuracy".to_string(), accuracy(p, r));
                out.insert("f1".to_string(), binary_f1(p, r));
            }
            _ => {
                let (p, r) = classes(predictions, references)?;
                out.insert("accuracy".to_string(), accuracy(p, r));
            }
        }
        Ok(out)
    }
}

fn classes<'a>(predictions: &'a Targets, references: &'a Targets) -> Result<(&'a [i64], &'a [i64])> {
    match (predictions, references) {
        (Targets::Classes(p), Targets::Classes(r)) => Ok((p, r)),
        _ => Err(AdapterError::metric(
            "classification metrics need class-id predictions and references",
        )),
    }
}

pub fn accuracy(preds: &[i64], labels: &[i64]) -> f64 {
    if preds.is_empty() {
        return 0.0;
    }
    let correct = preds.iter().zip(labels).filter(|(p, l)| p == l).count();
    correct as f64 / preds.len() as f64
}

/// F1 of the positive class `1`; `0.0` when there are no positives at all.
pub fn binary_f1(preds: &[i64], labels: &[i64]) -> f64 {
    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
    for (&p, &l) in preds.iter().zip(labels) {
        match (p == 1, l == 1) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
            (false, false) => {}
        }
    }
    let denom = 2 * tp + fp + fn_;
    if denom == 0 {
        0.0
    } else {
        (2 * tp) as f64 / denom as f64
    }
}

/// Multiclass Matthews correlation coefficient; `0.0` when undefined.
pub fn matthews_corrcoef(preds: &[i64], labels: &[i64]) -> f64 {
    let mut pred_counts: BTreeMap<i64, f64> = BTreeMap::new();
    let mut true_counts: BTreeMap<i64, f64> = BTreeMap::new();
    let mut correct = 0.0;
    for (&p, &l) in preds.iter().zip(labels) {
        *pred_counts.entry(p).or_default() += 1.0;
        *true_counts.entry(l).or_default() += 1.0;
        if p == l {
            correct += 1.0;
        }
    }
    let samples = preds.len() as f64;
    let pk_tk: f64 = pred_counts
        .iter()
        .map(|(k, p)| p * true_counts.get(k).copied().unwrap_or(0.0))
        .sum();
    let pk2: f64 = pred_counts.values().map(|p| p * p).sum();
    let tk2: f64 = true_counts.values().map(|t| t * t).sum();

    let cov_ytyp = correct * samples - pk_tk;
    let cov_ypyp = samples * samples - pk2;
    let cov_ytyt = samples * samples - tk2;
    let denom = (cov_ypyp * cov_ytyt).sqrt();
    if denom == 0.0 { 0.0 } else { cov_ytyp / denom }
}

/// Pearson correlation; `NaN` when either side is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    if x.is_empty() {
        return f64::NAN;
    }
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mean_x, b - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    cov / (var_x * var_y).sqrt()
}

/// Spearman rank correlation with average ranks for ties.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    pearson(&average_ranks(x), &average_ranks(y))
}

fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // ranks are 1-based; tied run i..=j shares the mean rank
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}
