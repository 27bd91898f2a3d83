//! Batch records exchanged between the loop driver, the adapter, and the model.

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};

/// A column of labels or predictions: class ids, or regression scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Targets {
    Classes(Vec<i64>),
    Scores(Vec<f32>),
}

impl Targets {
    pub fn len(&self) -> usize {
        match self {
            Targets::Classes(v) => v.len(),
            Targets::Scores(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values widened to `f64`, for correlation metrics.
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Targets::Classes(v) => v.iter().map(|&x| x as f64).collect(),
            Targets::Scores(v) => v.iter().map(|&x| f64::from(x)).collect(),
        }
    }

    /// The column as regression scores. Whole-number score labels deserialize
    /// as class ids, so regression tasks normalise through this.
    pub fn into_scores(self) -> Targets {
        match self {
            Targets::Classes(v) => Targets::Scores(v.into_iter().map(|x| x as f32).collect()),
            scores @ Targets::Scores(_) => scores,
        }
    }

    /// Concatenate columns of the same kind, in order.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a Targets>) -> Result<Targets> {
        let mut parts = parts.into_iter();
        let first = parts
            .next()
            .ok_or_else(|| AdapterError::shape("cannot concatenate zero target columns"))?;
        let mut out = first.clone();
        for part in parts {
            match (&mut out, part) {
                (Targets::Classes(acc), Targets::Classes(v)) => acc.extend_from_slice(v),
                (Targets::Scores(acc), Targets::Scores(v)) => acc.extend_from_slice(v),
                _ => {
                    return Err(AdapterError::shape(
                        "cannot concatenate class ids with regression scores",
                    ));
                }
            }
        }
        Ok(out)
    }
}

/// Raw text batch as produced by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBatch {
    pub text: Vec<String>,
    pub labels: Targets,
}

/// Tokenized batch; every row has the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub input_ids: Vec<Vec<u32>>,
    pub attention_mask: Vec<Vec<u32>>,
    pub token_type_ids: Vec<Vec<u32>>,
    pub labels: Targets,
}

impl Features {
    pub fn batch_size(&self) -> usize {
        self.input_ids.len()
    }

    pub fn seq_len(&self) -> usize {
        self.input_ids.first().map_or(0, Vec::len)
    }
}

/// Per-batch result consumed by the epoch-end aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    pub loss: f64,
    pub preds: Targets,
    pub labels: Targets,
}
