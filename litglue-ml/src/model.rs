//! The sequence-classification model seam.

use crate::data::Features;
use crate::error::Result;

/// Loss and per-row logits of one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierOutput {
    pub loss: f64,
    /// `[batch, num_labels]`
    pub logits: Vec<Vec<f32>>,
}

/// A transformer with a classification (or regression) head.
pub trait SequenceClassifier {
    fn forward(&mut self, features: &Features) -> Result<ClassifierOutput>;

    /// Parameter names, used to build weight-decay groups.
    fn named_parameters(&self) -> Vec<String>;

    /// Longest input the model accepts.
    fn max_sequence_length(&self) -> usize;
}
