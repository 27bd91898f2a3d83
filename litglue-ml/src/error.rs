//! Error types for the litglue-ml crate.

use thiserror::Error;

/// Errors raised by the training adapter and its collaborators.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Metric error: {0}")]
    Metric(String),

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No step outputs to aggregate for {0}")]
    EmptyEpoch(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl AdapterError {
    pub fn tokenizer(msg: impl Into<String>) -> Self {
        Self::Tokenizer(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    pub fn metric(msg: impl Into<String>) -> Self {
        Self::Metric(msg.into())
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type Result<T, E = AdapterError> = std::result::Result<T, E>;
