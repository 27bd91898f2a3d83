//! Error types for launcher configuration.
//!
//! Every variant is fatal: the launcher aborts before any model, logger, or
//! optimizer is constructed.

use std::path::PathBuf;

/// Errors raised while loading, resolving, or persisting a run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("should assign trainer.logger with the specific logger.")]
    LoggerFlag,

    #[error(
        "monitor must be defined for callback '{class_path}': its mode is inferred from the monitored metric"
    )]
    MissingMonitor { class_path: String },

    #[error("config file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("unsupported config file format (expected .yaml, .yml, .toml or .json): {}", path.display())]
    UnknownFormat { path: PathBuf },

    #[error("invalid override '{raw}': {reason}")]
    InvalidOverride { raw: String, reason: String },

    #[error("config already saved at {}; pass --overwrite-config to replace it", path.display())]
    ConfigExists { path: PathBuf },

    #[error("failed to extract configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
