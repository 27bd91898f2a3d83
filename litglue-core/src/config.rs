//! Configuration tree for a single subcommand.
//!
//! The tree mirrors the declarative schema handed to the loop driver: a
//! `trainer` section with logger and callback descriptors (class paths plus
//! init args), and free-form `model` / `data` init-arg maps. Fields the
//! launcher never touches are carried through untouched in `extra` maps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// Subcommands exposed by the launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subcommand {
    Fit,
    Validate,
    Test,
}

impl Subcommand {
    pub const ALL: [Subcommand; 3] = [Subcommand::Fit, Subcommand::Validate, Subcommand::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Subcommand::Fit => "fit",
            Subcommand::Validate => "validate",
            Subcommand::Test => "test",
        }
    }
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration tree of one subcommand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Experiment name, propagated into every logger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Metric watched by early-stopping and checkpoint callbacks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor: Option<String>,
    /// Debug runs write under `<results>/debug` with no logger and no saved config.
    #[serde(default)]
    pub debug: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_everything: Option<u64>,
    #[serde(default)]
    pub trainer: TrainerConfig,
    /// Init args of the training adapter.
    #[serde(default)]
    pub model: Map<String, Value>,
    /// Init args of the data module.
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Trainer section of the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_root_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<LoggerSetting>,
    #[serde(default)]
    pub callbacks: Vec<CallbackDescriptor>,
    /// Remaining trainer flags (`max_epochs`, `accelerator`, ...), passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `trainer.logger` value: a flag, one logger, or several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoggerSetting {
    Flag(bool),
    Many(Vec<LoggerDescriptor>),
    Single(LoggerDescriptor),
}

impl LoggerSetting {
    /// Configured logger descriptors; empty for a flag.
    pub fn descriptors(&self) -> &[LoggerDescriptor] {
        match self {
            LoggerSetting::Flag(_) => &[],
            LoggerSetting::Many(loggers) => loggers,
            LoggerSetting::Single(logger) => std::slice::from_ref(logger),
        }
    }

    pub fn descriptors_mut(&mut self) -> &mut [LoggerDescriptor] {
        match self {
            LoggerSetting::Flag(_) => &mut [],
            LoggerSetting::Many(loggers) => loggers,
            LoggerSetting::Single(logger) => std::slice::from_mut(logger),
        }
    }
}

/// A logger identified by class path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerDescriptor {
    pub class_path: String,
    #[serde(default)]
    pub init_args: LoggerArgs,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggerArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<LoggerVersion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Logger versions are either plain integers or free-form labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoggerVersion {
    Number(u64),
    Label(String),
}

impl fmt::Display for LoggerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerVersion::Number(n) => write!(f, "version_{n}"),
            LoggerVersion::Label(label) => f.write_str(label),
        }
    }
}

/// A callback identified by class path, with its raw init args.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackDescriptor {
    pub class_path: String,
    #[serde(default)]
    pub init_args: Map<String, Value>,
}

impl CallbackDescriptor {
    pub fn new(class_path: impl Into<String>) -> Self {
        Self {
            class_path: class_path.into(),
            init_args: Map::new(),
        }
    }

    pub fn with_arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.init_args.insert(key.to_string(), value.into());
        self
    }

    /// String-valued init arg, if present.
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.init_args.get(key).and_then(Value::as_str)
    }
}
