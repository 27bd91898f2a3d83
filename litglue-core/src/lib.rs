//! # litglue-core
//!
//! Configuration plumbing for the litglue launcher: the per-subcommand
//! configuration tree, layered loading, the pre-instantiation resolver that
//! derives run directories and callback monitoring, the on-disk run layout,
//! and persistence of the resolved tree.

pub mod config;
pub mod error;
pub mod layout;
pub mod loader;
pub mod monitor;
pub mod persistence;
pub mod resolve;
pub mod settings;

pub use config::{
    CallbackDescriptor, LoggerArgs, LoggerDescriptor, LoggerSetting, LoggerVersion, RunConfig,
    Subcommand, TrainerConfig,
};
pub use error::{ConfigError, Result};
pub use layout::RunLayout;
pub use loader::{CliOverrides, LoadRequest, load_run_config};
pub use monitor::{CallbackKind, MetricMode, infer_metric_mode};
pub use persistence::save_resolved_config;
pub use resolve::{MonitorTarget, ResolvedCallback, ResolvedRun, RunMode, before_instantiate};
pub use settings::LauncherSettings;
