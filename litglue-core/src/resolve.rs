//! Pre-instantiation resolution of the configuration tree.
//!
//! [`before_instantiate`] is the single point where the tree is mutated: it
//! derives the run root, applies the debug override, namespaces logger
//! directories by subcommand, and fills `monitor`/`mode` on metric-watching
//! callbacks. The tree is owned by the returned [`ResolvedRun`] afterwards.

use crate::config::{LoggerDescriptor, LoggerSetting, RunConfig, Subcommand};
use crate::error::{ConfigError, Result};
use crate::monitor::{CallbackKind, MetricMode, infer_metric_mode};
use crate::settings::LauncherSettings;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a run's artifacts land: `debug`, or the subcommand name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Debug,
    Stage(Subcommand),
}

impl RunMode {
    pub fn select(debug: bool, subcommand: Subcommand) -> Self {
        if debug {
            RunMode::Debug
        } else {
            RunMode::Stage(subcommand)
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Debug => "debug",
            RunMode::Stage(subcommand) => subcommand.as_str(),
        }
    }

    /// `<results_root>/<mode>`.
    pub fn root_dir(self, results_root: &Path) -> PathBuf {
        results_root.join(self.as_str())
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RunMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Metric a callback watches and the direction it optimises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorTarget {
    pub monitor: String,
    pub mode: MetricMode,
}

/// A callback after class-path dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCallback {
    pub kind: CallbackKind,
    pub class_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<MonitorTarget>,
    pub init_args: Map<String, Value>,
}

impl ResolvedCallback {
    /// Explicit checkpoint directory of a `ModelCheckpoint`.
    pub fn dirpath(&self) -> Option<PathBuf> {
        if self.kind != CallbackKind::ModelCheckpoint {
            return None;
        }
        self.init_args
            .get("dirpath")
            .and_then(Value::as_str)
            .map(PathBuf::from)
    }
}

/// A validated configuration tree, ready to be turned into live objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRun {
    pub subcommand: Subcommand,
    pub mode: RunMode,
    /// Whether the resolved tree should be persisted next to the run's logs.
    pub save_config: bool,
    pub callbacks: Vec<ResolvedCallback>,
    pub config: RunConfig,
}

impl ResolvedRun {
    pub fn root_dir(&self) -> &Path {
        self.config
            .trainer
            .default_root_dir
            .as_deref()
            .unwrap_or_else(|| Path::new("."))
    }

    pub fn loggers(&self) -> &[LoggerDescriptor] {
        self.config
            .trainer
            .logger
            .as_ref()
            .map(LoggerSetting::descriptors)
            .unwrap_or(&[])
    }
}

/// Mutate and validate `config` for `subcommand`.
pub fn before_instantiate(
    mut config: RunConfig,
    subcommand: Subcommand,
    settings: &LauncherSettings,
) -> Result<ResolvedRun> {
    let mode = RunMode::select(config.debug, subcommand);
    let root_dir = mode.root_dir(&settings.results_root);
    config.trainer.default_root_dir = Some(root_dir.clone());

    let mut save_config = true;
    if config.debug {
        save_config = false;
        if config.trainer.logger.take().is_some() {
            tracing::debug!("debug run: configured logger dropped");
        }
    }

    namespace_loggers(&mut config, subcommand, &settings.results_root)?;
    let callbacks = resolve_callbacks(&mut config)?;

    tracing::info!(
        subcommand = %subcommand,
        mode = %mode,
        root_dir = %root_dir.display(),
        callbacks = callbacks.len(),
        "configuration resolved"
    );

    Ok(ResolvedRun {
        subcommand,
        mode,
        save_config,
        callbacks,
        config,
    })
}

fn namespace_loggers(
    config: &mut RunConfig,
    subcommand: Subcommand,
    results_root: &Path,
) -> Result<()> {
    let name = config.name.clone();
    let Some(logger) = config.trainer.logger.as_mut() else {
        return Ok(());
    };
    match *logger {
        LoggerSetting::Flag(true) => return Err(ConfigError::LoggerFlag),
        LoggerSetting::Flag(false) => return Ok(()),
        LoggerSetting::Many(_) | LoggerSetting::Single(_) => {}
    }

    for descriptor in logger.descriptors_mut() {
        let args = &mut descriptor.init_args;
        let base = args
            .save_dir
            .take()
            .unwrap_or_else(|| results_root.to_path_buf());
        args.save_dir = Some(base.join(subcommand.as_str()));
        if let Some(name) = &name {
            args.name = Some(name.clone());
        }
    }
    Ok(())
}

fn resolve_callbacks(config: &mut RunConfig) -> Result<Vec<ResolvedCallback>> {
    let monitor = config.monitor.as_deref().filter(|m| !m.is_empty());
    let mut resolved = Vec::with_capacity(config.trainer.callbacks.len());

    for cb in &mut config.trainer.callbacks {
        let kind = CallbackKind::from_class_path(&cb.class_path);

        let target = if kind.watches_metric() {
            let monitor = monitor.ok_or_else(|| ConfigError::MissingMonitor {
                class_path: cb.class_path.clone(),
            })?;
            let mode = infer_metric_mode(monitor);
            cb.init_args
                .insert("mode".to_string(), Value::from(mode.as_str()));
            cb.init_args
                .insert("monitor".to_string(), Value::from(monitor));
            Some(MonitorTarget {
                monitor: monitor.to_string(),
                mode,
            })
        } else {
            None
        };

        resolved.push(ResolvedCallback {
            kind,
            class_path: cb.class_path.clone(),
            target,
            init_args: cb.init_args.clone(),
        });
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CallbackDescriptor, LoggerArgs};
    use pretty_assertions::assert_eq;

    fn tensorboard(save_dir: Option<&str>) -> LoggerDescriptor {
        LoggerDescriptor {
            class_path: "pytorch_lightning.loggers.TensorBoardLogger".into(),
            init_args: LoggerArgs {
                save_dir: save_dir.map(PathBuf::from),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_root_dir_follows_subcommand() {
        let run = before_instantiate(
            RunConfig::default(),
            Subcommand::Fit,
            &LauncherSettings::default(),
        )
        .unwrap();
        assert_eq!(run.mode, RunMode::Stage(Subcommand::Fit));
        assert_eq!(run.root_dir(), Path::new("results/fit"));
        assert!(run.save_config);
    }

    #[test]
    fn test_debug_drops_logger_and_save_config() {
        let mut config = RunConfig {
            debug: true,
            ..Default::default()
        };
        config.trainer.logger = Some(LoggerSetting::Single(tensorboard(Some("logs"))));

        let run = before_instantiate(config, Subcommand::Test, &LauncherSettings::default())
            .unwrap();
        assert_eq!(run.root_dir(), Path::new("results/debug"));
        assert!(run.config.trainer.logger.is_none());
        assert!(run.loggers().is_empty());
        assert!(!run.save_config);
    }

    #[test]
    fn test_debug_tolerates_logger_flag() {
        let mut config = RunConfig {
            debug: true,
            ..Default::default()
        };
        config.trainer.logger = Some(LoggerSetting::Flag(true));
        assert!(before_instantiate(config, Subcommand::Fit, &LauncherSettings::default()).is_ok());
    }

    #[test]
    fn test_logger_flag_rejected() {
        let mut config = RunConfig::default();
        config.trainer.logger = Some(LoggerSetting::Flag(true));
        let err = before_instantiate(config, Subcommand::Fit, &LauncherSettings::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::LoggerFlag));
    }

    #[test]
    fn test_logger_disabled_flag_is_kept() {
        let mut config = RunConfig::default();
        config.trainer.logger = Some(LoggerSetting::Flag(false));
        let run = before_instantiate(config, Subcommand::Fit, &LauncherSettings::default())
            .unwrap();
        assert_eq!(run.config.trainer.logger, Some(LoggerSetting::Flag(false)));
        assert!(run.loggers().is_empty());
    }

    #[test]
    fn test_loggers_namespaced_and_named() {
        let mut config = RunConfig {
            name: Some("bert-mrpc".into()),
            ..Default::default()
        };
        config.trainer.logger = Some(LoggerSetting::Many(vec![
            tensorboard(Some("logs")),
            tensorboard(None),
        ]));

        let run = before_instantiate(config, Subcommand::Validate, &LauncherSettings::default())
            .unwrap();
        let loggers = run.loggers();
        assert_eq!(
            loggers[0].init_args.save_dir,
            Some(PathBuf::from("logs/validate"))
        );
        assert_eq!(
            loggers[1].init_args.save_dir,
            Some(PathBuf::from("results/validate"))
        );
        assert!(
            loggers
                .iter()
                .all(|l| l.init_args.name.as_deref() == Some("bert-mrpc"))
        );
    }

    #[test]
    fn test_logger_name_untouched_without_experiment_name() {
        let mut logger = tensorboard(None);
        logger.init_args.name = Some("tb".into());
        let mut config = RunConfig::default();
        config.trainer.logger = Some(LoggerSetting::Single(logger));

        let run = before_instantiate(config, Subcommand::Fit, &LauncherSettings::default())
            .unwrap();
        assert_eq!(run.loggers()[0].init_args.name.as_deref(), Some("tb"));
    }

    #[test]
    fn test_checkpoint_without_monitor_fails() {
        let mut config = RunConfig::default();
        config.trainer.callbacks =
            vec![CallbackDescriptor::new("pytorch_lightning.callbacks.ModelCheckpoint")];
        let err = before_instantiate(config, Subcommand::Fit, &LauncherSettings::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingMonitor { .. }));
    }

    #[test]
    fn test_empty_monitor_counts_as_missing() {
        let mut config = RunConfig {
            monitor: Some(String::new()),
            ..Default::default()
        };
        config.trainer.callbacks =
            vec![CallbackDescriptor::new("pytorch_lightning.callbacks.EarlyStopping")];
        let err = before_instantiate(config, Subcommand::Fit, &LauncherSettings::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingMonitor { .. }));
    }

    #[test]
    fn test_monitor_and_mode_override_callback_args() {
        let mut config = RunConfig {
            monitor: Some("val/accuracy".into()),
            ..Default::default()
        };
        config.trainer.callbacks = vec![
            CallbackDescriptor::new("pytorch_lightning.callbacks.EarlyStopping")
                .with_arg("monitor", "val/loss")
                .with_arg("mode", "min")
                .with_arg("patience", 3),
            CallbackDescriptor::new("pytorch_lightning.callbacks.LearningRateMonitor"),
        ];

        let run = before_instantiate(config, Subcommand::Fit, &LauncherSettings::default())
            .unwrap();
        let stop = &run.callbacks[0];
        assert_eq!(
            stop.target,
            Some(MonitorTarget {
                monitor: "val/accuracy".into(),
                mode: MetricMode::Max,
            })
        );
        assert_eq!(stop.init_args.get("mode"), Some(&Value::from("max")));
        assert_eq!(
            stop.init_args.get("monitor"),
            Some(&Value::from("val/accuracy"))
        );
        assert_eq!(stop.init_args.get("patience"), Some(&Value::from(3)));
        assert_eq!(run.config.trainer.callbacks[0].arg_str("mode"), Some("max"));

        let lr = &run.callbacks[1];
        assert_eq!(lr.kind, CallbackKind::LearningRateMonitor);
        assert!(lr.target.is_none());
        assert!(!lr.init_args.contains_key("monitor"));
    }

    #[test]
    fn test_unknown_callbacks_pass_through() {
        let mut config = RunConfig {
            monitor: Some("val/loss".into()),
            ..Default::default()
        };
        let progress = CallbackDescriptor::new("pytorch_lightning.callbacks.TQDMProgressBar")
            .with_arg("refresh_rate", 10);
        let custom = CallbackDescriptor::new("my.callbacks.Custom");
        config.trainer.callbacks = vec![progress.clone(), custom.clone()];

        let run = before_instantiate(config, Subcommand::Fit, &LauncherSettings::default())
            .unwrap();
        assert_eq!(run.config.trainer.callbacks, vec![progress.clone(), custom]);
        assert_eq!(run.callbacks[0].kind, CallbackKind::Other);
        assert_eq!(run.callbacks[0].class_path, progress.class_path);
        assert_eq!(run.callbacks[0].init_args, progress.init_args);
        assert!(run.callbacks[0].target.is_none());
        assert_eq!(run.callbacks[1].kind, CallbackKind::Other);
    }

    #[test]
    fn test_dirpath_only_for_checkpoint() {
        let mut config = RunConfig {
            monitor: Some("val/loss".into()),
            ..Default::default()
        };
        config.trainer.callbacks = vec![
            CallbackDescriptor::new("ModelCheckpoint").with_arg("dirpath", "ckpts"),
            CallbackDescriptor::new("EarlyStopping").with_arg("dirpath", "ignored"),
        ];
        let run = before_instantiate(config, Subcommand::Fit, &LauncherSettings::default())
            .unwrap();
        assert_eq!(run.callbacks[0].dirpath(), Some(PathBuf::from("ckpts")));
        assert_eq!(run.callbacks[1].dirpath(), None);
        assert_eq!(
            run.callbacks[0].target.as_ref().map(|t| t.mode),
            Some(MetricMode::Min)
        );
    }
}
