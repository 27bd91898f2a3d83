//! On-disk layout of a resolved run.
//!
//! The log directory is the first logger's `<save_dir>/<name>/<version>`, or
//! the run root when no logger is configured. Logger versions left unset are
//! replaced by the launch timestamp, so repeated runs never collide.
//! Checkpoints go to the `ModelCheckpoint` `dirpath` when given, otherwise to
//! `<log_dir>/checkpoints`.

use crate::config::LoggerDescriptor;
use crate::resolve::ResolvedRun;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Logger name used when a descriptor does not set one.
pub const DEFAULT_LOGGER_NAME: &str = "lightning_logs";

/// `strftime` format of timestamp versions.
pub const VERSION_FORMAT: &str = "%m-%dT%H%M%S";

/// Directories a run writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunLayout {
    pub root_dir: PathBuf,
    pub logger_dirs: Vec<PathBuf>,
    pub log_dir: PathBuf,
    pub checkpoint_dir: PathBuf,
}

impl RunLayout {
    pub fn plan(run: &ResolvedRun, launched_at: NaiveDateTime) -> Self {
        let root_dir = run.root_dir().to_path_buf();
        let version = launched_at.format(VERSION_FORMAT).to_string();

        let logger_dirs: Vec<PathBuf> = run
            .loggers()
            .iter()
            .map(|logger| logger_dir(logger, &root_dir, &version))
            .collect();
        let log_dir = logger_dirs
            .first()
            .cloned()
            .unwrap_or_else(|| root_dir.clone());

        let checkpoint_dir = run
            .callbacks
            .iter()
            .find_map(|cb| cb.dirpath())
            .unwrap_or_else(|| log_dir.join("checkpoints"));

        Self {
            root_dir,
            logger_dirs,
            log_dir,
            checkpoint_dir,
        }
    }

    /// Create the run root and log directory.
    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }

    pub fn config_path(&self, file_name: &str) -> PathBuf {
        self.log_dir.join(file_name)
    }
}

fn logger_dir(logger: &LoggerDescriptor, root_dir: &Path, version: &str) -> PathBuf {
    let args = &logger.init_args;
    let mut dir = args
        .save_dir
        .clone()
        .unwrap_or_else(|| root_dir.to_path_buf());
    let name = args.name.as_deref().unwrap_or(DEFAULT_LOGGER_NAME);
    if !name.is_empty() {
        dir.push(name);
    }
    match &args.version {
        Some(v) => dir.push(v.to_string()),
        None => dir.push(version),
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CallbackDescriptor, LoggerSetting, LoggerVersion, RunConfig, Subcommand};
    use crate::resolve::before_instantiate;
    use crate::settings::LauncherSettings;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn launched_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    fn resolve(yaml: &str) -> ResolvedRun {
        let config: RunConfig = serde_yaml::from_str(yaml).unwrap();
        before_instantiate(config, Subcommand::Fit, &LauncherSettings::default()).unwrap()
    }

    #[test]
    fn test_layout_without_logger() {
        let run = resolve("{}");
        let layout = RunLayout::plan(&run, launched_at());
        assert_eq!(layout.root_dir, PathBuf::from("results/fit"));
        assert_eq!(layout.log_dir, PathBuf::from("results/fit"));
        assert!(layout.logger_dirs.is_empty());
        assert_eq!(
            layout.checkpoint_dir,
            PathBuf::from("results/fit/checkpoints")
        );
    }

    #[test]
    fn test_layout_uses_first_logger_and_timestamp_version() {
        let run = resolve(
            r#"
name: bert
trainer:
  logger:
    - class_path: pytorch_lightning.loggers.TensorBoardLogger
      init_args:
        save_dir: logs
    - class_path: pytorch_lightning.loggers.CSVLogger
      init_args:
        version: 3
"#,
        );
        let layout = RunLayout::plan(&run, launched_at());
        assert_eq!(
            layout.logger_dirs,
            vec![
                PathBuf::from("logs/fit/bert/10-19T090507"),
                PathBuf::from("results/fit/bert/version_3"),
            ]
        );
        assert_eq!(layout.log_dir, layout.logger_dirs[0]);
        assert_eq!(
            layout.checkpoint_dir,
            PathBuf::from("logs/fit/bert/10-19T090507/checkpoints")
        );
        assert_eq!(
            layout.config_path("config.yaml"),
            PathBuf::from("logs/fit/bert/10-19T090507/config.yaml")
        );
    }

    #[test]
    fn test_layout_default_and_empty_logger_names() {
        let mut config = RunConfig::default();
        let mut logger: crate::config::LoggerDescriptor = serde_yaml::from_str(
            "class_path: pytorch_lightning.loggers.TensorBoardLogger\n",
        )
        .unwrap();
        logger.init_args.version = Some(LoggerVersion::Label("v1".into()));
        let mut unnamed = logger.clone();
        unnamed.init_args.name = Some(String::new());
        config.trainer.logger = Some(LoggerSetting::Many(vec![logger, unnamed]));

        let run = before_instantiate(config, Subcommand::Test, &LauncherSettings::default())
            .unwrap();
        let layout = RunLayout::plan(&run, launched_at());
        assert_eq!(
            layout.logger_dirs,
            vec![
                PathBuf::from("results/test/lightning_logs/v1"),
                PathBuf::from("results/test/v1"),
            ]
        );
    }

    #[test]
    fn test_checkpoint_dirpath_wins() {
        let mut config = RunConfig {
            monitor: Some("val/f1".into()),
            ..Default::default()
        };
        config.trainer.callbacks =
            vec![CallbackDescriptor::new("ModelCheckpoint").with_arg("dirpath", "ckpts/best")];
        let run = before_instantiate(config, Subcommand::Fit, &LauncherSettings::default())
            .unwrap();
        let layout = RunLayout::plan(&run, launched_at());
        assert_eq!(layout.checkpoint_dir, PathBuf::from("ckpts/best"));
    }

    #[test]
    fn test_create_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout {
            root_dir: dir.path().join("results/fit"),
            logger_dirs: vec![dir.path().join("logs/fit/x")],
            log_dir: dir.path().join("logs/fit/x"),
            checkpoint_dir: dir.path().join("logs/fit/x/checkpoints"),
        };
        layout.create_dirs().unwrap();
        assert!(layout.root_dir.is_dir());
        assert!(layout.log_dir.is_dir());
    }
}
