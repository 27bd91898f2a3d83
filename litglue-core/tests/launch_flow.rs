//! End-to-end resolution: config file on disk → tree → resolved run → layout
//! → persisted config.

use chrono::NaiveDate;
use litglue_core::{
    CallbackKind, CliOverrides, ConfigError, LauncherSettings, LoadRequest, MetricMode, RunConfig,
    RunLayout, RunMode, Subcommand, before_instantiate, load_run_config, save_resolved_config,
};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

const FIT_CONFIG: &str = r#"
seed_everything: 42
trainer:
  max_epochs: 3
  logger:
    class_path: pytorch_lightning.loggers.TensorBoardLogger
    init_args:
      save_dir: logs
  callbacks:
    - class_path: pytorch_lightning.callbacks.EarlyStopping
      init_args:
        patience: 5
    - class_path: pytorch_lightning.callbacks.ModelCheckpoint
      init_args:
        save_top_k: 1
    - class_path: pytorch_lightning.callbacks.LearningRateMonitor
model:
  task_name: mrpc
  model_name_or_path: bert-base-cased
  num_labels: 2
"#;

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fit.yaml");
    std::fs::write(&path, body).unwrap();
    path
}

fn settings(dir: &Path) -> LauncherSettings {
    LauncherSettings {
        results_root: dir.join("results"),
        default_config_files: Vec::new(),
        ..Default::default()
    }
}

#[test]
fn fit_run_resolves_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());

    let mut request = LoadRequest::new(Subcommand::Fit);
    request.config_files = vec![write_config(dir.path(), FIT_CONFIG)];
    request.overrides = CliOverrides {
        name: Some("bert-mrpc".into()),
        monitor: Some("val/loss".into()),
        debug: None,
    };

    let config = load_run_config(&settings, &request).unwrap();
    let run = before_instantiate(config, Subcommand::Fit, &settings).unwrap();

    assert_eq!(run.mode, RunMode::Stage(Subcommand::Fit));
    assert_eq!(run.root_dir(), settings.results_root.join("fit"));
    assert_eq!(
        run.loggers()[0].init_args.save_dir,
        Some(PathBuf::from("logs/fit"))
    );
    assert_eq!(run.loggers()[0].init_args.name.as_deref(), Some("bert-mrpc"));

    let kinds: Vec<_> = run.callbacks.iter().map(|cb| cb.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CallbackKind::EarlyStopping,
            CallbackKind::ModelCheckpoint,
            CallbackKind::LearningRateMonitor,
        ]
    );
    for cb in &run.callbacks[..2] {
        let target = cb.target.as_ref().unwrap();
        assert_eq!(target.monitor, "val/loss");
        assert_eq!(target.mode, MetricMode::Min);
    }

    let launched_at = NaiveDate::from_ymd_opt(2026, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap();
    let mut layout = RunLayout::plan(&run, launched_at);
    assert_eq!(layout.log_dir, PathBuf::from("logs/fit/bert-mrpc/01-02T030405"));

    layout.log_dir = dir.path().join(&layout.log_dir);
    layout.root_dir = dir.path().join(&layout.root_dir);
    layout.create_dirs().unwrap();
    let saved = layout.config_path(&settings.config_file_name);
    assert!(save_resolved_config(&run, &saved, false).unwrap());

    let reloaded: RunConfig =
        serde_yaml::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(reloaded, run.config);
    assert_eq!(reloaded.trainer.callbacks[0].arg_str("mode"), Some("min"));
}

#[test]
fn debug_flag_from_cli_overrides_file_loggers() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());

    let mut request = LoadRequest::new(Subcommand::Validate);
    request.config_files = vec![write_config(dir.path(), FIT_CONFIG)];
    request.overrides = CliOverrides {
        monitor: Some("val/accuracy".into()),
        debug: Some(true),
        ..Default::default()
    };

    let config = load_run_config(&settings, &request).unwrap();
    let run = before_instantiate(config, Subcommand::Validate, &settings).unwrap();
    assert_eq!(run.mode, RunMode::Debug);
    assert_eq!(run.root_dir(), settings.results_root.join("debug"));
    assert!(run.loggers().is_empty());
    assert!(!run.save_config);
    assert_eq!(
        run.callbacks[0].target.as_ref().map(|t| t.mode),
        Some(MetricMode::Max)
    );
}

#[test]
fn missing_monitor_fails_before_layout() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());

    let mut request = LoadRequest::new(Subcommand::Fit);
    request.config_files = vec![write_config(dir.path(), FIT_CONFIG)];

    let config = load_run_config(&settings, &request).unwrap();
    let err = before_instantiate(config, Subcommand::Fit, &settings).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingMonitor { ref class_path } if class_path.ends_with("EarlyStopping")
    ));
    assert!(!settings.results_root.exists());
}

#[test]
fn logger_flag_in_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());

    let mut request = LoadRequest::new(Subcommand::Test);
    request.config_files = vec![write_config(dir.path(), "trainer:\n  logger: true\n")];

    let config = load_run_config(&settings, &request).unwrap();
    let err = before_instantiate(config, Subcommand::Test, &settings).unwrap_err();
    assert_eq!(
        err.to_string(),
        "should assign trainer.logger with the specific logger."
    );
}
