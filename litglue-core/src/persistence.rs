//! Persisting the resolved configuration next to a run's logs.

use crate::error::{ConfigError, Result};
use crate::resolve::ResolvedRun;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// `config.yaml` stages as `config.yaml.partial` in the same directory.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Stage `yaml` beside `path`, then rename it over `path`.
fn write_yaml(path: &Path, yaml: &str) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let staged = staging_path(path);
    std::fs::write(&staged, yaml)?;
    std::fs::rename(&staged, path)
}

/// Write the resolved tree of `run` as YAML to `path`.
///
/// Returns `Ok(false)` without touching the disk when the run disabled config
/// saving (debug runs). An existing file is only replaced with `overwrite`.
pub fn save_resolved_config(run: &ResolvedRun, path: &Path, overwrite: bool) -> Result<bool> {
    if !run.save_config {
        tracing::debug!("config saving disabled for this run");
        return Ok(false);
    }
    if path.exists() && !overwrite {
        return Err(ConfigError::ConfigExists {
            path: path.to_path_buf(),
        });
    }
    write_yaml(path, &serde_yaml::to_string(&run.config)?)?;
    tracing::info!(path = %path.display(), "resolved config saved");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RunConfig, Subcommand};
    use crate::resolve::before_instantiate;
    use crate::settings::LauncherSettings;

    fn run(debug: bool) -> ResolvedRun {
        let config = RunConfig {
            name: Some("saved".into()),
            debug,
            ..Default::default()
        };
        before_instantiate(config, Subcommand::Fit, &LauncherSettings::default()).unwrap()
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.yaml");
        assert!(save_resolved_config(&run(false), &path, false).unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        let reloaded: RunConfig = serde_yaml::from_str(&content).unwrap();
        assert_eq!(reloaded.name.as_deref(), Some("saved"));
        assert_eq!(
            reloaded.trainer.default_root_dir,
            Some(std::path::PathBuf::from("results/fit"))
        );
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_staging_path_keeps_extension() {
        assert_eq!(
            staging_path(Path::new("logs/fit/config.yaml")),
            PathBuf::from("logs/fit/config.yaml.partial")
        );
    }

    #[test]
    fn test_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "old").unwrap();

        let err = save_resolved_config(&run(false), &path, false).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigExists { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");

        assert!(save_resolved_config(&run(false), &path, true).unwrap());
        assert_ne!(std::fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn test_debug_run_skips_saving() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        assert!(!save_resolved_config(&run(true), &path, false).unwrap());
        assert!(!path.exists());
    }
}
