//! Process-wide launcher conventions, threaded explicitly through loading,
//! resolution, and layout instead of living in module state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Conventions shared by every subcommand of a launcher invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherSettings {
    /// Directory under which `<mode>` run roots and default logger dirs are created.
    #[serde(default = "default_results_root")]
    pub results_root: PathBuf,
    /// Config files loaded before any `--config` file. Missing files are skipped.
    #[serde(default = "default_config_files")]
    pub default_config_files: Vec<PathBuf>,
    /// Prefix of environment variables merged into the tree (`<PREFIX>TRAINER__MAX_EPOCHS`).
    #[serde(default = "default_env_prefix")]
    pub env_prefix: String,
    /// File name of the persisted resolved config inside the log directory.
    #[serde(default = "default_config_file_name")]
    pub config_file_name: String,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            results_root: default_results_root(),
            default_config_files: default_config_files(),
            env_prefix: default_env_prefix(),
            config_file_name: default_config_file_name(),
        }
    }
}

fn default_results_root() -> PathBuf {
    PathBuf::from("results")
}

fn default_config_files() -> Vec<PathBuf> {
    vec![PathBuf::from("configs").join("default.yaml")]
}

fn default_env_prefix() -> String {
    "LITGLUE_".to_string()
}

fn default_config_file_name() -> String {
    "config.yaml".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = LauncherSettings::default();
        assert_eq!(settings.results_root, PathBuf::from("results"));
        assert_eq!(
            settings.default_config_files,
            vec![PathBuf::from("configs/default.yaml")]
        );
        assert_eq!(settings.env_prefix, "LITGLUE_");
    }
}
