//! Layered loading of a subcommand's configuration tree.
//!
//! Uses `figment` to merge, from lowest to highest priority:
//! 1. Built-in defaults (`RunConfig::default()`)
//! 2. Default config files shared by every subcommand (skipped when missing)
//! 3. Config files passed with `--config` (must exist), in order
//! 4. Environment variables (`LITGLUE_TRAINER__MAX_EPOCHS=3`)
//! 5. Launcher flags (`--name`, `--monitor`, `--debug/--no-debug`)
//! 6. Dotted `KEY=VALUE` assignments (`--set trainer.max_epochs=3`)
//!
//! Dictionaries merge key by key; lists such as `trainer.callbacks` are
//! replaced wholesale by the higher-priority source.

use crate::config::{RunConfig, Subcommand};
use crate::error::{ConfigError, Result};
use crate::settings::LauncherSettings;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Values supplied through dedicated launcher flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

/// Everything needed to build one subcommand's tree.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub subcommand: Subcommand,
    pub default_config_files: Vec<PathBuf>,
    pub config_files: Vec<PathBuf>,
    pub overrides: CliOverrides,
    /// Raw `KEY=VALUE` strings, applied in order.
    pub assignments: Vec<String>,
}

impl LoadRequest {
    pub fn new(subcommand: Subcommand) -> Self {
        Self {
            subcommand,
            default_config_files: Vec::new(),
            config_files: Vec::new(),
            overrides: CliOverrides::default(),
            assignments: Vec::new(),
        }
    }
}

/// Build the figment for `request` without extracting it.
pub fn figment_for(settings: &LauncherSettings, request: &LoadRequest) -> Result<Figment> {
    let mut figment = Figment::from(Serialized::defaults(RunConfig::default()));

    for path in &request.default_config_files {
        if path.exists() {
            tracing::debug!(path = %path.display(), "merging default config file");
            figment = merge_file(figment, path)?;
        } else {
            tracing::debug!(path = %path.display(), "default config file absent, skipped");
        }
    }

    for path in &request.config_files {
        if !path.exists() {
            return Err(ConfigError::MissingFile { path: path.clone() });
        }
        tracing::debug!(path = %path.display(), "merging config file");
        figment = merge_file(figment, path)?;
    }

    figment = figment.merge(Env::prefixed(&settings.env_prefix).split("__"));
    figment = figment.merge(Serialized::defaults(&request.overrides));

    for raw in &request.assignments {
        let (key, value) = parse_assignment(raw)?;
        figment = figment.merge(Serialized::default(&key, value));
    }

    Ok(figment)
}

/// Load the configuration tree of `request.subcommand`.
pub fn load_run_config(settings: &LauncherSettings, request: &LoadRequest) -> Result<RunConfig> {
    let config: RunConfig = figment_for(settings, request)?
        .extract()
        .map_err(Box::new)?;
    tracing::debug!(
        subcommand = %request.subcommand,
        callbacks = config.trainer.callbacks.len(),
        "configuration tree loaded"
    );
    Ok(config)
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("yaml" | "yml") => Ok(figment.merge(Yaml::file(path))),
        Some("toml") => Ok(figment.merge(Toml::file(path))),
        Some("json") => Ok(figment.merge(Json::file(path))),
        _ => Err(ConfigError::UnknownFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Split `trainer.max_epochs=3` into a dotted key and a YAML-parsed value.
pub fn parse_assignment(raw: &str) -> Result<(String, serde_yaml::Value)> {
    let invalid = |reason: &str| ConfigError::InvalidOverride {
        raw: raw.to_string(),
        reason: reason.to_string(),
    };
    let (key, value) = raw.split_once('=').ok_or_else(|| invalid("expected KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() || key.split('.').any(str::is_empty) {
        return Err(invalid("key must be a non-empty dotted path"));
    }
    let value: serde_yaml::Value =
        serde_yaml::from_str(value).map_err(|e| invalid(&e.to_string()))?;
    Ok((key.to_string(), value))
}
