//! Run subcommand handler.

use crate::RunArgs;
use anyhow::Context;
use chrono::NaiveDateTime;
use litglue_core::{
    CliOverrides, LauncherSettings, LoadRequest, ResolvedCallback, ResolvedRun, RunLayout,
    RunMode, Subcommand, before_instantiate, load_run_config, save_resolved_config,
};
use litglue_ml::{GlueTransformerSettings, NamedSplits};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

/// What the training-loop driver receives on stdout.
#[derive(Debug, Serialize)]
pub struct LaunchPlan {
    pub subcommand: Subcommand,
    pub mode: RunMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_everything: Option<u64>,
    pub layout: RunLayout,
    /// Where the resolved config was written, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_config: Option<PathBuf>,
    pub callbacks: Vec<ResolvedCallback>,
    pub model: GlueTransformerSettings,
    pub splits: NamedSplits,
}

pub fn load_request(subcommand: Subcommand, args: &RunArgs) -> LoadRequest {
    LoadRequest {
        subcommand,
        default_config_files: args.default_config.clone(),
        config_files: args.config.clone(),
        overrides: CliOverrides {
            name: args.name.clone(),
            monitor: args.monitor.clone(),
            debug: args.debug_override(),
        },
        assignments: args.set.clone(),
    }
}

/// Load and resolve the tree, then validate the model section.
pub fn resolve(
    settings: &LauncherSettings,
    subcommand: Subcommand,
    args: &RunArgs,
) -> anyhow::Result<(ResolvedRun, GlueTransformerSettings)> {
    let request = load_request(subcommand, args);
    let config = load_run_config(settings, &request)
        .with_context(|| format!("failed to load the {subcommand} configuration"))?;
    let run = before_instantiate(config, subcommand, settings)?;
    let model = GlueTransformerSettings::from_init_args(&run.config.model)
        .context("invalid model section")?;
    Ok((run, model))
}

/// Resolve, prepare directories, save the config, and write the launch plan
/// (or the resolved YAML with `--print-config`) to `out`.
pub fn handle_run(
    settings: &LauncherSettings,
    subcommand: Subcommand,
    args: &RunArgs,
    launched_at: NaiveDateTime,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let (run, model) = resolve(settings, subcommand, args)?;

    if args.print_config {
        let yaml = serde_yaml::to_string(&run.config)?;
        out.write_all(yaml.as_bytes())?;
        return Ok(());
    }

    let layout = RunLayout::plan(&run, launched_at);
    layout
        .create_dirs()
        .with_context(|| format!("failed to create {}", layout.log_dir.display()))?;

    let config_path = layout.config_path(&settings.config_file_name);
    let saved_config = save_resolved_config(&run, &config_path, args.overwrite_config)?
        .then_some(config_path);

    tracing::info!(
        subcommand = %subcommand,
        mode = %run.mode,
        log_dir = %layout.log_dir.display(),
        "run prepared"
    );

    let plan = LaunchPlan {
        subcommand,
        mode: run.mode,
        seed_everything: run.config.seed_everything,
        layout,
        saved_config,
        callbacks: run.callbacks,
        splits: NamedSplits::for_task(model.task_name),
        model,
    };
    serde_json::to_writer_pretty(&mut *out, &plan)?;
    writeln!(out)?;
    Ok(())
}
