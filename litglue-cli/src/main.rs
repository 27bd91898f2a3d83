//! litglue CLI — launcher for GLUE sequence-classification experiments.
//!
//! Resolves a `fit`/`validate`/`test` configuration, prepares the run
//! directories, and emits a launch plan for the training-loop driver.

mod commands;

use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use clap_complete::{Shell, generate};
use litglue_core::{LauncherSettings, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// litglue: fine-tune transformer classifiers on GLUE tasks
#[derive(Parser, Debug)]
#[command(name = "litglue", version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print a completion script for SHELL and exit
    #[arg(short = 's', long = "print-completion", value_name = "SHELL")]
    print_completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Train the model, validating along the way
    Fit(RunArgs),
    /// Run one evaluation pass over the validation split
    Validate(RunArgs),
    /// Run one evaluation pass over the test split
    Test(RunArgs),
}

impl Commands {
    fn split(self) -> (Subcommand, RunArgs) {
        match self {
            Commands::Fit(args) => (Subcommand::Fit, args),
            Commands::Validate(args) => (Subcommand::Validate, args),
            Commands::Test(args) => (Subcommand::Test, args),
        }
    }
}

/// Flags shared by every run subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Config file merged over the defaults; repeatable, later files win
    #[arg(short, long = "config", value_name = "FILE")]
    pub config: Vec<PathBuf>,

    /// Default config file; missing files are skipped
    #[arg(long = "default-config", value_name = "FILE")]
    pub default_config: Vec<PathBuf>,

    /// Experiment name, copied into every logger
    #[arg(short, long)]
    pub name: Option<String>,

    /// Metric watched by early stopping and checkpointing
    #[arg(short, long)]
    pub monitor: Option<String>,

    /// Debug run: no logger, no saved config, results under debug/
    #[arg(short, long, overrides_with = "no_debug")]
    pub debug: bool,

    /// Turn off a debug flag set in a config file
    #[arg(long, overrides_with = "debug")]
    pub no_debug: bool,

    /// Override one config value, e.g. trainer.max_epochs=3
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Print the resolved config as YAML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Replace an existing saved config in the log directory
    #[arg(long)]
    pub overwrite_config: bool,
}

impl RunArgs {
    /// `Some` only when a debug flag was given on the command line.
    pub fn debug_override(&self) -> Option<bool> {
        if self.debug {
            Some(true)
        } else if self.no_debug {
            Some(false)
        } else {
            None
        }
    }
}

/// The clap command with each subcommand's `--default-config` defaulting to
/// the launcher's default config files.
fn build_command(settings: &LauncherSettings) -> clap::Command {
    let defaults: Vec<String> = settings
        .default_config_files
        .iter()
        .map(|path| path.display().to_string())
        .collect();

    let mut command = Cli::command();
    for subcommand in Subcommand::ALL {
        let defaults = defaults.clone();
        command = command.mut_subcommand(subcommand.as_str(), move |sub| {
            sub.mut_arg("default_config", move |arg| arg.default_values(defaults))
        });
    }
    command
}

fn init_tracing(verbose: u8, quiet: bool) -> tracing_appender::non_blocking::WorkerGuard {
    let filter = match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Human-readable layer for stderr
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let log_dir = directories::ProjectDirs::from("dev", "litglue", "litglue")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "litglue.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    guard
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let settings = LauncherSettings::default();
    let matches = build_command(&settings).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if let Some(shell) = cli.print_completion {
        generate(
            shell,
            &mut build_command(&settings),
            "litglue",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let _guard = init_tracing(cli.verbose, cli.quiet);

    let Some(command) = cli.command else {
        build_command(&settings).print_help()?;
        return Ok(());
    };
    let (subcommand, args) = command.split();
    let launched_at = chrono::Local::now().naive_local();
    commands::handle_run(
        &settings,
        subcommand,
        &args,
        launched_at,
        &mut std::io::stdout(),
    )
}
