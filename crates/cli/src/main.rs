//! confmend command-line tool.
//!
//! Resolves conflict markers in build configuration files under an explicit
//! policy, validates the result, and reports on unresolved files.
//!
//! Exit codes: 0 success, 1 malformed conflict markers, 2 failed
//! validation, 3 I/O, configuration or usage errors.

mod commands;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use confmend_core::config::AppConfig;
use confmend_core::errors::{ConflictError, CoreError, ValidationError};
use confmend_core::Policy;

/// Config file picked up from the working directory when `--config` is absent.
const LOCAL_CONFIG: &str = "confmend.toml";

/// Exit code for everything that is not a conflict or validation failure.
const EXIT_OTHER: u8 = 3;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// confmend command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "confmend",
    version,
    about = "Resolve merge conflict markers in build configuration files and validate the result"
)]
struct Cli {
    /// Path to the TOML configuration file (default: ./confmend.toml if present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve every conflict region and print the result.
    Resolve {
        /// Input file; stdin when absent or `-`.
        input: Option<PathBuf>,

        /// Resolution policy: ours, theirs or union.
        #[arg(short, long)]
        policy: Option<Policy>,

        /// Write the result to this file instead of stdout.
        #[arg(short, long, conflicts_with = "in_place")]
        output: Option<PathBuf>,

        /// Replace the input file with the result.
        #[arg(long, requires = "input")]
        in_place: bool,

        /// Skip post-resolution validation.
        #[arg(long)]
        no_validate: bool,
    },

    /// Report conflict regions and validation findings without resolving.
    Check {
        /// Input file; stdin when absent or `-`.
        input: Option<PathBuf>,

        /// Emit the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the effective pairing rules.
    Rules,

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./confmend.toml")]
        output: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_OTHER)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = load_config(cli.config.as_deref());
    let level = config
        .as_ref()
        .map(|c| c.log.level.clone())
        .unwrap_or_else(|_| "warn".into());
    init_tracing(cli.verbose, &level);

    let result = config.and_then(|config| run(cli.command, &config));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Logs go to stderr; stdout carries only resolved text and reports.
fn init_tracing(verbose: u8, config_level: &str) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Resolve {
            input,
            policy,
            output,
            in_place,
            no_validate,
        } => {
            let target = match (output, in_place) {
                (Some(path), _) => commands::Target::File(path),
                (None, true) => in_place_target(input.as_deref())?,
                (None, false) => commands::Target::Stdout,
            };
            commands::resolve::run(config, input.as_deref(), policy, target, !no_validate)
        }
        Commands::Check { input, json } => commands::check::run(config, input.as_deref(), json),
        Commands::Rules => commands::rules::run(config),
        Commands::Init { output } => commands::init::run(&output),
    }
}

/// `--in-place` writes back to the input, which must be a real file.
fn in_place_target(input: Option<&Path>) -> Result<commands::Target> {
    match input {
        Some(path) if path != Path::new("-") => Ok(commands::Target::File(path.to_path_buf())),
        _ => bail!("--in-place needs an input file, not stdin"),
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let local = PathBuf::from(LOCAL_CONFIG);
            if !local.exists() {
                return Ok(AppConfig::default());
            }
            local
        }
    };
    AppConfig::load_and_validate(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

/// Map an error chain to the process exit code.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| {
            if let Some(core) = cause.downcast_ref::<CoreError>() {
                Some(core.exit_code())
            } else if cause.is::<ConflictError>() {
                Some(1)
            } else if cause.is::<ValidationError>() {
                Some(2)
            } else {
                None
            }
        })
        .unwrap_or(EXIT_OTHER)
}
