//! sysexec CLI
//!
//! Runs a shell command line or an absolute-path program and exits 0 only
//! if the child exited 0.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use sysexec::{ExecReport, Executor, ExecutorConfig, ExitOutcome};
use tracing::{Level, debug, error};
use tracing_subscriber::fmt;

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "sysexec")]
#[command(about = "Run commands via the shell or direct exec")]
struct Args {
    /// Config file path (default: ~/.sysexec/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a JSON report to stdout
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Run a command line through the shell
    Shell {
        /// Command line, interpreted entirely by the shell
        command: String,
    },
    /// Execute a program directly, without a shell
    Exec {
        /// Absolute path of the program followed by its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        argv: Vec<String>,
    },
    /// Execute a program directly with stdout written to a file
    Redirect {
        /// File to create or truncate
        #[arg(short, long)]
        output: PathBuf,

        /// Absolute path of the program followed by its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        argv: Vec<String>,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<ExecutorConfig, sysexec::ConfigError> {
    let path = path.unwrap_or_else(ExecutorConfig::default_path);
    dotenvy::dotenv().ok();
    ExecutorConfig::from_toml_file(&path)?.with_env_overrides()
}

fn main() {
    let args = Args::parse();

    fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_target(args.verbose)
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            process::exit(2);
        }
    };
    debug!(?config, "Configuration loaded");

    let executor = Executor::new(config);

    let success = if args.json {
        let result: sysexec::Result<ExitOutcome> = match &args.command {
            Cmd::Shell { command } => executor.shell_outcome(command.as_str()),
            Cmd::Exec { argv } => executor.exec_outcome(argv.as_slice()),
            Cmd::Redirect { output, argv } => executor.exec_redirect_outcome(output, argv.as_slice()),
        };
        let report = ExecReport::from_result(&result);
        match serde_json::to_string(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => error!(error = %e, "Failed to serialize report"),
        }
        report.success
    } else {
        match &args.command {
            Cmd::Shell { command } => executor.run_shell(command.as_str()),
            Cmd::Exec { argv } => executor.exec_direct(argv.as_slice()),
            Cmd::Redirect { output, argv } => executor.exec_redirect(output, argv.as_slice()),
        }
    };

    process::exit(if success { 0 } else { 1 });
}
