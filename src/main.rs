//! `cppmodel` - convert between C++ class declarations and the class model.
//!
//! Usage:
//!   cppmodel extract <input> <output> [--format json|yaml]
//!   cppmodel synthesize <input> <output>
//!   cppmodel validate <input>
//!
//! Inputs are files or directories (recursed). Exit status is 1 when any
//! file produced an error or failed validation.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;

use cppmodel::project::{EngineConfig, FileStatus, Report, Workspace, load_lookup};

/// Class model extractor and synthesizer.
#[derive(Parser, Debug)]
#[command(name = "cppmodel", version, about = "C++ declarations <-> class model")]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Type-kind lookup (JSON or YAML) for types declared elsewhere.
    #[arg(long, global = true)]
    lookup: Option<PathBuf>,

    /// Treat unresolved relationship targets as errors.
    #[arg(long, global = true)]
    strict: bool,

    /// Stop starting new files after the first failure.
    #[arg(long, global = true)]
    fail_fast: bool,

    /// Worker threads (default: available parallelism).
    #[arg(long, short = 'j', global = true)]
    jobs: Option<usize>,

    /// More logging (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Declaration text -> IR documents.
    Extract {
        input: PathBuf,
        output: PathBuf,
        /// IR format: json or yaml.
        #[arg(long)]
        format: Option<String>,
    },
    /// IR documents -> declaration text.
    Synthesize { input: PathBuf, output: PathBuf },
    /// Round-trip headers or IR documents and report PASS/FAIL per file.
    Validate { input: PathBuf },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if cli.strict {
        config.extract.strict_lookup = true;
    }
    if cli.fail_fast {
        config.fail_fast = true;
    }
    if cli.jobs.is_some() {
        config.jobs = cli.jobs;
    }
    if let Command::Extract {
        format: Some(format),
        ..
    } = &cli.command
    {
        config.format = format.clone();
    }

    let mut workspace = Workspace::new(config);
    if let Some(path) = &cli.lookup {
        let lookup = load_lookup(path).with_context(|| format!("loading lookup {}", path.display()))?;
        workspace = workspace.with_lookup(lookup);
    }

    let report = match &cli.command {
        Command::Extract { input, output, .. } => workspace
            .extract_path(input, output)
            .with_context(|| format!("extracting {}", input.display()))?,
        Command::Synthesize { input, output } => workspace
            .synthesize_path(input, output)
            .with_context(|| format!("synthesizing {}", input.display()))?,
        Command::Validate { input } => workspace
            .validate_path(input)
            .with_context(|| format!("validating {}", input.display()))?,
    };

    print_report(&report, matches!(cli.command, Command::Validate { .. }));
    info!(
        files = report.files.len(),
        failed = report.count(FileStatus::Failed),
        cancelled = report.count(FileStatus::Cancelled),
        "done"
    );
    Ok(if report.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()),
        )
        .init();
}

fn print_report(report: &Report, validating: bool) {
    for file in &report.files {
        for diagnostic in &file.diagnostics {
            eprintln!("{diagnostic}");
        }
        if let Some(failure) = &file.failure {
            eprintln!("{}: error: {failure}", file.path.display());
        }
        if validating {
            let verdict = match file.status {
                FileStatus::Ok => "PASS",
                FileStatus::Failed => "FAIL",
                FileStatus::Cancelled => "SKIP",
            };
            println!("{verdict} {}", file.path.display());
            for mismatch in &file.mismatches {
                println!("    {mismatch}");
            }
        } else if let Some(output) = &file.output {
            println!("{} -> {}", file.path.display(), output.display());
        }
    }
}
