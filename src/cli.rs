//! Command-line interface for submission-check.

use clap::Parser;
use std::path::PathBuf;

use crate::collector::ResultCollector;
use crate::config::{Configuration, DEFAULT_CONFIG_FILE};
use crate::hook::{record_internal_error, SubmissionHook};
use crate::logging::{init_logging, DEFAULT_LOG_FILE};
use crate::report::{self, ReportFormat};
use crate::submission::Phase;
use crate::svn::CliSvnInterface;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Subversion hook that checks student submissions.
///
/// Called from the repository's `pre-commit` hook with `PRE <repo> <txn>`
/// and from `post-commit` with `POST <repo> <revision>`. The result is
/// written to stderr, where svn passes it on to the committer.
#[derive(Parser, Debug)]
#[command(name = "submission-check")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Hook phase: PRE or POST
    #[arg(value_parser = parse_phase)]
    pub phase: Phase,

    /// Path to the repository
    pub repository: PathBuf,

    /// Transaction name (PRE) or revision number (POST)
    pub transaction: String,

    /// Path to the configuration YAML file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Log file; logging falls back to stdout if it cannot be opened
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Report format written to stderr
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Xml)]
    pub format: ReportFormat,
}

fn parse_phase(s: &str) -> Result<Phase, String> {
    Phase::parse(s).ok_or_else(|| format!("expected PRE or POST, got {:?}", s))
}

/// Run the hook and return its exit code.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    if !cli.repository.is_dir() {
        eprintln!("Error: {} is not a directory", cli.repository.display());
        return Ok(EXIT_ERROR);
    }

    let configuration = Configuration::parse_file(&cli.config);
    let level = configuration
        .as_ref()
        .ok()
        .and_then(|c| c.log_level().ok())
        .unwrap_or(tracing::Level::INFO);
    init_logging(level, &cli.log_file);

    tracing::info!(
        phase = %cli.phase,
        repository = %cli.repository.display(),
        transaction = %cli.transaction,
        "hook called"
    );

    let collector = match &configuration {
        Ok(configuration) => run_hook(cli, configuration),
        Err(e) => {
            tracing::error!(config = %cli.config.display(), error = %e, "could not load configuration");
            let mut collector = ResultCollector::new();
            record_internal_error(&mut collector, None);
            collector
        }
    };

    let mut stderr = std::io::stderr().lock();
    report::write_report(&mut stderr, cli.format, &collector, cli.phase)?;

    let exit_code = collector.exit_code(cli.phase);
    tracing::info!(exit_code, "exiting");
    Ok(exit_code)
}

fn run_hook(cli: &Cli, configuration: &Configuration) -> ResultCollector {
    let svn = match CliSvnInterface::new() {
        Ok(svn) => svn
            .program(configuration.svnlook.command())
            .prefix_args(configuration.svnlook.args.clone())
            .timeout(configuration.svnlook.timeout()),
        Err(e) => {
            tracing::error!(error = %e, "could not set up svnlook");
            let mut collector = ResultCollector::new();
            record_internal_error(&mut collector, None);
            return collector;
        }
    };

    SubmissionHook::new(&svn, configuration, cli.phase, &cli.repository, &cli.transaction).execute()
}
