//! [`SvnInterface`] backed by the `svnlook` command-line tool.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::changes::parse_changed_output;
use super::{SvnError, SvnInterface};
use crate::process::{ProcessRunner, StdoutTarget};
use crate::submission::{Phase, Submission, TransactionInfo};

/// Default name of the svnlook executable.
pub const DEFAULT_SVNLOOK: &str = "svnlook";

/// Talks to the repository by running `svnlook`.
pub struct CliSvnInterface {
    program: String,
    prefix_args: Vec<String>,
    runner: ProcessRunner,
}

impl CliSvnInterface {
    /// Create an interface that runs `svnlook` from the `PATH`.
    pub fn new() -> Result<Self, SvnError> {
        let runner = ProcessRunner::new().map_err(SvnError::Runtime)?;
        Ok(Self {
            program: DEFAULT_SVNLOOK.to_string(),
            prefix_args: Vec::new(),
            runner,
        })
    }

    /// Use a different program, e.g. an absolute path to svnlook.
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments placed before the svnlook sub-command. Lets a wrapper
    /// (`sh script.sh`, `sudo -u svn svnlook`) stand in for svnlook.
    pub fn prefix_args(mut self, args: Vec<String>) -> Self {
        self.prefix_args = args;
        self
    }

    /// Deadline for every single svnlook call.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.runner = self.runner.timeout(timeout);
        self
    }

    /// Run `svnlook <subcommand> <repo> --transaction|--revision <id> <extra>`.
    fn run_svnlook(
        &self,
        subcommand: &str,
        transaction: &TransactionInfo,
        extra_args: &[&str],
        stdout: StdoutTarget,
    ) -> Result<Vec<String>, SvnError> {
        // svnlook runs inside the repository, so a relative path would resolve twice
        let repository = absolute_repository(&transaction.repository)?;

        let mut args: Vec<String> = self.prefix_args.clone();
        args.push(subcommand.to_string());
        args.push(repository.to_string_lossy().into_owned());
        args.push(transaction.phase.svnlook_flag().to_string());
        args.push(transaction.transaction_id.clone());
        args.extend(extra_args.iter().map(|a| a.to_string()));

        let output = self
            .runner
            .run(&self.program, &args, Some(&repository), stdout)?;

        if !output.success() {
            return Err(SvnError::ExitStatus {
                subcommand: subcommand.to_string(),
                code: output.code,
            });
        }

        Ok(output.stdout)
    }

    /// Fetch one file of the repository into `target`.
    fn checkout_file(
        &self,
        transaction: &TransactionInfo,
        path_in_repo: &str,
        target: &Path,
    ) -> Result<(), SvnError> {
        if let Some(parent) = target.parent() {
            if !parent.is_dir() {
                fs::create_dir_all(parent).map_err(|source| SvnError::Filesystem {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let file = File::create(target).map_err(|source| SvnError::Filesystem {
            path: target.to_path_buf(),
            source,
        })?;

        self.run_svnlook("cat", transaction, &[path_in_repo], StdoutTarget::File(file))?;
        Ok(())
    }
}

fn absolute_repository(repository: &Path) -> Result<PathBuf, SvnError> {
    std::path::absolute(repository).map_err(|source| SvnError::Filesystem {
        path: repository.to_path_buf(),
        source,
    })
}

/// Strip the submission folder prefix from a full repository path.
fn relative_to_submission<'a>(path: &'a str, submission: &Submission) -> Option<&'a str> {
    let prefix = submission.to_string();
    let rest = path.trim_start_matches('/').strip_prefix(prefix.as_str())?;
    let rest = rest.strip_prefix('/')?;
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

impl SvnInterface for CliSvnInterface {
    fn resolve_transaction(
        &self,
        phase: Phase,
        repository: &Path,
        transaction_id: &str,
    ) -> Result<TransactionInfo, SvnError> {
        // author is not known yet; the remaining fields are all svnlook needs
        let repository = absolute_repository(repository)?;
        let pending = TransactionInfo::new(repository, "", transaction_id, phase);
        let output = self.run_svnlook("author", &pending, &[], StdoutTarget::Capture)?;

        if output.len() != 1 {
            return Err(SvnError::UnexpectedLineCount {
                subcommand: "author".to_string(),
                lines: output.len(),
            });
        }

        Ok(TransactionInfo {
            author: output[0].clone(),
            ..pending
        })
    }

    fn modified_submissions(
        &self,
        transaction: &TransactionInfo,
    ) -> Result<BTreeSet<Submission>, SvnError> {
        let output = self.run_svnlook("changed", transaction, &[], StdoutTarget::Capture)?;
        parse_changed_output(&output)
    }

    fn checkout_submission(
        &self,
        transaction: &TransactionInfo,
        submission: &Submission,
        target: &Path,
    ) -> Result<(), SvnError> {
        tracing::debug!(%submission, target = %target.display(), "checking out submission");

        let submission_path = submission.to_string();
        let listing = self.run_svnlook(
            "tree",
            transaction,
            &["--full-paths", &submission_path],
            StdoutTarget::Capture,
        )?;

        // directories, and only directories, carry a trailing slash
        for path in listing.iter().filter(|p| !p.ends_with('/')) {
            let relative =
                relative_to_submission(path, submission).ok_or_else(|| SvnError::OutsideSubmission {
                    path: path.clone(),
                    submission: submission_path.clone(),
                })?;

            let target_file = relative
                .split('/')
                .filter(|c| !c.is_empty())
                .fold(target.to_path_buf(), |acc, c| acc.join(c));

            self.checkout_file(transaction, path, &target_file)?;
        }

        Ok(())
    }
}
