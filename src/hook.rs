//! The commit hook: checks every submission touched by a transaction.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::collector::ResultCollector;
use crate::config::{ConfigError, Configuration, InfrastructureErrorPolicy};
use crate::message::ResultMessage;
use crate::runner::CheckRunner;
use crate::submission::{Phase, Submission, TransactionInfo};
use crate::svn::{SvnError, SvnInterface};

/// Tool name of messages produced by the hook itself.
pub const HOOK_TOOL: &str = "hook";
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Infrastructure errors that prevent checking a submission.
#[derive(Error, Debug)]
pub enum HookError {
    #[error(transparent)]
    Svn(#[from] SvnError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not create checkout directory: {0}")]
    TempDir(#[source] std::io::Error),
}

impl HookError {
    /// Whether every remaining submission would fail the same way.
    pub fn is_invocation_wide(&self) -> bool {
        matches!(self, HookError::Svn(e) if e.is_invocation_wide())
    }
}

/// Record the generic internal error, failing the invocation.
pub fn record_internal_error(collector: &mut ResultCollector, submission: Option<&Submission>) {
    collector.add_check_result(false);
    collector.add_message(ResultMessage::error(HOOK_TOOL, INTERNAL_ERROR_MESSAGE), submission);
}

/// One hook invocation for a transaction (pre-commit) or revision
/// (post-commit).
pub struct SubmissionHook<'a> {
    svn: &'a dyn SvnInterface,
    configuration: &'a Configuration,
    phase: Phase,
    repository: PathBuf,
    transaction_id: String,
    runner: CheckRunner,
}

impl<'a> SubmissionHook<'a> {
    pub fn new(
        svn: &'a dyn SvnInterface,
        configuration: &'a Configuration,
        phase: Phase,
        repository: impl Into<PathBuf>,
        transaction_id: impl Into<String>,
    ) -> Self {
        Self {
            svn,
            configuration,
            phase,
            repository: repository.into(),
            transaction_id: transaction_id.into(),
            runner: CheckRunner::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn repository(&self) -> &Path {
        &self.repository
    }

    /// Run all checks and collect their results.
    ///
    /// Never fails: infrastructure errors end up in the collector as a
    /// `hook` error message.
    pub fn execute(&self) -> ResultCollector {
        let mut collector = ResultCollector::new();
        if let Err(e) = self.check_transaction(&mut collector) {
            tracing::error!(error = %e, "internal error, stopping");
            record_internal_error(&mut collector, None);
        }
        collector
    }

    fn check_transaction(&self, collector: &mut ResultCollector) -> Result<(), HookError> {
        let transaction =
            self.svn
                .resolve_transaction(self.phase, &self.repository, &self.transaction_id)?;
        tracing::info!(author = %transaction.author, phase = %self.phase, "commit author");

        if self.configuration.is_unrestricted(&transaction.author) {
            tracing::info!(author = %transaction.author, "unrestricted user, skipping all checks");
            return Ok(());
        }

        let submissions = self.svn.modified_submissions(&transaction)?;
        tracing::info!(
            submissions = ?submissions.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "affected submissions"
        );

        for submission in &submissions {
            match self.check_submission(&transaction, submission, collector) {
                Ok(success) => {
                    tracing::info!(
                        submission = %submission,
                        result = if success { "successful" } else { "unsuccessful" },
                        "check result"
                    );
                }
                Err(e)
                    if self.configuration.infrastructure_errors == InfrastructureErrorPolicy::Isolate
                        && !e.is_invocation_wide() =>
                {
                    tracing::error!(submission = %submission, error = %e, "could not check submission");
                    record_internal_error(collector, Some(submission));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn check_submission(
        &self,
        transaction: &TransactionInfo,
        submission: &Submission,
        collector: &mut ResultCollector,
    ) -> Result<bool, HookError> {
        tracing::debug!(submission = %submission, "checking submission");

        let checkout = tempfile::Builder::new()
            .prefix("submission-check")
            .tempdir()
            .map_err(HookError::TempDir)?;
        self.svn
            .checkout_submission(transaction, submission, checkout.path())?;

        let checks = self.configuration.checks_for(submission, self.phase)?;
        Ok(self
            .runner
            .run(collector, Some(submission), &checks, checkout.path()))
    }
}
