//! Runs an ordered list of checks against one submission.

use std::path::Path;

use crate::checks::Check;
use crate::collector::ResultCollector;
use crate::submission::Submission;

/// Executes checks in order, stopping at the first failure.
///
/// The runner holds no state of its own and can be reused for any number
/// of submissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckRunner;

impl CheckRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `checks` against `dir` and forward their results to `collector`.
    ///
    /// Returns `true` if every check succeeded. Checks after the first
    /// failing one are not run.
    pub fn run(
        &self,
        collector: &mut ResultCollector,
        submission: Option<&Submission>,
        checks: &[Box<dyn Check>],
        dir: &Path,
    ) -> bool {
        for check in checks {
            tracing::debug!(check = check.name(), dir = %dir.display(), "running check");
            let outcome = check.run(dir);
            tracing::info!(
                check = check.name(),
                success = outcome.success,
                messages = outcome.messages.len(),
                "check finished"
            );

            collector.add_check_result(outcome.success);
            for message in outcome.messages {
                collector.add_message(message, submission);
            }

            if !outcome.success {
                return false;
            }
        }
        true
    }
}
