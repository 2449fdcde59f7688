//! Aggregation of check results and messages over one hook invocation.

use std::collections::BTreeMap;

use crate::message::ResultMessage;
use crate::submission::{Phase, Submission};

/// Collects every check result and message of one invocation.
#[derive(Debug, Clone)]
pub struct ResultCollector {
    messages: Vec<ResultMessage>,
    per_submission: BTreeMap<Submission, Vec<ResultMessage>>,
    all_successful: bool,
}

impl Default for ResultCollector {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            per_submission: BTreeMap::new(),
            all_successful: true,
        }
    }
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of one check. A single failure is permanent.
    pub fn add_check_result(&mut self, success: bool) {
        self.all_successful &= success;
    }

    /// Record a message, optionally attributed to a submission.
    pub fn add_message(&mut self, message: ResultMessage, submission: Option<&Submission>) {
        if let Some(submission) = submission {
            self.per_submission
                .entry(submission.clone())
                .or_default()
                .push(message.clone());
        }
        self.messages.push(message);
    }

    /// All messages in the order they were recorded.
    pub fn messages(&self) -> &[ResultMessage] {
        &self.messages
    }

    pub fn messages_for(&self, submission: &Submission) -> &[ResultMessage] {
        self.per_submission
            .get(submission)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn submissions(&self) -> impl Iterator<Item = (&Submission, &[ResultMessage])> {
        self.per_submission.iter().map(|(s, m)| (s, m.as_slice()))
    }

    pub fn all_successful(&self) -> bool {
        self.all_successful
    }

    /// Process exit code for the hook.
    ///
    /// A pre-commit hook blocks the commit only on failed checks. Output of a
    /// post-commit hook is only shown to the committer on a non-zero exit, so
    /// any message at all makes it exit with 1.
    pub fn exit_code(&self, phase: Phase) -> i32 {
        let ok = match phase {
            Phase::PreCommit => self.all_successful,
            Phase::PostCommit => self.all_successful && self.messages.is_empty(),
        };
        if ok {
            0
        } else {
            1
        }
    }
}
