//! Core records describing a hook invocation: the phase, the transaction and
//! the submissions it touched.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Phase that the hook runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PreCommit,
    PostCommit,
}

impl Phase {
    /// The `svnlook` flag that selects the transaction or revision.
    pub fn svnlook_flag(&self) -> &'static str {
        match self {
            Phase::PreCommit => "--transaction",
            Phase::PostCommit => "--revision",
        }
    }

    /// Parse the phase argument passed by the hook scripts (`PRE` or `POST`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PRE" => Some(Phase::PreCommit),
            "POST" => Some(Phase::PostCommit),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::PreCommit => write!(f, "pre-commit"),
            Phase::PostCommit => write!(f, "post-commit"),
        }
    }
}

/// One group's solution to one exercise, stored at `<exercise>/<group>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Submission {
    exercise: String,
    group: String,
}

impl Submission {
    pub fn new(exercise: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            exercise: exercise.into(),
            group: group.into(),
        }
    }

    pub fn exercise(&self) -> &str {
        &self.exercise
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Path of the submission folder relative to the repository root.
    pub fn path_in_repo(&self) -> PathBuf {
        Path::new(&self.exercise).join(&self.group)
    }
}

impl std::fmt::Display for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.exercise, self.group)
    }
}

/// The transaction a hook invocation runs for.
///
/// `transaction_id` is the svn transaction name in [`Phase::PreCommit`] and
/// the revision number in [`Phase::PostCommit`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionInfo {
    pub repository: PathBuf,
    pub author: String,
    pub transaction_id: String,
    pub phase: Phase,
}

impl TransactionInfo {
    pub fn new(
        repository: impl Into<PathBuf>,
        author: impl Into<String>,
        transaction_id: impl Into<String>,
        phase: Phase,
    ) -> Self {
        Self {
            repository: repository.into(),
            author: author.into(),
            transaction_id: transaction_id.into(),
            phase,
        }
    }
}
