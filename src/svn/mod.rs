//! Access to the Subversion repository the hook runs for.
//!
//! The hook never links against a native svn library. Everything it needs
//! is obtained from the `svnlook` command-line tool:
//!
//! - `svnlook author`: who committed
//! - `svnlook changed`: which paths changed, mapped to [`Submission`]s
//! - `svnlook tree` + `svnlook cat`: the file content of one submission

mod changes;
mod cli;

pub use changes::{parse_change_line, ChangeKind};
pub use cli::{CliSvnInterface, DEFAULT_SVNLOOK};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::process::ProcessError;
use crate::submission::{Phase, Submission, TransactionInfo};

/// Errors that can occur while talking to the repository.
#[derive(Error, Debug)]
pub enum SvnError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("svnlook {subcommand} exited with exit code {code:?}")]
    ExitStatus {
        subcommand: String,
        code: Option<i32>,
    },
    #[error("svnlook {subcommand} created {lines} lines of output, expected 1")]
    UnexpectedLineCount { subcommand: String, lines: usize },
    #[error("got empty line from svnlook changed")]
    EmptyChangeLine,
    #[error("got invalid change {code:?} in line {line:?}")]
    InvalidChangeCode { code: String, line: String },
    #[error("{path} is not inside submission folder {submission}")]
    OutsideSubmission { path: String, submission: String },
    #[error("failed to create process runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("could not create {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SvnError {
    /// Whether this error means the backend tool itself is unusable, so that
    /// every further call in this invocation would fail the same way.
    pub fn is_invocation_wide(&self) -> bool {
        matches!(
            self,
            SvnError::Process(ProcessError::Spawn { .. }) | SvnError::Process(ProcessError::Timeout { .. })
        )
    }
}

/// Operations the hook needs from the repository.
///
/// All calls within one hook invocation receive the same [`TransactionInfo`],
/// the one returned by [`resolve_transaction`](Self::resolve_transaction).
pub trait SvnInterface {
    /// Query the author of the transaction and build its [`TransactionInfo`].
    fn resolve_transaction(
        &self,
        phase: Phase,
        repository: &Path,
        transaction_id: &str,
    ) -> Result<TransactionInfo, SvnError>;

    /// Determine the submissions that contain changed content.
    fn modified_submissions(
        &self,
        transaction: &TransactionInfo,
    ) -> Result<BTreeSet<Submission>, SvnError>;

    /// Write every file of `submission` into the empty directory `target`.
    fn checkout_submission(
        &self,
        transaction: &TransactionInfo,
        submission: &Submission,
        target: &Path,
    ) -> Result<(), SvnError>;
}
