//! submission-check - a Subversion hook that checks student submissions.
//!
//! Submissions are stored in the repository as `<exercise>/<group>/...`.
//! On every commit the hook finds the submissions the commit touched,
//! checks each one out into a temporary directory and runs the configured
//! checks against it. The result is reported back to the committer as XML
//! on stderr.
//!
//! # Architecture
//!
//! - `svn`: access to the repository through `svnlook`
//! - `process`: subprocess execution shared by `svn` and the checks
//! - `checks`: the individual checks (file size, encoding, eclipse
//!   project, javac, checkstyle)
//! - `runner`: runs the checks of one submission in order
//! - `collector`: aggregates results and computes the exit code
//! - `config`: YAML configuration with per-exercise overrides
//! - `report`: XML, JSON and pretty output
//! - `hook`: ties everything together for one invocation

pub mod checks;
pub mod cli;
pub mod collector;
pub mod config;
pub mod hook;
pub mod logging;
pub mod message;
pub mod process;
pub mod report;
pub mod runner;
pub mod submission;
pub mod svn;

pub use checks::{Check, CheckKind, CheckOutcome};
pub use collector::ResultCollector;
pub use config::Configuration;
pub use hook::SubmissionHook;
pub use message::{ResultMessage, Severity};
pub use runner::CheckRunner;
pub use submission::{Phase, Submission, TransactionInfo};
pub use svn::{CliSvnInterface, SvnError, SvnInterface};
