//! Checks that run against a checked-out submission.
//!
//! A check is a pure function of the submission directory: it returns a
//! [`CheckOutcome`] with its success flag and the messages it produced.
//! Checks keep only their configuration between runs, so running the same
//! check twice never mixes up messages of different runs.

mod checkstyle;
mod eclipse;
mod encoding;
mod file_size;
mod javac;

pub use checkstyle::CheckstyleCheck;
pub use eclipse::{EclipseConfigCheck, EclipseProject};
pub use encoding::EncodingCheck;
pub use file_size::FileSizeCheck;
pub use javac::JavacCheck;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::message::ResultMessage;

/// Result of running one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub success: bool,
    pub messages: Vec<ResultMessage>,
}

impl CheckOutcome {
    pub fn passed() -> Self {
        Self {
            success: true,
            messages: Vec::new(),
        }
    }

    pub fn new(success: bool, messages: Vec<ResultMessage>) -> Self {
        Self { success, messages }
    }
}

/// A quality or compile check.
pub trait Check {
    /// Name used as the `tool` of the messages this check produces.
    fn name(&self) -> &'static str;

    /// Run the check against the submission checked out at `submission_dir`.
    fn run(&self, submission_dir: &Path) -> CheckOutcome;
}

/// Checks that can be named in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    FileSize,
    Encoding,
    EclipseConfiguration,
    Javac,
    Checkstyle,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::FileSize => file_size::CHECK_NAME,
            CheckKind::Encoding => encoding::CHECK_NAME,
            CheckKind::EclipseConfiguration => eclipse::CHECK_NAME,
            CheckKind::Javac => javac::CHECK_NAME,
            CheckKind::Checkstyle => checkstyle::CHECK_NAME,
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// All regular files below `dir`, sorted by path.
pub(crate) fn find_files(dir: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// All `.java` files below `dir`, sorted by path.
pub(crate) fn find_java_files(dir: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    Ok(find_files(dir)?
        .into_iter()
        .filter(|p| p.extension().map(|e| e == "java").unwrap_or(false))
        .collect())
}

/// `path` relative to `base`; unchanged if it is not below `base`.
pub(crate) fn relative_path(base: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
