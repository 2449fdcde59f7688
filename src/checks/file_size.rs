//! Limits on the size of single files and of the whole submission.

use std::path::Path;

use super::{find_files, relative_path, Check, CheckOutcome};
use crate::message::ResultMessage;

pub const CHECK_NAME: &str = "file-size";

/// Default limit for both single files and the whole submission: 10 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// Rejects submissions with files or a total size above the limits.
#[derive(Debug, Clone)]
pub struct FileSizeCheck {
    max_file_size: u64,
    max_submission_size: u64,
}

impl Default for FileSizeCheck {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_SIZE,
            max_submission_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl FileSizeCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn max_submission_size(mut self, bytes: u64) -> Self {
        self.max_submission_size = bytes;
        self
    }

    pub fn file_limit(&self) -> u64 {
        self.max_file_size
    }

    pub fn submission_limit(&self) -> u64 {
        self.max_submission_size
    }
}

impl Check for FileSizeCheck {
    fn name(&self) -> &'static str {
        CHECK_NAME
    }

    fn run(&self, submission_dir: &Path) -> CheckOutcome {
        let mut messages = Vec::new();
        let mut total: u64 = 0;

        let sizes = find_files(submission_dir)
            .map_err(std::io::Error::from)
            .and_then(|files| {
                files
                    .into_iter()
                    .map(|f| Ok((std::fs::metadata(&f)?.len(), f)))
                    .collect::<std::io::Result<Vec<_>>>()
            });

        match sizes {
            Ok(sizes) => {
                for (size, file) in sizes {
                    total += size;
                    if size > self.max_file_size {
                        messages.push(
                            ResultMessage::error(CHECK_NAME, "File is too large")
                                .with_file(relative_path(submission_dir, &file)),
                        );
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to determine file sizes");
                messages.push(ResultMessage::error(
                    CHECK_NAME,
                    "An internal error occurred while checking file-sizes",
                ));
            }
        }

        if total > self.max_submission_size {
            messages.push(ResultMessage::error(CHECK_NAME, "Submission size is too large"));
        }

        CheckOutcome::new(messages.is_empty(), messages)
    }
}
