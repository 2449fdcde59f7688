//! Verifies that text files are stored in the expected character encoding.

use encoding_rs::Encoding;
use std::path::Path;

use super::{find_files, relative_path, Check, CheckOutcome};
use crate::message::ResultMessage;

pub const CHECK_NAME: &str = "encoding";

/// Extensions of files that are expected to be text.
const TEXT_EXTENSIONS: &[&str] = &[
    "java",
    "txt",
    "md",
    "xml",
    "properties",
    "classpath",
    "project",
    "prefs",
];

/// Fails for every text file that does not decode in the wanted encoding.
#[derive(Debug, Clone)]
pub struct EncodingCheck {
    encoding: &'static Encoding,
}

impl Default for EncodingCheck {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::UTF_8,
        }
    }
}

impl EncodingCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an encoding by its WHATWG label (`UTF-8`, `ISO-8859-1`, ...).
    pub fn for_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.trim().as_bytes()).map(|encoding| Self { encoding })
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    fn is_text_file(path: &Path) -> bool {
        let by_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| TEXT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);
        // dot-files like `.classpath` have no extension, only a stem
        let by_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix('.'))
            .map(|n| TEXT_EXTENSIONS.contains(&n))
            .unwrap_or(false);
        by_extension || by_name
    }

    fn decodes(&self, bytes: &[u8]) -> bool {
        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .is_some()
    }
}

impl Check for EncodingCheck {
    fn name(&self) -> &'static str {
        CHECK_NAME
    }

    fn run(&self, submission_dir: &Path) -> CheckOutcome {
        let files = match find_files(submission_dir) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list files for encoding check");
                return CheckOutcome::new(
                    false,
                    vec![ResultMessage::error(
                        CHECK_NAME,
                        "An internal error occurred while checking file encodings",
                    )],
                );
            }
        };

        let mut messages = Vec::new();
        for file in files.iter().filter(|f| Self::is_text_file(f)) {
            let relative = relative_path(submission_dir, file);
            match std::fs::read(file) {
                Ok(bytes) if self.decodes(&bytes) => {}
                Ok(_) => messages.push(
                    ResultMessage::error(
                        CHECK_NAME,
                        format!("File has invalid encoding; expected {}", self.encoding.name()),
                    )
                    .with_file(relative),
                ),
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "failed to read file");
                    messages.push(
                        ResultMessage::error(
                            CHECK_NAME,
                            "An internal error occurred while checking file encodings",
                        )
                        .with_file(relative),
                    );
                }
            }
        }

        CheckOutcome::new(messages.is_empty(), messages)
    }
}
