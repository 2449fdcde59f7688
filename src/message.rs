//! Messages produced by checks and by the hook itself.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Severity of a result message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// A single diagnostic reported back to the committer.
///
/// The location is optional and nested: a line is only meaningful together
/// with a file, a column only together with a line. Use [`file`](Self::file),
/// [`line`](Self::line) and [`column`](Self::column) to read the location
/// with that rule applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultMessage {
    pub check_name: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    column: Option<u32>,
}

impl ResultMessage {
    pub fn new(check_name: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            check_name: check_name.into(),
            severity,
            message: message.into(),
            file: None,
            line: None,
            column: None,
        }
    }

    pub fn error(check_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(check_name, Severity::Error, message)
    }

    pub fn warning(check_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(check_name, Severity::Warning, message)
    }

    /// Attach a file, relative to the submission root.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn line(&self) -> Option<u32> {
        self.file.as_ref().and(self.line)
    }

    pub fn column(&self) -> Option<u32> {
        self.line().and(self.column)
    }

    /// File path with `/` separators, as shown to students.
    pub fn file_display(&self) -> Option<String> {
        self.file()
            .map(|f| f.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/"))
    }
}

impl std::fmt::Display for ResultMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.check_name, self.severity)?;
        if let Some(file) = self.file_display() {
            write!(f, " in {}", file)?;
            if let Some(line) = self.line() {
                write!(f, ":{}", line)?;
                if let Some(column) = self.column() {
                    write!(f, ":{}", column)?;
                }
            }
        }
        write!(f, ": {}", self.message)
    }
}
