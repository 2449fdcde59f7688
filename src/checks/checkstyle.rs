//! Runs the Checkstyle command-line tool with a rules file.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

use super::{find_java_files, relative_path, Check, CheckOutcome};
use crate::message::{ResultMessage, Severity};
use crate::process::{ProcessRunner, StdoutTarget};

pub const CHECK_NAME: &str = "checkstyle";

pub const DEFAULT_CHECKSTYLE: &str = "checkstyle";

lazy_static! {
    static ref CHECKSTYLE_OUTPUT: Regex = Regex::new(
        r"^\[(?P<level>ERROR|WARN)\] (?P<file>.+?):(?P<line>\d+)(?::(?P<column>\d+))?: (?P<message>.*?)(?: \[(?P<rule>\w+)\])?$"
    )
    .unwrap();
}

/// Style check; violations reported as errors fail the check.
#[derive(Debug, Clone)]
pub struct CheckstyleCheck {
    command: String,
    command_args: Vec<String>,
    rules: PathBuf,
}

impl CheckstyleCheck {
    pub fn new(rules: impl Into<PathBuf>) -> Self {
        Self {
            command: DEFAULT_CHECKSTYLE.to_string(),
            command_args: Vec::new(),
            rules: rules.into(),
        }
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Arguments placed before `-c <rules>`, e.g. `["-jar", "checkstyle.jar"]`
    /// when the command is `java`.
    pub fn command_args(mut self, args: Vec<String>) -> Self {
        self.command_args = args;
        self
    }

    pub fn rules(&self) -> &Path {
        &self.rules
    }

    fn internal_error() -> CheckOutcome {
        CheckOutcome::new(
            false,
            vec![ResultMessage::error(
                CHECK_NAME,
                "An internal error occurred while running checkstyle",
            )],
        )
    }
}

/// Turn checkstyle's plain output into messages with paths relative to
/// `submission_dir`.
pub fn parse_checkstyle_output<S: AsRef<str>>(lines: &[S], submission_dir: &Path) -> Vec<ResultMessage> {
    let canonical = submission_dir.canonicalize().ok();

    lines
        .iter()
        .filter_map(|line| CHECKSTYLE_OUTPUT.captures(line.as_ref()))
        .map(|caps| {
            let severity = if &caps["level"] == "ERROR" {
                Severity::Error
            } else {
                Severity::Warning
            };

            let file = Path::new(&caps["file"]);
            let file = match &canonical {
                Some(c) if file.starts_with(c) => relative_path(c, file),
                _ => relative_path(submission_dir, file),
            };

            let mut message = ResultMessage::new(CHECK_NAME, severity, &caps["message"]).with_file(file);
            if let Ok(line) = caps["line"].parse::<u32>() {
                message = message.with_line(line);
            }
            if let Some(column) = caps.name("column").and_then(|c| c.as_str().parse::<u32>().ok()) {
                message = message.with_column(column);
            }
            message
        })
        .collect()
}

impl Check for CheckstyleCheck {
    fn name(&self) -> &'static str {
        CHECK_NAME
    }

    fn run(&self, submission_dir: &Path) -> CheckOutcome {
        let files = match find_java_files(submission_dir) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list java files");
                return Self::internal_error();
            }
        };

        if files.is_empty() {
            return CheckOutcome::passed();
        }

        let rules = std::path::absolute(&self.rules).unwrap_or_else(|_| self.rules.clone());
        let mut args = self.command_args.clone();
        args.push("-c".to_string());
        args.push(rules.to_string_lossy().into_owned());
        args.extend(
            files
                .iter()
                .map(|f| relative_path(submission_dir, f).to_string_lossy().into_owned()),
        );

        let output = match ProcessRunner::new()
            .map_err(|e| e.to_string())
            .and_then(|runner| {
                runner
                    .run(&self.command, &args, Some(submission_dir), StdoutTarget::Capture)
                    .map_err(|e| e.to_string())
            }) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(error = %e, "exception while running checkstyle");
                return Self::internal_error();
            }
        };

        let messages = parse_checkstyle_output(&output.stdout, submission_dir);
        let has_errors = messages.iter().any(|m| m.severity == Severity::Error);

        if !output.success() && messages.is_empty() {
            return CheckOutcome::new(
                false,
                vec![ResultMessage::error(CHECK_NAME, "checkstyle failed without message")],
            );
        }

        CheckOutcome::new(!has_errors, messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_plain_output() {
        let temp = TempDir::new().unwrap();
        let main = temp.path().join("Main.java");
        let output = vec![
            "Starting audit...".to_string(),
            format!(
                "[WARN] {}:12:5: Missing a Javadoc comment. [MissingJavadocMethod]",
                main.display()
            ),
            "[ERROR] src/Util.java:3: Line is longer than 80 characters (found 93). [LineLength]"
                .to_string(),
            "Audit done.".to_string(),
            "Checkstyle ends with 1 errors.".to_string(),
        ];

        let messages = parse_checkstyle_output(&output, temp.path());
        assert_eq!(
            messages,
            vec![
                ResultMessage::warning(CHECK_NAME, "Missing a Javadoc comment.")
                    .with_file("Main.java")
                    .with_line(12)
                    .with_column(5),
                ResultMessage::error(CHECK_NAME, "Line is longer than 80 characters (found 93).")
                    .with_file("src/Util.java")
                    .with_line(3),
            ]
        );
    }

    #[test]
    fn test_no_java_files_passes() {
        let temp = TempDir::new().unwrap();
        let outcome = CheckstyleCheck::new("rules.xml")
            .command("/nonexistent/checkstyle")
            .run(temp.path());
        assert!(outcome.success);
    }

    #[cfg(unix)]
    fn run_fake_checkstyle(script: &str) -> CheckOutcome {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Main.java"), "class Main {}").unwrap();
        let tools = TempDir::new().unwrap();
        let script_path = tools.path().join("checkstyle.sh");
        std::fs::write(&script_path, script).unwrap();

        CheckstyleCheck::new("rules.xml")
            .command("sh")
            .command_args(vec![script_path.to_string_lossy().into_owned()])
            .run(temp.path())
    }

    #[cfg(unix)]
    #[test]
    fn test_warnings_only_pass() {
        let outcome = run_fake_checkstyle(
            "echo '[WARN] Main.java:1: Missing a Javadoc comment. [MissingJavadocType]'",
        );
        assert!(outcome.success);
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.messages[0].severity, Severity::Warning);
    }

    #[cfg(unix)]
    #[test]
    fn test_errors_fail() {
        let outcome = run_fake_checkstyle(
            "echo '[ERROR] Main.java:1:1: File does not end with a newline. [NewlineAtEndOfFile]'; exit 1",
        );
        assert!(!outcome.success);
        assert_eq!(outcome.messages[0].column(), Some(1));
        assert_eq!(outcome.messages[0].file(), Some(Path::new("Main.java")));
    }

    #[cfg(unix)]
    #[test]
    fn test_receives_rules_and_files() {
        let outcome = run_fake_checkstyle(
            "[ \"$1\" = -c ] && [ \"$3\" = Main.java ] || exit 3\necho '[WARN] Main.java:2: ok'",
        );
        assert!(outcome.success);
        assert_eq!(outcome.messages[0].message, "ok");
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_without_output() {
        let outcome = run_fake_checkstyle("exit 2");
        assert!(!outcome.success);
        assert_eq!(
            outcome.messages,
            vec![ResultMessage::error(CHECK_NAME, "checkstyle failed without message")]
        );
    }
}
