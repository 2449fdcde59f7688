//! Compiles the submission with the `javac` command-line compiler.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

use super::{find_java_files, relative_path, Check, CheckOutcome};
use crate::message::{ResultMessage, Severity};
use crate::process::{ProcessRunner, StdoutTarget};

pub const CHECK_NAME: &str = "javac";

pub const DEFAULT_JAVAC: &str = "javac";
pub const DEFAULT_JAVA_VERSION: u32 = 11;

lazy_static! {
    static ref JAVAC_OUTPUT: Regex =
        Regex::new(r"^(?P<file>.+):(?P<line>\d+): (?P<kind>error|warning): (?P<message>.+)$").unwrap();
}

/// Compiles all Java files; compiler errors fail the check.
#[derive(Debug, Clone)]
pub struct JavacCheck {
    command: String,
    java_version: u32,
    encoding: String,
    enable_warnings: bool,
    classpath: Vec<PathBuf>,
}

impl Default for JavacCheck {
    fn default() -> Self {
        Self {
            command: DEFAULT_JAVAC.to_string(),
            java_version: DEFAULT_JAVA_VERSION,
            encoding: "UTF-8".to_string(),
            enable_warnings: false,
            classpath: Vec::new(),
        }
    }
}

impl JavacCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn java_version(mut self, version: u32) -> Self {
        self.java_version = version;
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn enable_warnings(mut self, enable: bool) -> Self {
        self.enable_warnings = enable;
        self
    }

    pub fn classpath(mut self, classpath: Vec<PathBuf>) -> Self {
        self.classpath = classpath;
        self
    }

    fn build_args(&self, submission_dir: &Path, output_dir: &Path, files: &[PathBuf]) -> Vec<String> {
        let mut args = vec![
            "-encoding".to_string(),
            self.encoding.clone(),
            "--release".to_string(),
            self.java_version.to_string(),
            "-d".to_string(),
            output_dir.to_string_lossy().into_owned(),
        ];

        if self.enable_warnings {
            args.push("-Xlint".to_string());
        }

        if !self.classpath.is_empty() {
            let absolute: Vec<PathBuf> = self
                .classpath
                .iter()
                .map(|p| std::path::absolute(p).unwrap_or_else(|_| p.clone()))
                .collect();
            if let Ok(joined) = std::env::join_paths(absolute) {
                args.push("--class-path".to_string());
                args.push(joined.to_string_lossy().into_owned());
            }
        }

        args.extend(
            files
                .iter()
                .map(|f| relative_path(submission_dir, f).to_string_lossy().into_owned()),
        );
        args
    }

    fn internal_error() -> CheckOutcome {
        CheckOutcome::new(
            false,
            vec![ResultMessage::error(
                CHECK_NAME,
                "An internal error occurred while running javac",
            )],
        )
    }
}

/// Turn javac diagnostics into messages.
///
/// A diagnostic line is followed by the offending source line and a caret
/// line; the caret position becomes the 1-based column.
pub fn parse_javac_output<S: AsRef<str>>(lines: &[S]) -> Vec<ResultMessage> {
    let mut messages = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].as_ref();
        if let Some(caps) = JAVAC_OUTPUT.captures(line) {
            let severity = if &caps["kind"] == "error" {
                Severity::Error
            } else {
                Severity::Warning
            };
            let mut message = ResultMessage::new(CHECK_NAME, severity, &caps["message"])
                .with_file(caps["file"].replace('\\', "/"));
            if let Ok(line_number) = caps["line"].parse::<u32>() {
                message = message.with_line(line_number);
            }

            if let Some(caret_line) = lines.get(i + 2).map(|l| l.as_ref()) {
                if caret_line.trim() == "^" {
                    if let Some(index) = caret_line.find('^') {
                        message = message.with_column(index as u32 + 1);
                    }
                    i += 2;
                }
            }
            messages.push(message);
        }
        i += 1;
    }
    messages
}

impl Check for JavacCheck {
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
            tracing::debug!("no java files to compile");
            return CheckOutcome::passed();
        }

        let output_dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(error = %e, "failed to create javac output directory");
                return Self::internal_error();
            }
        };

        let runner = match ProcessRunner::new() {
            Ok(runner) => runner,
            Err(e) => {
                tracing::warn!(error = %e, "failed to create process runtime");
                return Self::internal_error();
            }
        };

        let args = self.build_args(submission_dir, output_dir.path(), &files);
        let output = match runner.run(&self.command, &args, Some(submission_dir), StdoutTarget::Discard) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(error = %e, "exception while running javac");
                return Self::internal_error();
            }
        };

        let success = output.success();
        let mut messages = parse_javac_output(&output.stderr);
        if !success && messages.is_empty() {
            messages.push(ResultMessage::error(CHECK_NAME, "javac failed without message"));
        }

        CheckOutcome::new(success, messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_error_with_column() {
        let output = [
            "Main.java:4: error: ';' expected",
            "        System.out.println(\"Hello World!\")",
            "                                                  ^",
            "1 error",
        ];
        let messages = parse_javac_output(&output);
        assert_eq!(
            messages,
            vec![ResultMessage::error(CHECK_NAME, "';' expected")
                .with_file("Main.java")
                .with_line(4)
                .with_column(51)]
        );
    }

    #[test]
    fn test_parse_warning_without_caret() {
        let output = [
            "src/pkg/Util.java:10: warning: [rawtypes] found raw type: List",
            "1 warning",
        ];
        let messages = parse_javac_output(&output);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::Warning);
        assert_eq!(messages[0].file(), Some(Path::new("src/pkg/Util.java")));
        assert_eq!(messages[0].line(), Some(10));
        assert_eq!(messages[0].column(), None);
    }

    #[test]
    fn test_parse_multiple_errors() {
        let output = [
            "A.java:1: error: class, interface, enum, or record expected",
            "garbage",
            "^",
            "B.java:2: error: cannot find symbol",
            "    foo();",
            "    ^",
            "  symbol:   method foo()",
            "2 errors",
        ];
        let messages = parse_javac_output(&output);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].column(), Some(1));
        assert_eq!(messages[1].file(), Some(Path::new("B.java")));
        assert_eq!(messages[1].column(), Some(5));
    }

    #[test]
    fn test_build_args() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let files = vec![temp.path().join("Main.java"), temp.path().join("pkg/Util.java")];

        let args = JavacCheck::new()
            .java_version(17)
            .enable_warnings(true)
            .build_args(temp.path(), &out, &files);

        assert_eq!(&args[..4], &["-encoding", "UTF-8", "--release", "17"]);
        assert_eq!(args[4], "-d");
        assert!(args.contains(&"-Xlint".to_string()));
        assert!(!args.contains(&"--class-path".to_string()));
        assert_eq!(&args[args.len() - 2..], &["Main.java", "pkg/Util.java"]);
    }

    #[test]
    fn test_no_java_files_passes() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("README.txt"), "hello").unwrap();

        let outcome = JavacCheck::new()
            .command("/nonexistent/javac")
            .run(temp.path());
        assert!(outcome.success);
        assert!(outcome.messages.is_empty());
    }

    #[test]
    fn test_invalid_command_is_internal_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Main.java"), "class Main {}").unwrap();

        let outcome = JavacCheck::new()
            .command("/nonexistent/javac")
            .run(temp.path());
        assert!(!outcome.success);
        assert_eq!(
            outcome.messages,
            vec![ResultMessage::error(
                CHECK_NAME,
                "An internal error occurred while running javac"
            )]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_without_output() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Main.java"), "class Main {}").unwrap();

        let outcome = JavacCheck::new().command("false").run(temp.path());
        assert!(!outcome.success);
        assert_eq!(
            outcome.messages,
            vec![ResultMessage::error(CHECK_NAME, "javac failed without message")]
        );
    }
}
