//! Configuration schema for submission-check.
//!
//! The configuration is a YAML file. Settings for checks live in the `all`
//! section and can be overridden per exercise in `exercises.<name>`;
//! resolution is key by key, so an exercise only needs to name the values it
//! changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::checks::{
    Check, CheckKind, CheckstyleCheck, EclipseConfigCheck, EncodingCheck, FileSizeCheck, JavacCheck,
};
use crate::submission::{Phase, Submission};
use crate::svn::DEFAULT_SVNLOOK;

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Errors in the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
    #[error("invalid java version: {0}")]
    InvalidJavaVersion(u32),
    #[error("required checkstyle.rules not configured for exercise {0}")]
    MissingCheckstyleRules(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Configuration {
    /// trace, debug, info (default), warn or error
    #[serde(default)]
    pub log_level: Option<String>,
    /// Users whose commits are never checked. Entries may also be
    /// comma-separated lists.
    #[serde(default)]
    pub unrestricted_users: Vec<String>,
    #[serde(default)]
    pub infrastructure_errors: InfrastructureErrorPolicy,
    #[serde(default)]
    pub svnlook: SvnLookConfig,
    #[serde(default)]
    pub checks: PhaseChecks,
    /// Settings for every exercise.
    #[serde(default)]
    pub all: ExerciseSettings,
    /// Per-exercise overrides of `all`.
    #[serde(default)]
    pub exercises: BTreeMap<String, ExerciseSettings>,
}

/// What to do when checking out or configuring one submission fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InfrastructureErrorPolicy {
    /// Report the error for that submission and continue with the next one.
    #[default]
    Isolate,
    /// Stop processing and report a single internal error.
    Abort,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SvnLookConfig {
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments placed before the svnlook sub-command.
    #[serde(default)]
    pub args: Vec<String>,
    /// Deadline for a single svnlook call; unbounded if absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl SvnLookConfig {
    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or(DEFAULT_SVNLOOK)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// The ordered check list of each phase.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhaseChecks {
    #[serde(default = "PhaseChecks::default_pre_commit")]
    pub pre_commit: Vec<CheckKind>,
    #[serde(default = "PhaseChecks::default_post_commit")]
    pub post_commit: Vec<CheckKind>,
}

impl PhaseChecks {
    fn default_pre_commit() -> Vec<CheckKind> {
        vec![
            CheckKind::FileSize,
            CheckKind::Encoding,
            CheckKind::EclipseConfiguration,
        ]
    }

    fn default_post_commit() -> Vec<CheckKind> {
        vec![
            CheckKind::EclipseConfiguration,
            CheckKind::Javac,
            CheckKind::Checkstyle,
        ]
    }

    pub fn for_phase(&self, phase: Phase) -> &[CheckKind] {
        match phase {
            Phase::PreCommit => &self.pre_commit,
            Phase::PostCommit => &self.post_commit,
        }
    }
}

impl Default for PhaseChecks {
    fn default() -> Self {
        Self {
            pre_commit: Self::default_pre_commit(),
            post_commit: Self::default_post_commit(),
        }
    }
}

/// Check settings of `all` or of one exercise. Every value is optional.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ExerciseSettings {
    /// Maximum size of a single file in bytes.
    #[serde(default)]
    pub max_file_size: Option<u64>,
    /// Maximum size of the whole submission in bytes.
    #[serde(default)]
    pub max_size: Option<u64>,
    /// Encoding of text files, also passed to the compiler.
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub eclipse: EclipseSettings,
    #[serde(default)]
    pub javac: JavacSettings,
    #[serde(default)]
    pub checkstyle: CheckstyleSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EclipseSettings {
    #[serde(default)]
    pub require_java: Option<bool>,
    #[serde(default)]
    pub require_checkstyle: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct JavacSettings {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub warnings: Option<bool>,
    #[serde(default)]
    pub classpath: Option<Vec<PathBuf>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CheckstyleSettings {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub rules: Option<PathBuf>,
}

impl Configuration {
    /// Parse and validate a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // an empty document deserializes to unit, not to a mapping
        let config: Configuration = if content.trim().is_empty() {
            Configuration::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail later, when a check is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level()?;

        for settings in std::iter::once(&self.all).chain(self.exercises.values()) {
            if let Some(encoding) = &settings.encoding {
                if EncodingCheck::for_label(encoding).is_none() {
                    return Err(ConfigError::InvalidEncoding(encoding.clone()));
                }
            }
            if let Some(version) = settings.javac.version {
                if version == 0 {
                    return Err(ConfigError::InvalidJavaVersion(version));
                }
            }
        }
        Ok(())
    }

    /// The configured log level, `info` if unset.
    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        let level = self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL);
        level
            .trim()
            .parse::<tracing::Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(level.to_string()))
    }

    pub fn unrestricted_users(&self) -> Vec<String> {
        self.unrestricted_users
            .iter()
            .flat_map(|entry| entry.split(','))
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn is_unrestricted(&self, author: &str) -> bool {
        self.unrestricted_users().iter().any(|user| user == author)
    }

    /// Resolve one setting for `exercise`: the exercise's own value, else the
    /// value from `all`.
    fn setting<T>(&self, exercise: &str, get: impl Fn(&ExerciseSettings) -> Option<T>) -> Option<T> {
        self.exercises
            .get(exercise)
            .and_then(&get)
            .or_else(|| get(&self.all))
    }

    fn encoding_label(&self, exercise: &str) -> String {
        self.setting(exercise, |s| s.encoding.clone())
            .unwrap_or_else(|| DEFAULT_ENCODING.to_string())
    }

    pub fn file_size_check(&self, submission: &Submission) -> FileSizeCheck {
        let exercise = submission.exercise();
        let mut check = FileSizeCheck::new();
        if let Some(max) = self.setting(exercise, |s| s.max_file_size) {
            check = check.max_file_size(max);
        }
        if let Some(max) = self.setting(exercise, |s| s.max_size) {
            check = check.max_submission_size(max);
        }
        check
    }

    pub fn encoding_check(&self, submission: &Submission) -> Result<EncodingCheck, ConfigError> {
        let label = self.encoding_label(submission.exercise());
        EncodingCheck::for_label(&label).ok_or(ConfigError::InvalidEncoding(label))
    }

    /// In `basic` mode only the presence of a valid project is checked.
    pub fn eclipse_check(&self, submission: &Submission, basic: bool) -> EclipseConfigCheck {
        if basic {
            return EclipseConfigCheck::new();
        }
        let exercise = submission.exercise();
        EclipseConfigCheck::new()
            .require_java(self.setting(exercise, |s| s.eclipse.require_java).unwrap_or(false))
            .require_checkstyle(
                self.setting(exercise, |s| s.eclipse.require_checkstyle)
                    .unwrap_or(false),
            )
    }

    pub fn javac_check(&self, submission: &Submission) -> JavacCheck {
        let exercise = submission.exercise();
        let mut check = JavacCheck::new().encoding(self.encoding_label(exercise));
        if let Some(command) = self.setting(exercise, |s| s.javac.command.clone()) {
            check = check.command(command);
        }
        if let Some(version) = self.setting(exercise, |s| s.javac.version) {
            check = check.java_version(version);
        }
        if let Some(warnings) = self.setting(exercise, |s| s.javac.warnings) {
            check = check.enable_warnings(warnings);
        }
        if let Some(classpath) = self.setting(exercise, |s| s.javac.classpath.clone()) {
            check = check.classpath(classpath);
        }
        check
    }

    pub fn checkstyle_check(&self, submission: &Submission) -> Result<CheckstyleCheck, ConfigError> {
        let exercise = submission.exercise();
        let rules = self
            .setting(exercise, |s| s.checkstyle.rules.clone())
            .ok_or_else(|| ConfigError::MissingCheckstyleRules(exercise.to_string()))?;

        let mut check = CheckstyleCheck::new(rules);
        if let Some(command) = self.setting(exercise, |s| s.checkstyle.command.clone()) {
            check = check.command(command);
        }
        if let Some(args) = self.setting(exercise, |s| s.checkstyle.args.clone()) {
            check = check.command_args(args);
        }
        Ok(check)
    }

    /// Build the ordered checks to run for `submission` in `phase`.
    pub fn checks_for(&self, submission: &Submission, phase: Phase) -> Result<Vec<Box<dyn Check>>, ConfigError> {
        let basic_eclipse = phase == Phase::PreCommit;
        let mut checks: Vec<Box<dyn Check>> = Vec::new();

        for kind in self.checks.for_phase(phase) {
            let check: Box<dyn Check> = match kind {
                CheckKind::FileSize => Box::new(self.file_size_check(submission)),
                CheckKind::Encoding => Box::new(self.encoding_check(submission)?),
                CheckKind::EclipseConfiguration => Box::new(self.eclipse_check(submission, basic_eclipse)),
                CheckKind::Javac => Box::new(self.javac_check(submission)),
                CheckKind::Checkstyle => Box::new(self.checkstyle_check(submission)?),
            };
            checks.push(check);
        }
        Ok(checks)
    }
}
