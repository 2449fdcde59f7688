//! Checks that a submission is a valid Eclipse project.

use roxmltree::{Document, Node};
use std::path::Path;

use super::{Check, CheckOutcome};
use crate::message::ResultMessage;

pub const CHECK_NAME: &str = "eclipse-configuration";

pub const BUILDER_JAVA: &str = "org.eclipse.jdt.core.javabuilder";
pub const NATURE_JAVA: &str = "org.eclipse.jdt.core.javanature";
pub const BUILDER_CHECKSTYLE: &str = "net.sf.eclipsecs.core.CheckstyleBuilder";
pub const NATURE_CHECKSTYLE: &str = "net.sf.eclipsecs.core.CheckstyleNature";

/// Why a project description could not be read.
#[derive(Debug)]
pub enum ProjectError {
    Missing,
    Invalid,
    Io(std::io::Error),
}

/// The parts of an Eclipse `.project` file the check needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EclipseProject {
    pub name: String,
    pub natures: Vec<String>,
    pub builders: Vec<String>,
}

fn child_elements<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

/// The one child element called `name`; none or several is invalid.
fn single_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    let mut matching = child_elements(node).filter(|n| n.has_tag_name(name));
    let first = matching.next()?;
    match matching.next() {
        Some(_) => None,
        None => Some(first),
    }
}

/// Trimmed text of an element that holds nothing but non-empty text.
fn text_content(node: Node) -> Option<String> {
    if child_elements(node).next().is_some() {
        return None;
    }
    let text: String = node
        .children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Text of every child of `list`, which must all be `item` elements.
fn text_list(list: Node, item: &str, text_of: impl Fn(Node) -> Option<String>) -> Option<Vec<String>> {
    child_elements(list)
        .map(|n| if n.has_tag_name(item) { text_of(n) } else { None })
        .collect()
}

impl EclipseProject {
    /// Parse the content of a `.project` file.
    ///
    /// Needs a `projectDescription` root with exactly one `name`,
    /// `buildSpec` and `natures`; each build command needs exactly one
    /// `name`. Anything else under the root is ignored.
    pub fn parse(content: &str) -> Option<Self> {
        let document = Document::parse(content).ok()?;
        let root = document.root_element();
        if !root.has_tag_name("projectDescription") {
            return None;
        }

        let name = text_content(single_child(root, "name")?)?;
        let builders = text_list(single_child(root, "buildSpec")?, "buildCommand", |command| {
            text_content(single_child(command, "name")?)
        })?;
        let natures = text_list(single_child(root, "natures")?, "nature", text_content)?;

        Some(Self {
            name,
            natures,
            builders,
        })
    }

    pub fn has_nature_or_builder(&self, nature: &str, builder: &str) -> bool {
        self.natures.iter().any(|n| n == nature) || self.builders.iter().any(|b| b == builder)
    }

    pub fn is_java_project(&self) -> bool {
        self.has_nature_or_builder(NATURE_JAVA, BUILDER_JAVA)
    }

    pub fn has_checkstyle(&self) -> bool {
        self.has_nature_or_builder(NATURE_CHECKSTYLE, BUILDER_CHECKSTYLE)
    }
}

/// A `.classpath` only needs to be well-formed with a `classpath` root.
fn is_valid_classpath(content: &str) -> bool {
    Document::parse(content)
        .map(|d| d.root_element().has_tag_name("classpath"))
        .unwrap_or(false)
}

fn read_config_file(path: &Path) -> Result<String, ProjectError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ProjectError::Missing,
        std::io::ErrorKind::InvalidData => ProjectError::Invalid,
        _ => ProjectError::Io(e),
    })
}

fn load_project(submission_dir: &Path) -> Result<EclipseProject, ProjectError> {
    let classpath = read_config_file(&submission_dir.join(".classpath"))?;
    if !is_valid_classpath(&classpath) {
        return Err(ProjectError::Invalid);
    }

    let project = read_config_file(&submission_dir.join(".project"))?;
    EclipseProject::parse(&project).ok_or(ProjectError::Invalid)
}

/// Requires `.project` and `.classpath`; optionally a Java nature and
/// Checkstyle.
#[derive(Debug, Clone, Default)]
pub struct EclipseConfigCheck {
    require_java: bool,
    require_checkstyle: bool,
}

impl EclipseConfigCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail unless the project has the Java builder or nature.
    pub fn require_java(mut self, require: bool) -> Self {
        self.require_java = require;
        self
    }

    /// Warn unless the project has the Checkstyle builder or nature.
    pub fn require_checkstyle(mut self, require: bool) -> Self {
        self.require_checkstyle = require;
        self
    }
}

impl Check for EclipseConfigCheck {
    fn name(&self) -> &'static str {
        CHECK_NAME
    }

    fn run(&self, submission_dir: &Path) -> CheckOutcome {
        let project = match load_project(submission_dir) {
            Ok(project) => project,
            Err(ProjectError::Missing) | Err(ProjectError::Invalid) => {
                return CheckOutcome::new(
                    false,
                    vec![ResultMessage::error(
                        CHECK_NAME,
                        "Does not contain a valid eclipse project",
                    )],
                );
            }
            Err(ProjectError::Io(e)) => {
                tracing::warn!(error = %e, "failed to read eclipse project files");
                return CheckOutcome::new(
                    false,
                    vec![ResultMessage::error(
                        CHECK_NAME,
                        "An internal error occurred while checking eclipse project",
                    )],
                );
            }
        };

        let mut success = true;
        let mut messages = Vec::new();

        if self.require_java && !project.is_java_project() {
            success = false;
            messages.push(
                ResultMessage::error(CHECK_NAME, "Submission is not a Java project")
                    .with_file(".project"),
            );
        }

        if self.require_checkstyle && !project.has_checkstyle() {
            messages.push(
                ResultMessage::warning(CHECK_NAME, "Submission does not have Checkstyle enabled")
                    .with_file(".project"),
            );
        }

        CheckOutcome::new(success, messages)
    }
}
