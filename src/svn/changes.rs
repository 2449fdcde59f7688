//! Parsing of `svnlook changed` output.
//!
//! Each line starts with a two-column change code followed by a path
//! relative to the repository root, e.g. `U   Homework01/Group03/Main.java`.
//! Submissions live at `<exercise>/<group>`, so only paths at least two
//! directories deep belong to a submission.

use std::collections::BTreeSet;

use super::SvnError;
use crate::submission::Submission;

/// Kind of change reported in the first two columns of a change line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Deleted,
    Updated,
    PropertiesUpdated,
    ContentAndPropertiesUpdated,
}

impl ChangeKind {
    /// Parse the two change columns. A tab counts as a blank column.
    pub fn parse(first: char, second: char) -> Option<Self> {
        let blank = second == ' ' || second == '\t';
        match (first, second) {
            ('A', _) if blank => Some(ChangeKind::Added),
            ('D', _) if blank => Some(ChangeKind::Deleted),
            ('U', _) if blank => Some(ChangeKind::Updated),
            ('_', 'U') => Some(ChangeKind::PropertiesUpdated),
            ('U', 'U') => Some(ChangeKind::ContentAndPropertiesUpdated),
            _ => None,
        }
    }
}

/// Parse one change line and return the submission it touches, if any.
///
/// Changes at the repository root or to an exercise folder's direct
/// children (the submission folders themselves) yield `None`: a rename or
/// delete of a whole submission folder carries no content to check.
pub fn parse_change_line(line: &str) -> Result<Option<Submission>, SvnError> {
    if line.chars().count() < 3 {
        return Err(SvnError::EmptyChangeLine);
    }

    let mut chars = line.chars();
    let (first, second) = match (chars.next(), chars.next()) {
        (Some(first), Some(second)) => (first, second),
        _ => return Err(SvnError::EmptyChangeLine),
    };

    if ChangeKind::parse(first, second).is_none() {
        return Err(SvnError::InvalidChangeCode {
            code: format!("{}{}", first, second),
            line: line.to_string(),
        });
    }

    Ok(submission_for_path(chars.as_str().trim()))
}

/// Map a repository path to the submission folder two levels below the root.
fn submission_for_path(path: &str) -> Option<Submission> {
    let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();

    // depth = number of ancestors; only depth >= 2 is submission content
    if components.len() < 3 {
        return None;
    }

    Some(Submission::new(components[0], components[1]))
}

/// Parse the full output of `svnlook changed`. Any malformed line fails the
/// whole call.
pub(crate) fn parse_changed_output<S: AsRef<str>>(
    lines: &[S],
) -> Result<BTreeSet<Submission>, SvnError> {
    let mut submissions = BTreeSet::new();
    for line in lines {
        if let Some(submission) = parse_change_line(line.as_ref())? {
            submissions.insert(submission);
        }
    }
    Ok(submissions)
}
