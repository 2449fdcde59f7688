//! A shell-script stand-in for `svnlook`, backed by plain files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use submission_check::CliSvnInterface;

/// Answers `svnlook` calls from files in a temporary directory:
///
/// - `author`, `changed`, `tree`: printed verbatim for the sub-command
/// - `repo/<path>`: file content printed by `cat <path>`
///
/// Every call is appended to `calls` as `<sub-command> <flag> <id> <args..>`.
/// A repository argument that is not a directory fails the call with 3.
pub struct FakeSvnlook {
    dir: TempDir,
}

impl FakeSvnlook {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().display().to_string();
        let script = format!(
            r#"sub="$1"; repo="$2"; flag="$3"; txn="$4"; shift 4
echo "$sub $flag $txn${{*:+ $*}}" >> '{root}/calls'
test -d "$repo" || exit 3
case "$sub" in
  author) cat '{root}/author' ;;
  changed) cat '{root}/changed' ;;
  tree) cat '{root}/tree' ;;
  cat) cat '{root}/repo/'"$1" ;;
  *) exit 1 ;;
esac
"#
        );
        std::fs::write(dir.path().join("svnlook.sh"), script).unwrap();
        std::fs::create_dir_all(dir.path().join("repo")).unwrap();
        Self { dir }
    }

    /// Directory passed as the repository path.
    pub fn repository(&self) -> &Path {
        self.dir.path()
    }

    pub fn script(&self) -> PathBuf {
        self.dir.path().join("svnlook.sh")
    }

    pub fn set(&self, name: &str, content: &str) -> &Self {
        std::fs::write(self.dir.path().join(name), content).unwrap();
        self
    }

    /// Add a file to the repository content served by `cat`.
    pub fn add_file(&self, path: &str, content: &[u8]) -> &Self {
        let target = self.dir.path().join("repo").join(path);
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(target, content).unwrap();
        self
    }

    pub fn interface(&self) -> CliSvnInterface {
        CliSvnInterface::new()
            .unwrap()
            .program("sh")
            .prefix_args(vec![self.script().display().to_string()])
    }

    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("calls"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
