//! Tests for the svnlook-backed repository access.

#![cfg(unix)]

mod common;

use std::collections::BTreeSet;
use std::path::{Component, PathBuf};
use std::time::Duration;

use common::FakeSvnlook;
use submission_check::process::ProcessError;
use submission_check::{
    CliSvnInterface, Phase, Submission, SvnError, SvnInterface, TransactionInfo,
};

fn transaction(fake: &FakeSvnlook, phase: Phase, id: &str) -> TransactionInfo {
    TransactionInfo::new(fake.repository(), "student1", id, phase)
}

#[test]
fn test_resolve_transaction() {
    let fake = FakeSvnlook::new();
    fake.set("author", "student1\n");

    let info = fake
        .interface()
        .resolve_transaction(Phase::PreCommit, fake.repository(), "12-c")
        .unwrap();

    assert_eq!(
        info,
        TransactionInfo::new(fake.repository(), "student1", "12-c", Phase::PreCommit)
    );
    assert_eq!(fake.calls(), vec!["author --transaction 12-c"]);
}

#[test]
fn test_resolve_revision() {
    let fake = FakeSvnlook::new();
    fake.set("author", "tutor\n");

    let info = fake
        .interface()
        .resolve_transaction(Phase::PostCommit, fake.repository(), "7")
        .unwrap();

    assert_eq!(info.author, "tutor");
    assert_eq!(fake.calls(), vec!["author --revision 7"]);
}

#[test]
fn test_resolve_transaction_with_relative_repository() {
    let fake = FakeSvnlook::new();
    fake.set("author", "student1\n");

    // climb from the working directory to the root, then down to the repository
    let cwd = std::env::current_dir().unwrap();
    let mut relative: PathBuf = cwd
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .map(|_| Component::ParentDir)
        .collect();
    relative.push(fake.repository().strip_prefix("/").unwrap());
    assert!(relative.is_relative());

    let svn = fake.interface();
    let info = svn
        .resolve_transaction(Phase::PreCommit, &relative, "4-b")
        .unwrap();
    assert_eq!(info.author, "student1");
    assert!(info.repository.is_absolute());

    fake.set("changed", "A   Homework01/Group01/Main.java\n");
    let submissions = svn
        .modified_submissions(&TransactionInfo::new(&relative, "student1", "4-b", Phase::PreCommit))
        .unwrap();
    assert_eq!(submissions.len(), 1);
}

#[test]
fn test_author_must_be_single_line() {
    let fake = FakeSvnlook::new();
    let svn = fake.interface();

    fake.set("author", "student1\nstudent2\n");
    let err = svn
        .resolve_transaction(Phase::PreCommit, fake.repository(), "1")
        .unwrap_err();
    assert!(matches!(err, SvnError::UnexpectedLineCount { lines: 2, .. }));

    fake.set("author", "");
    let err = svn
        .resolve_transaction(Phase::PreCommit, fake.repository(), "1")
        .unwrap_err();
    assert!(matches!(err, SvnError::UnexpectedLineCount { lines: 0, .. }));
}

#[test]
fn test_failing_svnlook() {
    // no `author` file: cat fails
    let fake = FakeSvnlook::new();
    let err = fake
        .interface()
        .resolve_transaction(Phase::PreCommit, fake.repository(), "1")
        .unwrap_err();

    assert!(matches!(err, SvnError::ExitStatus { code: Some(1), .. }));
    assert!(!err.is_invocation_wide());
}

#[test]
fn test_missing_svnlook() {
    let fake = FakeSvnlook::new();
    let svn = CliSvnInterface::new()
        .unwrap()
        .program("/nonexistent/svnlook");

    let err = svn
        .resolve_transaction(Phase::PreCommit, fake.repository(), "1")
        .unwrap_err();
    assert!(matches!(err, SvnError::Process(ProcessError::Spawn { .. })));
    assert!(err.is_invocation_wide());
}

#[test]
fn test_svnlook_timeout() {
    let fake = FakeSvnlook::new();
    let script = fake.repository().join("slow.sh");
    std::fs::write(&script, "sleep 10\n").unwrap();
    let svn = CliSvnInterface::new()
        .unwrap()
        .program("sh")
        .prefix_args(vec![script.display().to_string()])
        .timeout(Some(Duration::from_millis(200)));

    let err = svn
        .resolve_transaction(Phase::PreCommit, fake.repository(), "1")
        .unwrap_err();
    assert!(matches!(err, SvnError::Process(ProcessError::Timeout { .. })));
}

#[test]
fn test_modified_submissions() {
    let fake = FakeSvnlook::new();
    fake.set(
        "changed",
        "A   Homework01/Group01/Main.java\n\
         U   Homework01/Group02/src/pkg/Util.java\n\
         _U  Homework01/Group01/\n\
         A   Homework02/Group03/\n\
         D   Homework02/\n\
         UU  Homework02/Group04/.project\n",
    );

    let submissions = fake
        .interface()
        .modified_submissions(&transaction(&fake, Phase::PostCommit, "3"))
        .unwrap();

    let expected: BTreeSet<Submission> = [
        Submission::new("Homework01", "Group01"),
        Submission::new("Homework01", "Group02"),
        Submission::new("Homework02", "Group04"),
    ]
    .into_iter()
    .collect();
    assert_eq!(submissions, expected);
    assert_eq!(fake.calls(), vec!["changed --revision 3"]);
}

#[test]
fn test_modified_submissions_rejects_invalid_lines() {
    let fake = FakeSvnlook::new();
    let svn = fake.interface();
    let info = transaction(&fake, Phase::PreCommit, "3-a");

    fake.set("changed", "A   Homework01/Group01/Main.java\nX   Homework01/Group02/A.java\n");
    assert!(matches!(
        svn.modified_submissions(&info).unwrap_err(),
        SvnError::InvalidChangeCode { .. }
    ));

    fake.set("changed", "A   Homework01/Group01/Main.java\n\n");
    assert!(matches!(
        svn.modified_submissions(&info).unwrap_err(),
        SvnError::EmptyChangeLine
    ));
}

#[test]
fn test_checkout_submission() {
    let fake = FakeSvnlook::new();
    fake.set(
        "tree",
        "Homework01/Group01/\n\
         Homework01/Group01/.project\n\
         Homework01/Group01/src/\n\
         Homework01/Group01/src/pkg/\n\
         Homework01/Group01/src/pkg/Main.java\n\
         Homework01/Group01/data.bin\n",
    );
    fake.add_file("Homework01/Group01/.project", b"<projectDescription/>\n")
        .add_file("Homework01/Group01/src/pkg/Main.java", b"class Main {}")
        .add_file("Homework01/Group01/data.bin", b"\x00\xff\r\n\xfe no newline");

    let target = tempfile::TempDir::new().unwrap();
    fake.interface()
        .checkout_submission(
            &transaction(&fake, Phase::PreCommit, "9-1"),
            &Submission::new("Homework01", "Group01"),
            target.path(),
        )
        .unwrap();

    let read = |p: &str| std::fs::read(target.path().join(p)).unwrap();
    assert_eq!(read(".project"), b"<projectDescription/>\n");
    assert_eq!(read("src/pkg/Main.java"), b"class Main {}");
    assert_eq!(read("data.bin"), b"\x00\xff\r\n\xfe no newline");

    let calls = fake.calls();
    assert_eq!(calls[0], "tree --transaction 9-1 --full-paths Homework01/Group01");
    assert_eq!(
        calls[1..],
        [
            "cat --transaction 9-1 Homework01/Group01/.project",
            "cat --transaction 9-1 Homework01/Group01/src/pkg/Main.java",
            "cat --transaction 9-1 Homework01/Group01/data.bin",
        ]
    );
}

#[test]
fn test_checkout_rejects_paths_outside_submission() {
    let fake = FakeSvnlook::new();
    fake.set("tree", "Homework01/Group01/\nHomework01/Group02/Main.java\n");

    let target = tempfile::TempDir::new().unwrap();
    let err = fake
        .interface()
        .checkout_submission(
            &transaction(&fake, Phase::PreCommit, "1"),
            &Submission::new("Homework01", "Group01"),
            target.path(),
        )
        .unwrap_err();
    assert!(matches!(err, SvnError::OutsideSubmission { .. }));
}

#[test]
fn test_checkout_of_missing_file_fails() {
    let fake = FakeSvnlook::new();
    fake.set("tree", "Homework01/Group01/\nHomework01/Group01/Gone.java\n");

    let target = tempfile::TempDir::new().unwrap();
    let err = fake
        .interface()
        .checkout_submission(
            &transaction(&fake, Phase::PreCommit, "1"),
            &Submission::new("Homework01", "Group01"),
            target.path(),
        )
        .unwrap_err();
    assert!(matches!(err, SvnError::ExitStatus { .. }));
}
