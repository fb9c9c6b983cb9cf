use chrono::{DateTime, Utc};
use git_analyst::config::PeopleConfig;
use git_analyst::error::AnalystError;
use git_analyst::git::{GitRepo, WalkOptions};
use git_analyst::model::{FileChange, LineDelta};
use git_analyst::people::tally;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

const BASE: i64 = 1_700_000_000;
const DAY: i64 = 86_400;

fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    assert!(Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

fn git_at(dir: &Path, args: &[&str], at: i64) {
    let date = format!("{at} +0000");
    assert!(Command::new("git")
        .args(args)
        .env("GIT_AUTHOR_DATE", &date)
        .env("GIT_COMMITTER_DATE", &date)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

fn git_dated(dir: &Path, args: &[&str], authored: &str, committed: &str) {
    assert!(Command::new("git")
        .args(args)
        .env("GIT_AUTHOR_DATE", authored)
        .env("GIT_COMMITTER_DATE", committed)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

fn init_git_repo(dir: &Path) {
    git(dir, &["init"]);
    git(dir, &["config", "core.autocrlf", "false"]);
    git(dir, &["config", "user.email", "you@example.com"]);
    git(dir, &["config", "user.name", "Your Name"]);
}

fn commit_at(dir: &Path, name: &str, content: &str, message: &str, at: i64) {
    fs::write(dir.join(name), content).unwrap();
    git(dir, &["add", "."]);
    git_at(dir, &["commit", "-m", message], at);
}

fn messages(repo: &GitRepo, options: WalkOptions) -> Vec<String> {
    repo.commits(options)
        .unwrap()
        .map(|r| r.unwrap().message.trim().to_string())
        .collect()
}

fn linear_history(dir: &Path) {
    init_git_repo(dir);
    for k in 0..4 {
        commit_at(dir, "log.txt", &"x\n".repeat(k + 1), &format!("c{k}"), BASE + k as i64 * DAY);
    }
}

#[test]
fn walks_newest_first() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    linear_history(dir.path());
    let repo = GitRepo::open(dir.path()).unwrap();
    assert_eq!(messages(&repo, WalkOptions::new()), vec!["c3", "c2", "c1", "c0"]);
}

#[test]
fn since_stops_at_older_commits() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    linear_history(dir.path());
    let repo = GitRepo::open(dir.path()).unwrap();
    let cutoff: DateTime<Utc> = DateTime::from_timestamp(BASE + DAY + DAY / 2, 0).unwrap();
    assert_eq!(messages(&repo, WalkOptions::new().with_since(cutoff)), vec!["c3", "c2"]);
}

#[test]
fn merges_can_be_left_out() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_at(dir.path(), "base.txt", "a\n", "base", BASE);
    git(dir.path(), &["checkout", "-b", "feat"]);
    commit_at(dir.path(), "feat.txt", "f\n", "feature", BASE + DAY);
    git(dir.path(), &["checkout", "-"]);
    commit_at(dir.path(), "base.txt", "a\nb\n", "mainline", BASE + 2 * DAY);
    git_at(dir.path(), &["merge", "--no-ff", "feat", "-m", "merge feat"], BASE + 3 * DAY);

    let repo = GitRepo::open(dir.path()).unwrap();
    assert_eq!(
        messages(&repo, WalkOptions::new()),
        vec!["merge feat", "mainline", "feature", "base"]
    );
    assert_eq!(
        messages(&repo, WalkOptions::new().without_merges()),
        vec!["mainline", "feature", "base"]
    );
}

#[test]
fn all_refs_reach_unmerged_branches() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_at(dir.path(), "a.txt", "a\n", "base", BASE);
    git(dir.path(), &["checkout", "-b", "side"]);
    commit_at(dir.path(), "s.txt", "s\n", "side work", BASE + DAY);
    git(dir.path(), &["checkout", "-"]);

    let repo = GitRepo::open(dir.path()).unwrap();
    assert_eq!(messages(&repo, WalkOptions::new()), vec!["base"]);
    assert_eq!(
        messages(&repo, WalkOptions::new().from_all_refs()),
        vec!["side work", "base"]
    );
}

#[test]
fn changes_carry_line_counts() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_at(dir.path(), "notes.md", "one\ntwo\n", "first", BASE);
    commit_at(dir.path(), "notes.md", "one\nthree\nfour\n", "second", BASE + DAY);
    fs::write(dir.path().join("blob.bin"), [0u8, 159, 146, 150]).unwrap();
    git(dir.path(), &["add", "."]);
    git_at(dir.path(), &["commit", "-m", "binary"], BASE + 2 * DAY);

    let repo = GitRepo::open(dir.path()).unwrap();
    let records: Vec<_> = repo
        .commits(WalkOptions::new().with_changes())
        .unwrap()
        .map(Result::unwrap)
        .collect();

    assert_eq!(records[0].file_changes, vec![FileChange::unresolved("blob.bin")]);
    assert_eq!(
        records[1].file_changes,
        vec![FileChange {
            path: "notes.md".into(),
            delta: Some(LineDelta { added: 2, deleted: 1 }),
        }]
    );
    assert_eq!(records[2].file_changes, vec![FileChange::lines("notes.md", 2, 0)]);
    assert_eq!(records[2].author_email, "you@example.com");
    assert_eq!(records[2].author_timestamp.timestamp(), BASE);
}

#[test]
fn interrupt_ends_the_walk_with_an_error() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    linear_history(dir.path());
    let repo = GitRepo::open(dir.path()).unwrap();
    let flag = Arc::new(AtomicBool::new(true));

    let mut walk = repo.commits(WalkOptions::new().with_interrupt(flag)).unwrap();
    assert!(matches!(walk.next(), Some(Err(AnalystError::Interrupted))));
    assert!(walk.next().is_none());
}

#[test]
fn empty_repository_yields_nothing() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    let repo = GitRepo::open(dir.path()).unwrap();
    assert_eq!(repo.commits(WalkOptions::new()).unwrap().count(), 0);
}

#[test]
fn records_carry_the_author_time_not_the_commit_time() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    fs::write(dir.path().join("late.txt"), "zzz\n").unwrap();
    git(dir.path(), &["add", "."]);
    // written late at night, rebased the next day at noon
    git_dated(
        dir.path(),
        &["commit", "-m", "late fix"],
        "2024-03-01T23:30:00+08:00",
        "2024-03-02T12:00:00+08:00",
    );

    let repo = GitRepo::open(dir.path()).unwrap();
    let records: Vec<_> = repo.commits(WalkOptions::new()).unwrap().map(Result::unwrap).collect();
    assert_eq!(
        records[0].author_timestamp,
        DateTime::parse_from_rfc3339("2024-03-01T23:30:00+08:00").unwrap()
    );

    let people = tally(repo.commits(WalkOptions::new()).unwrap(), &PeopleConfig::default()).unwrap();
    assert_eq!(people[0].night_commits, 1);
}

#[test]
fn missing_blob_is_a_read_error() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_at(dir.path(), "kept.txt", "a\n", "first", BASE);

    let out = Command::new("git")
        .args(["rev-parse", "HEAD:kept.txt"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    let blob = String::from_utf8(out.stdout).unwrap().trim().to_string();
    fs::remove_file(dir.path().join(".git/objects").join(&blob[..2]).join(&blob[2..])).unwrap();

    let repo = GitRepo::open(dir.path()).unwrap();
    let mut walk = repo.commits(WalkOptions::new().with_changes()).unwrap();
    assert!(matches!(walk.next(), Some(Err(_))));
    assert!(walk.next().is_none());

    // without diffs the blob is never read
    assert_eq!(repo.commits(WalkOptions::new()).unwrap().count(), 1);
}
