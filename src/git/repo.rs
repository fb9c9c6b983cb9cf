use super::walk::{CommitWalk, WalkOptions};
use crate::error::{AnalystError, Result};
use crate::model::{CommitRecord, FileChange, LineDelta};
use crate::util::dir_label;
use chrono::{DateTime, FixedOffset};
use gix::object::tree::diff::ChangeDetached;
use gix::{discover, ObjectId, Repository};
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open the repository containing `path`, searching parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo_path = path.as_ref();
        let repo = discover(repo_path).map_err(|e| unavailable(repo_path, e))?;
        Ok(Self::from_repo(repo))
    }

    /// Open the repository rooted exactly at `path`.
    pub fn open_exact<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo_path = path.as_ref();
        let repo = gix::open(repo_path).map_err(|e| unavailable(repo_path, e))?;
        Ok(Self::from_repo(repo))
    }

    fn from_repo(repo: Repository) -> Self {
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        Self { repo, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory name of the work tree, used as the project label.
    pub fn project_name(&self) -> String {
        dir_label(&self.path)
    }

    /// Reverse-chronological commit stream starting at HEAD, or at every
    /// reference when `options.all_refs` is set.
    pub fn commits(&self, options: WalkOptions) -> Result<CommitWalk<'_>> {
        let tips = if options.all_refs {
            self.ref_tips()?
        } else {
            self.head_tip()?.into_iter().collect()
        };
        CommitWalk::new(self, tips, options)
    }

    fn head_tip(&self) -> Result<Option<ObjectId>> {
        let mut head = self.repo.head()?;
        if head.is_unborn() {
            return Ok(None);
        }
        let commit = head.peel_to_commit_in_place()?;
        Ok(Some(commit.id))
    }

    fn ref_tips(&self) -> Result<Vec<ObjectId>> {
        let platform = self
            .repo
            .references()
            .map_err(|e| AnalystError::GitRepo(format!("Cannot list references: {e}")))?;
        let refs = platform
            .all()
            .map_err(|e| AnalystError::GitRepo(format!("Cannot list references: {e}")))?;

        let mut tips = Vec::new();
        for reference in refs {
            let mut reference =
                reference.map_err(|e| AnalystError::GitRepo(format!("Cannot read reference: {e}")))?;
            let Ok(id) = reference.peel_to_id_in_place() else {
                continue;
            };
            let id = id.detach();
            // tags may point at trees or blobs
            if self.repo.find_commit(id).is_ok() {
                tips.push(id);
            }
        }
        tips.extend(self.head_tip()?);
        Ok(tips)
    }

    pub(crate) fn commit_time(&self, id: ObjectId) -> Result<i64> {
        Ok(self.repo.find_commit(id)?.time()?.seconds)
    }

    pub(crate) fn parent_ids(&self, id: ObjectId) -> Result<Vec<ObjectId>> {
        let commit = self.repo.find_commit(id)?;
        let parents = commit.parent_ids().map(|pid| pid.detach()).collect();
        Ok(parents)
    }

    /// Build the record for `id`, diffing against its first parent when
    /// `with_changes` is set.
    pub(crate) fn record(&self, id: ObjectId, parents: &[ObjectId], with_changes: bool) -> Result<CommitRecord> {
        let commit = self.repo.find_commit(id)?;
        let author = commit.author()?;
        let time = author
            .time()
            .map_err(|e| AnalystError::Parse(format!("Invalid author time in {id}: {e}")))?;
        let message = commit.message_raw()?;

        let mut record = CommitRecord::new(
            id.to_string(),
            author.name.to_string(),
            author.email.to_string(),
            to_datetime(time.seconds, time.offset)?,
        )
        .with_message(message.to_string());

        if with_changes {
            record.file_changes = match parents.first() {
                Some(parent_id) => self.file_changes(Some(*parent_id), id)?,
                None => self.file_changes(None, id)?,
            };
        }
        Ok(record)
    }

    fn file_changes(&self, parent_id: Option<ObjectId>, commit_id: ObjectId) -> Result<Vec<FileChange>> {
        let commit_tree = self.repo.find_commit(commit_id)?.tree()?;
        let parent_tree = match parent_id {
            Some(pid) => Some(self.repo.find_commit(pid)?.tree()?),
            None => None,
        };

        let changes: Vec<ChangeDetached> =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), None)?;

        let mut files = Vec::new();
        for change in changes.into_iter().filter(|c| !is_tree_change(c)) {
            self.handle_change(change, &mut files)?;
        }
        Ok(files)
    }

    /// Paths touched between two commits with the number of change entries
    /// for each. `older` and `newer` are full hex ids.
    pub fn diff_stats(&self, older: &str, newer: &str) -> Result<BTreeMap<String, u32>> {
        let older_tree = self.repo.find_commit(parse_id(older)?)?.tree()?;
        let newer_tree = self.repo.find_commit(parse_id(newer)?)?.tree()?;
        let changes: Vec<ChangeDetached> =
            self.repo
                .diff_tree_to_tree(Some(&older_tree), Some(&newer_tree), None)?;

        let mut stats = BTreeMap::new();
        for change in changes.into_iter().filter(|c| !is_tree_change(c)) {
            let path = match change {
                ChangeDetached::Addition { location, .. }
                | ChangeDetached::Deletion { location, .. }
                | ChangeDetached::Modification { location, .. }
                | ChangeDetached::Rewrite { location, .. } => location.to_string(),
            };
            *stats.entry(path).or_insert(0) += 1;
        }
        Ok(stats)
    }

    fn handle_change(&self, change: ChangeDetached, files: &mut Vec<FileChange>) -> Result<()> {
        let file = match change {
            ChangeDetached::Addition { id, location, .. } => {
                let obj = self.repo.find_object(id)?;
                FileChange {
                    path: location.to_string(),
                    delta: text_of(&obj).map(|text| LineDelta {
                        added: text.lines().count() as u64,
                        deleted: 0,
                    }),
                }
            }
            ChangeDetached::Deletion { id, location, .. } => {
                let obj = self.repo.find_object(id)?;
                FileChange {
                    path: location.to_string(),
                    delta: text_of(&obj).map(|text| LineDelta {
                        added: 0,
                        deleted: text.lines().count() as u64,
                    }),
                }
            }
            ChangeDetached::Modification {
                previous_id,
                id,
                location,
                ..
            } => {
                let old_obj = self.repo.find_object(previous_id)?;
                let new_obj = self.repo.find_object(id)?;
                FileChange {
                    path: location.to_string(),
                    delta: line_delta(&old_obj, &new_obj),
                }
            }
            ChangeDetached::Rewrite {
                source_id,
                id,
                location,
                copy,
                ..
            } => {
                let new_obj = self.repo.find_object(id)?;
                // a copy leaves the source in place, so the whole new file counts as added
                let delta = if copy {
                    text_of(&new_obj).map(|text| LineDelta {
                        added: text.lines().count() as u64,
                        deleted: 0,
                    })
                } else {
                    let old_obj = self.repo.find_object(source_id)?;
                    line_delta(&old_obj, &new_obj)
                };
                FileChange {
                    path: location.to_string(),
                    delta,
                }
            }
        };
        files.push(file);
        Ok(())
    }
}

fn unavailable(path: &Path, err: impl std::fmt::Display) -> AnalystError {
    AnalystError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn parse_id(hex: &str) -> Result<ObjectId> {
    ObjectId::from_hex(hex.as_bytes()).map_err(|e| AnalystError::Parse(format!("Invalid commit ID '{hex}': {e}")))
}

fn to_datetime(seconds: i64, offset: i32) -> Result<DateTime<FixedOffset>> {
    let utc = DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| AnalystError::Parse(format!("Invalid timestamp: {seconds}")))?;
    let zone = FixedOffset::east_opt(offset).unwrap_or_else(|| utc.fixed_offset().timezone());
    Ok(utc.with_timezone(&zone))
}

fn is_tree_change(change: &ChangeDetached) -> bool {
    match change {
        ChangeDetached::Addition { entry_mode, .. }
        | ChangeDetached::Deletion { entry_mode, .. }
        | ChangeDetached::Modification { entry_mode, .. }
        | ChangeDetached::Rewrite { entry_mode, .. } => entry_mode.is_tree(),
    }
}

fn is_binary(data: &[u8]) -> bool {
    data.iter().take(8192).any(|&b| b == 0)
}

/// Blob contents as text, or `None` for binary or non UTF-8 data.
fn text_of<'a>(object: &'a gix::Object<'_>) -> Option<&'a str> {
    let data = object.data.as_slice();
    if is_binary(data) {
        return None;
    }
    std::str::from_utf8(data).ok()
}

fn line_delta(old_object: &gix::Object<'_>, new_object: &gix::Object<'_>) -> Option<LineDelta> {
    let old_text = text_of(old_object)?;
    let new_text = text_of(new_object)?;

    let diff = TextDiff::from_lines(old_text, new_text);
    let mut delta = LineDelta { added: 0, deleted: 0 };
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => delta.added += 1,
            ChangeTag::Delete => delta.deleted += 1,
            ChangeTag::Equal => {}
        }
    }
    Some(delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_detection_looks_for_nul_bytes() {
        assert!(is_binary(b"PNG\0\x01"));
        assert!(!is_binary(b"fn main() {}\n"));
    }

    #[test]
    fn offsets_are_preserved() {
        let dt = to_datetime(1_714_579_200, 8 * 3600).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 8 * 3600);
        assert_eq!(dt.timestamp(), 1_714_579_200);
    }

    #[test]
    fn bad_hex_is_a_parse_error() {
        assert!(matches!(parse_id("nothex"), Err(AnalystError::Parse(_))));
    }

    #[test]
    fn opening_a_plain_directory_fails_as_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = GitRepo::open_exact(dir.path()).err().unwrap();
        assert!(matches!(err, AnalystError::SourceUnavailable { .. }));
    }
}
