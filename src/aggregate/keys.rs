use crate::model::{CommitRecord, FileChange};
use serde::Serialize;

/// Extension reported for paths whose file name has no dot.
pub const NO_EXTENSION: &str = "(no ext)";

/// Maps one file change of one commit to the bucket it is totalled in.
///
/// Implementations must be pure: two changes with the same derived fields
/// always produce equal keys.
pub trait KeyPolicy {
    type Key: Ord + Clone;

    fn extract(&self, record: &CommitRecord, change: &FileChange, project: &str) -> Self::Key;
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AuthorKey {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FileTypeKey {
    pub project: String,
    pub name: String,
    pub email: String,
    pub extension: String,
}

/// Groups by author email alone.
///
/// Different author names committing under one email land in the same
/// bucket. Top-author reports rely on that, so it is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorOnly;

impl KeyPolicy for AuthorOnly {
    type Key = AuthorKey;

    fn extract(&self, record: &CommitRecord, _change: &FileChange, _project: &str) -> AuthorKey {
        AuthorKey {
            email: record.author_email.clone(),
        }
    }
}

/// Groups by project, author name, author email and file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorByFileType;

impl KeyPolicy for AuthorByFileType {
    type Key = FileTypeKey;

    fn extract(&self, record: &CommitRecord, change: &FileChange, project: &str) -> FileTypeKey {
        FileTypeKey {
            project: project.to_string(),
            name: record.author_name.clone(),
            email: record.author_email.clone(),
            extension: file_extension(&change.path),
        }
    }
}

/// Lower-cased suffix of the file name starting at its last dot, or
/// [`NO_EXTENSION`]. Dots in directory names are ignored.
pub fn file_extension(path: &str) -> String {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) => name[idx..].to_lowercase(),
        None => NO_EXTENSION.to_string(),
    }
}
