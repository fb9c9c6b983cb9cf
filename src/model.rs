use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// One commit as delivered by a history source, with its per-file line deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub author_timestamp: DateTime<FixedOffset>,
    pub message: String,
    pub file_changes: Vec<FileChange>,
}

impl CommitRecord {
    pub fn new(
        hash: impl Into<String>,
        author_name: impl Into<String>,
        author_email: impl Into<String>,
        author_timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            hash: hash.into(),
            author_name: author_name.into(),
            author_email: author_email.into(),
            author_timestamp,
            message: String::new(),
            file_changes: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_change(mut self, change: FileChange) -> Self {
        self.file_changes.push(change);
        self
    }

    pub fn short_hash(&self) -> &str {
        self.hash.get(..8).unwrap_or(&self.hash)
    }
}

/// Lines added and deleted in one file by one commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDelta {
    pub added: u64,
    pub deleted: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    /// `None` when the counts could not be resolved, e.g. for binary files.
    pub delta: Option<LineDelta>,
}

impl FileChange {
    pub fn lines(path: impl Into<String>, added: u64, deleted: u64) -> Self {
        Self {
            path: path.into(),
            delta: Some(LineDelta { added, deleted }),
        }
    }

    pub fn unresolved(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delta: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorRow {
    pub email: String,
    pub additions: u64,
    pub deletions: u64,
    pub commits: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopAuthorsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub days: Option<u32>,
    pub entries: Vec<AuthorRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonActivity {
    pub name: String,
    pub commits: u64,
    pub night_commits: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeopleOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub entries: Vec<PersonActivity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotFile {
    pub path: String,
    pub changes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub transitions: u64,
    pub entries: Vec<HotFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub compliant: u64,
    pub non_compliant: u64,
    pub compliance_rate: Option<f64>,
    pub by_label: Vec<LabelCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspect {
    pub hash: String,
    pub short_hash: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecureOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub scanned: u64,
    pub suspects: Vec<Suspect>,
}
