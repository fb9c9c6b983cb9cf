//! Rolls up many repositories into one cumulative CSV.
//!
//! Every immediate subdirectory of the root that carries repository metadata
//! is analysed on its own and its rows are appended to the export. A
//! repository that cannot be read is reported and skipped. Running the
//! pipeline again appends a second copy of every row; nothing is
//! deduplicated against earlier runs.

use crate::aggregate::{aggregate, AggregateTable, AuthorByFileType, FileTypeKey};
use crate::error::{AnalystError, Result};
use crate::export::{write_table, ExportMode};
use crate::git::{is_repository, GitRepo, WalkOptions};
use crate::util::dir_label;
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};

/// Produces the author/file-type table for one repository.
pub trait RepoAnalyzer: Sync {
    fn analyze(&self, repo: &Path, project: &str) -> Result<AggregateTable<FileTypeKey>>;
}

/// Walks HEAD of each repository with merges excluded.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHistory;

impl RepoAnalyzer for GitHistory {
    fn analyze(&self, repo: &Path, project: &str) -> Result<AggregateTable<FileTypeKey>> {
        let git = GitRepo::open_exact(repo)?;
        let walk = git.commits(WalkOptions::new().without_merges().with_changes())?;
        aggregate(walk, AuthorByFileType, project)
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Repositories analysed concurrently. Appends stay sequential.
    pub jobs: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { jobs: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoStatus {
    Exported { rows: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoOutcome {
    pub path: PathBuf,
    pub project: String,
    pub status: RepoStatus,
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub export_path: PathBuf,
    pub outcomes: Vec<RepoOutcome>,
}

impl BatchReport {
    pub fn exported(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, RepoStatus::Exported { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.exported()
    }

    pub fn rows(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                RepoStatus::Exported { rows } => rows,
                RepoStatus::Failed { .. } => 0,
            })
            .sum()
    }
}

/// Immediate subdirectories of `root` that are repositories, by name.
pub fn discover_repositories(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(root).map_err(|e| {
        AnalystError::Configuration(format!("cannot read directory {}: {e}", root.display()))
    })?;

    let mut candidates = repository_dirs(entries.map(|entry| {
        entry.map(|entry| {
            let is_dir = entry.file_type().map(|kind| kind.is_dir());
            (entry.path(), is_dir)
        })
    }));
    candidates.sort();
    Ok(candidates)
}

/// Directory entries that hold repository metadata. An entry that cannot be
/// read is logged and left out.
fn repository_dirs<I>(entries: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = io::Result<(PathBuf, io::Result<bool>)>>,
{
    let mut dirs = Vec::new();
    for entry in entries {
        match entry {
            Ok((path, Ok(true))) if is_repository(&path) => dirs.push(path),
            Ok((_, Ok(_))) => {}
            Ok((path, Err(e))) => tracing::warn!("skipping {}: {e}", path.display()),
            Err(e) => tracing::warn!("skipping unreadable directory entry: {e}"),
        }
    }
    dirs
}

pub fn run<A: RepoAnalyzer>(
    root: &Path,
    export_path: &Path,
    analyzer: &A,
    options: &BatchOptions,
) -> Result<BatchReport> {
    let candidates = discover_repositories(root)?;
    tracing::info!(root = %root.display(), repositories = candidates.len(), "starting batch");

    let mut outcomes = Vec::with_capacity(candidates.len());
    if options.jobs <= 1 {
        for path in candidates {
            let project = dir_label(&path);
            tracing::info!("analyzing {}", path.display());
            let analysis = analyzer.analyze(&path, &project);
            outcomes.push(merge(path, project, analysis, export_path));
        }
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()
            .map_err(|e| AnalystError::Configuration(format!("cannot start {} workers: {e}", options.jobs)))?;

        let analyses: Vec<_> = pool.install(|| {
            candidates
                .into_par_iter()
                .map(|path| {
                    let project = dir_label(&path);
                    tracing::info!("analyzing {}", path.display());
                    let analysis = analyzer.analyze(&path, &project);
                    (path, project, analysis)
                })
                .collect()
        });

        for (path, project, analysis) in analyses {
            outcomes.push(merge(path, project, analysis, export_path));
        }
    }

    Ok(BatchReport {
        export_path: export_path.to_path_buf(),
        outcomes,
    })
}

fn merge(
    path: PathBuf,
    project: String,
    analysis: Result<AggregateTable<FileTypeKey>>,
    export_path: &Path,
) -> RepoOutcome {
    let status = match analysis.and_then(|table| write_table(export_path, &table, ExportMode::Append)) {
        Ok(summary) => {
            tracing::debug!(project = %project, rows = summary.rows, "appended");
            RepoStatus::Exported { rows: summary.rows }
        }
        Err(e) => {
            tracing::warn!("analysis failed for {}: {e}", path.display());
            RepoStatus::Failed { reason: e.to_string() }
        }
    };
    RepoOutcome { path, project, status }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommitRecord, FileChange};
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    /// Serves a fixed history per project and fails for projects named
    /// `broken*`.
    struct FakeHistory;

    impl RepoAnalyzer for FakeHistory {
        fn analyze(&self, _repo: &Path, project: &str) -> Result<AggregateTable<FileTypeKey>> {
            if project.starts_with("broken") {
                return Err(AnalystError::SourceUnavailable {
                    path: PathBuf::from(project),
                    reason: "not a git repository".into(),
                });
            }
            let ts = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
            let stream = vec![
                Ok(CommitRecord::new("c2", "a", "a@x.com", ts).with_change(FileChange::lines("x.rs", 2, 1))),
                Ok(CommitRecord::new("c1", "a", "a@x.com", ts)
                    .with_change(FileChange::lines("y.rs", 1, 0))
                    .with_change(FileChange::lines("README", 4, 0))),
            ];
            aggregate(stream, AuthorByFileType, project)
        }
    }

    fn workspace(names: &[&str]) -> TempDir {
        let dir = tempdir().unwrap();
        for name in names {
            fs::create_dir_all(dir.path().join(name).join(".git")).unwrap();
        }
        fs::create_dir_all(dir.path().join("plain-dir")).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a repo").unwrap();
        dir
    }

    fn data_rows(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .skip(1)
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn discovers_only_repository_subdirectories() {
        let ws = workspace(&["b-repo", "a-repo"]);
        let found: Vec<_> = discover_repositories(ws.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(found, vec!["a-repo", "b-repo"]);
    }

    #[test]
    fn unreadable_entries_are_skipped() {
        let ws = workspace(&["alpha", "gamma"]);
        let denied = || io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let entries = vec![
            Ok((ws.path().join("alpha"), Ok(true))),
            Err(denied()),
            Ok((ws.path().join("gamma"), Err(denied()))),
            Ok((ws.path().join("plain-dir"), Ok(true))),
        ];
        assert_eq!(repository_dirs(entries), vec![ws.path().join("alpha")]);
    }

    #[test]
    fn one_unreadable_repository_does_not_stop_the_batch() {
        let ws = workspace(&["alpha", "broken-beta", "gamma"]);
        let out = tempdir().unwrap();
        let export = out.path().join("all.csv");

        let report = run(ws.path(), &export, &FakeHistory, &BatchOptions::default()).unwrap();
        assert_eq!(report.exported(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(report.outcomes[1].status, RepoStatus::Failed { .. }));

        let projects: Vec<_> = data_rows(&export)
            .iter()
            .map(|row| row.split(',').next().unwrap().to_string())
            .collect();
        assert_eq!(projects, vec!["alpha", "alpha", "gamma", "gamma"]);
    }

    #[test]
    fn rerunning_appends_duplicate_rows() {
        let ws = workspace(&["alpha", "gamma"]);
        let out = tempdir().unwrap();
        let export = out.path().join("all.csv");

        run(ws.path(), &export, &FakeHistory, &BatchOptions::default()).unwrap();
        let once = data_rows(&export);
        run(ws.path(), &export, &FakeHistory, &BatchOptions::default()).unwrap();
        let twice = data_rows(&export);

        assert_eq!(twice.len(), once.len() * 2);
        assert_eq!(&twice[..once.len()], &once[..]);
        assert_eq!(&twice[once.len()..], &once[..]);
        let text = fs::read_to_string(&export).unwrap();
        assert_eq!(text.matches("Project,Name").count(), 1);
    }

    #[test]
    fn parallel_run_writes_the_same_file() {
        let ws = workspace(&["alpha", "broken-beta", "gamma", "delta"]);
        let out = tempdir().unwrap();
        let sequential = out.path().join("seq.csv");
        let parallel = out.path().join("par.csv");

        run(ws.path(), &sequential, &FakeHistory, &BatchOptions { jobs: 1 }).unwrap();
        let report = run(ws.path(), &parallel, &FakeHistory, &BatchOptions { jobs: 3 }).unwrap();

        assert_eq!(report.rows(), 6);
        assert_eq!(
            fs::read_to_string(&sequential).unwrap(),
            fs::read_to_string(&parallel).unwrap()
        );
    }

    #[test]
    fn unreadable_root_is_a_configuration_error() {
        let err = run(
            Path::new("/definitely/not/here"),
            Path::new("/tmp/unused.csv"),
            &FakeHistory,
            &BatchOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalystError::Configuration(_)));
    }
}
