use crate::aggregate::{aggregate, AuthorByFileType};
use crate::batch::{self, BatchOptions, GitHistory, RepoStatus};
use crate::cli::CommonArgs;
use crate::export::{write_table, ExportMode};
use crate::git::{GitRepo, WalkOptions};
use crate::numstat::NumstatReader;
use crate::util::{dir_label, spinner, with_progress};
use anyhow::Context;
use console::style;

/// Author/file-type rollup of one repository, written to a fresh CSV.
pub fn exec(common: &CommonArgs) -> anyhow::Result<()> {
    let csv = common.require_csv()?;
    let pb = spinner("Counting lines", true);

    let (table, project) = match common.open_log()? {
        Some(reader) => {
            let project = common.log_project();
            let table = aggregate(with_progress(NumstatReader::new(reader), &pb), AuthorByFileType, &project)
                .context("Failed to aggregate log input")?;
            (table, project)
        }
        None => {
            let dir = common.require_dir()?;
            let repo = GitRepo::open(dir).context("Failed to open git repository")?;
            let project = dir_label(dir);
            let walk = repo
                .commits(WalkOptions::new().without_merges().with_changes())
                .context("Failed to start history walk")?;
            let table = aggregate(with_progress(walk, &pb), AuthorByFileType, &project)
                .context("Failed to collect commits from repository")?;
            (table, project)
        }
    };
    pb.finish_and_clear();

    let summary = write_table(csv, &table, ExportMode::Truncate)
        .with_context(|| format!("Failed to write {}", csv.display()))?;
    println!(
        "{} {} rows for {} written to {}",
        style("✓").green(),
        summary.rows,
        style(&project).bold(),
        csv.display()
    );
    Ok(())
}

/// Rollup of every repository under `--repo`, appended to one CSV.
pub fn exec_multi(common: &CommonArgs, jobs: usize) -> anyhow::Result<()> {
    let csv = common.require_csv()?;
    let root = common.require_dir()?;

    let options = BatchOptions { jobs: jobs.max(1) };
    let report = batch::run(root, csv, &GitHistory, &options)
        .with_context(|| format!("Failed to scan {}", root.display()))?;

    for outcome in &report.outcomes {
        match &outcome.status {
            RepoStatus::Exported { rows } => {
                println!("{} {} ({rows} rows)", style("✓").green(), outcome.project)
            }
            RepoStatus::Failed { reason } => {
                println!("{} {}: {reason}", style("✗").red(), outcome.project)
            }
        }
    }
    tracing::info!(
        exported = report.exported(),
        failed = report.failed(),
        rows = report.rows(),
        "batch finished"
    );
    println!("Summary saved to: {}", report.export_path.display());
    Ok(())
}
