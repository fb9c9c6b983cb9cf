use crate::aggregate::{aggregate, AggregateTable, AuthorKey, AuthorOnly};
use crate::cli::CommonArgs;
use crate::git::{GitRepo, WalkOptions};
use crate::model::{AuthorRow, TopAuthorsOutput, SCHEMA_VERSION};
use crate::numstat::NumstatReader;
use crate::util::{days_ago, spinner, with_progress};
use anyhow::Context;
use chrono::Utc;
use console::style;

pub fn exec(common: &CommonArgs, json: bool, ndjson: bool) -> anyhow::Result<()> {
    let pb = spinner("Reading history", !(json || ndjson));

    // a log file is assumed to be windowed by whoever produced it
    let (table, repository_path, days) = match common.open_log()? {
        Some(reader) => {
            let table = aggregate(with_progress(NumstatReader::new(reader), &pb), AuthorOnly, "")
                .context("Failed to aggregate log input")?;
            let source = common.log.as_deref().map(|p| p.display().to_string()).unwrap_or_default();
            (table, source, None)
        }
        None => {
            let repo = GitRepo::open(common.require_repo()?).context("Failed to open git repository")?;
            let options = WalkOptions::new()
                .without_merges()
                .with_changes()
                .with_since(days_ago(common.days));
            let walk = repo.commits(options).context("Failed to start history walk")?;
            let table = aggregate(with_progress(walk, &pb), AuthorOnly, &repo.project_name())
                .context("Failed to collect commits from repository")?;
            (table, repo.path().to_string_lossy().to_string(), Some(common.days))
        }
    };
    pb.finish_and_clear();

    let entries = rank_authors(&table);
    if json {
        output_json(entries, repository_path, days)?;
    } else if ndjson {
        output_ndjson(&entries)?;
    } else {
        output_table(&entries, days);
    }
    Ok(())
}

/// Authors by lines added, most first.
pub fn rank_authors(table: &AggregateTable<AuthorKey>) -> Vec<AuthorRow> {
    table
        .ranked_by(|t| t.additions)
        .into_iter()
        .map(|(key, total)| AuthorRow {
            email: key.email.clone(),
            additions: total.additions,
            deletions: total.deletions,
            commits: total.commits,
        })
        .collect()
}

fn output_json(entries: Vec<AuthorRow>, repository_path: String, days: Option<u32>) -> anyhow::Result<()> {
    let output = TopAuthorsOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository_path,
        days,
        entries,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn output_ndjson(entries: &[AuthorRow]) -> anyhow::Result<()> {
    for e in entries {
        println!("{}", serde_json::to_string(e)?);
    }
    Ok(())
}

fn output_table(entries: &[AuthorRow], days: Option<u32>) {
    match days {
        Some(d) => println!("{}", style(format!("Most active authors over the last {d} days (by lines added)")).bold()),
        None => println!("{}", style("Most active authors (by lines added)").bold()),
    }
    println!(
        "{:<40} {:>8} {:>8} {:>8}",
        style("Author").bold(),
        style("Add").bold(),
        style("Del").bold(),
        style("Commits").bold()
    );
    println!("{}", "─".repeat(67));
    for e in entries {
        println!(
            "{:<40} {:>8} {:>8} {:>8}",
            e.email, e.additions, e.deletions, e.commits
        );
    }
    if entries.is_empty() {
        println!("No commits in range");
    }
}
