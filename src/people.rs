use crate::cli::CommonArgs;
use crate::config::{AnalystConfig, PeopleConfig};
use crate::error::Result;
use crate::git::{GitRepo, WalkOptions};
use crate::model::{CommitRecord, PeopleOutput, PersonActivity, SCHEMA_VERSION};
use crate::util::{spinner, with_progress};
use anyhow::Context;
use chrono::{Timelike, Utc};
use console::style;
use std::collections::BTreeMap;

pub fn exec(common: &CommonArgs, config: &AnalystConfig, json: bool) -> anyhow::Result<()> {
    let repo = GitRepo::open(common.require_repo()?).context("Failed to open git repository")?;
    let walk = repo.commits(WalkOptions::new()).context("Failed to start history walk")?;

    let pb = spinner("Reading history", !json);
    let people = tally(with_progress(walk, &pb), &config.people).context("Failed to read commits")?;
    pb.finish_and_clear();

    if json {
        let output = PeopleOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repository_path: repo.path().to_string_lossy().to_string(),
            entries: people,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        output_table(&people);
    }
    Ok(())
}

/// Commits and night commits per author name, busiest first.
pub fn tally<I>(records: I, night: &PeopleConfig) -> Result<Vec<PersonActivity>>
where
    I: IntoIterator<Item = Result<CommitRecord>>,
{
    let mut by_name: BTreeMap<String, PersonActivity> = BTreeMap::new();
    for record in records {
        let record = record?;
        let entry = by_name
            .entry(record.author_name.clone())
            .or_insert_with(|| PersonActivity {
                name: record.author_name.clone(),
                commits: 0,
                night_commits: 0,
            });
        entry.commits += 1;
        if is_night(record.author_timestamp.hour(), night) {
            entry.night_commits += 1;
        }
    }

    let mut people: Vec<_> = by_name.into_values().collect();
    people.sort_by(|a, b| b.commits.cmp(&a.commits));
    Ok(people)
}

/// Hour in the author's own offset; the window may wrap past midnight.
fn is_night(hour: u32, night: &PeopleConfig) -> bool {
    if night.night_start > night.night_end {
        hour >= night.night_start || hour < night.night_end
    } else {
        hour >= night.night_start && hour < night.night_end
    }
}

fn output_table(people: &[PersonActivity]) {
    println!("{}", style("Active developers").bold());
    println!(
        "{:<32} {:>8} {:>8}",
        style("Author").bold(),
        style("Commits").bold(),
        style("Night").bold()
    );
    println!("{}", "─".repeat(50));
    for p in people {
        println!("{:<32} {:>8} {:>8}", p.name, p.commits, p.night_commits);
    }
}
