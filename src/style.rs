use crate::cli::CommonArgs;
use crate::config::AnalystConfig;
use crate::error::Result;
use crate::git::{GitRepo, WalkOptions};
use crate::model::{CommitRecord, LabelCount, StyleOutput, SCHEMA_VERSION};
use crate::patterns::PatternSet;
use crate::util::{percent, spinner, with_progress};
use anyhow::Context;
use chrono::Utc;
use console::style;

#[derive(Debug, Clone, PartialEq)]
pub struct StyleReport {
    pub compliant: u64,
    pub non_compliant: u64,
    /// Hits per pattern label, in configuration order, zeros included.
    pub by_label: Vec<LabelCount>,
}

impl StyleReport {
    pub fn total(&self) -> u64 {
        self.compliant + self.non_compliant
    }

    pub fn compliance_rate(&self) -> Option<f64> {
        percent(self.compliant, self.total())
    }
}

/// A message is compliant when any pattern matches it.
pub fn check<I>(records: I, patterns: &PatternSet) -> Result<StyleReport>
where
    I: IntoIterator<Item = Result<CommitRecord>>,
{
    let mut by_label: Vec<LabelCount> = patterns
        .labels()
        .map(|label| LabelCount {
            label: label.to_string(),
            count: 0,
        })
        .collect();
    let mut compliant = 0;
    let mut non_compliant = 0;

    for record in records {
        let record = record?;
        let mut hit = false;
        for label in patterns.matches(&record.message) {
            hit = true;
            if let Some(slot) = by_label.iter_mut().find(|c| c.label == label) {
                slot.count += 1;
            }
        }
        if hit {
            compliant += 1;
        } else {
            non_compliant += 1;
        }
    }

    Ok(StyleReport {
        compliant,
        non_compliant,
        by_label,
    })
}

pub fn exec(common: &CommonArgs, config: &AnalystConfig, json: bool) -> anyhow::Result<()> {
    let patterns = PatternSet::compile(&config.style.patterns).context("Invalid style pattern")?;
    let repo = GitRepo::open(common.require_repo()?).context("Failed to open git repository")?;
    let walk = repo.commits(WalkOptions::new()).context("Failed to start history walk")?;

    let pb = spinner("Checking commit messages", !json);
    let report = check(with_progress(walk, &pb), &patterns).context("Failed to read commits")?;
    pb.finish_and_clear();

    if json {
        let output = StyleOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repository_path: repo.path().to_string_lossy().to_string(),
            compliant: report.compliant,
            non_compliant: report.non_compliant,
            compliance_rate: report.compliance_rate(),
            by_label: report.by_label,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", style("Commit message style").bold());
    println!("  compliant:     {}", style(report.compliant).green());
    println!("  non-compliant: {}", style(report.non_compliant).red());
    match report.compliance_rate() {
        Some(rate) => println!("  compliance:    {rate:.1}%"),
        None => println!("  compliance:    n/a (no commits)"),
    }
    for c in &report.by_label {
        println!("  {:<20} {}", c.label, c.count);
    }
    Ok(())
}
