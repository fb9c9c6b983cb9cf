use crate::cli::CommonArgs;
use crate::config::AnalystConfig;
use crate::error::Result;
use crate::git::{GitRepo, WalkOptions};
use crate::model::{HotFile, HotOutput, SCHEMA_VERSION};
use crate::util::spinner;
use anyhow::Context;
use chrono::Utc;
use console::style;
use indicatif::ProgressBar;
use std::collections::BTreeMap;

/// Change counts per path summed over consecutive commit pairs.
#[derive(Debug, Clone, Default)]
pub struct HotFiles {
    counts: BTreeMap<String, u64>,
    transitions: u64,
}

impl HotFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_transition(&mut self, stats: &BTreeMap<String, u32>) {
        self.transitions += 1;
        for (path, changes) in stats {
            *self.counts.entry(path.clone()).or_insert(0) += u64::from(*changes);
        }
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// The `top` hottest paths; ties keep path order.
    pub fn ranked(&self, top: usize) -> Vec<HotFile> {
        let mut files: Vec<_> = self
            .counts
            .iter()
            .map(|(path, changes)| HotFile {
                path: path.clone(),
                changes: *changes,
            })
            .collect();
        files.sort_by(|a, b| b.changes.cmp(&a.changes));
        files.truncate(top);
        files
    }
}

/// Walks HEAD newest first and diffs every adjacent pair. A pair whose diff
/// fails is skipped.
pub fn compute(repo: &GitRepo, pb: &ProgressBar) -> Result<HotFiles> {
    let mut hot = HotFiles::new();
    let mut newer: Option<String> = None;

    for record in repo.commits(WalkOptions::new())? {
        let record = record?;
        if let Some(newer_hash) = newer.as_deref() {
            match repo.diff_stats(&record.hash, newer_hash) {
                Ok(stats) => hot.record_transition(&stats),
                Err(e) => tracing::debug!("skipping {}..{}: {e}", record.short_hash(), newer_hash),
            }
        }
        pb.inc(1);
        newer = Some(record.hash);
    }
    Ok(hot)
}

pub fn exec(common: &CommonArgs, config: &AnalystConfig, top: Option<usize>, json: bool) -> anyhow::Result<()> {
    let repo = GitRepo::open(common.require_repo()?).context("Failed to open git repository")?;

    let pb = spinner("Diffing history", !json);
    let hot = compute(&repo, &pb).context("Failed to compute hot files")?;
    pb.finish_and_clear();

    let entries = hot.ranked(top.unwrap_or(config.hot.top));
    if json {
        let output = HotOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repository_path: repo.path().to_string_lossy().to_string(),
            transitions: hot.transitions(),
            entries,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", style("Hot files").bold());
        for (i, f) in entries.iter().enumerate() {
            println!("{:>2}. {} ({} changes)", i + 1, f.path, style(f.changes).cyan());
        }
    }
    Ok(())
}
