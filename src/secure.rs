use crate::cli::CommonArgs;
use crate::config::AnalystConfig;
use crate::error::Result;
use crate::git::{GitRepo, WalkOptions};
use crate::model::{CommitRecord, SecureOutput, Suspect, SCHEMA_VERSION};
use crate::patterns::PatternSet;
use crate::util::{spinner, with_progress};
use anyhow::Context;
use chrono::Utc;
use console::style;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub scanned: u64,
    pub suspects: Vec<Suspect>,
}

/// Commits whose message matches any sensitive pattern, in stream order.
pub fn scan<I>(records: I, patterns: &PatternSet) -> Result<ScanReport>
where
    I: IntoIterator<Item = Result<CommitRecord>>,
{
    let mut report = ScanReport::default();
    for record in records {
        let record = record?;
        report.scanned += 1;
        let labels: Vec<String> = patterns.matches(&record.message).map(str::to_string).collect();
        if !labels.is_empty() {
            report.suspects.push(Suspect {
                short_hash: record.short_hash().to_string(),
                hash: record.hash,
                labels,
            });
        }
    }
    Ok(report)
}

pub fn exec(common: &CommonArgs, config: &AnalystConfig, json: bool) -> anyhow::Result<()> {
    let patterns = PatternSet::compile(&config.secure.patterns).context("Invalid secure pattern")?;
    let repo = GitRepo::open(common.require_repo()?).context("Failed to open git repository")?;
    let walk = repo
        .commits(WalkOptions::new().from_all_refs())
        .context("Failed to start history walk")?;

    let pb = spinner("Scanning commit messages", !json);
    let report = scan(with_progress(walk, &pb), &patterns).context("Failed to read commits")?;
    pb.finish_and_clear();

    if json {
        let output = SecureOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repository_path: repo.path().to_string_lossy().to_string(),
            scanned: report.scanned,
            suspects: report.suspects,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if report.suspects.is_empty() {
        println!("{} commits scanned, nothing suspicious", report.scanned);
        return Ok(());
    }
    println!(
        "{}",
        style(format!("{} of {} commits mention sensitive keywords", report.suspects.len(), report.scanned))
            .yellow()
            .bold()
    );
    for s in &report.suspects {
        println!("  {}  {}", style(&s.short_hash).dim(), s.labels.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecureConfig;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    fn commit(hash: &str, message: &str) -> Result<CommitRecord> {
        let ts = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        Ok(CommitRecord::new(hash, "a", "a@x.com", ts).with_message(message))
    }

    #[test]
    fn flags_messages_with_every_matching_label() {
        let patterns = PatternSet::compile(&SecureConfig::default().patterns).unwrap();
        let report = scan(
            vec![
                commit("0123456789abcdef", "remove hardcoded PASSWORD and api token"),
                commit("fedcba9876543210", "bump deps"),
                commit("00000000ffffffff", "rotate AWS access_key"),
            ],
            &patterns,
        )
        .unwrap();

        assert_eq!(report.scanned, 3);
        assert_eq!(
            report.suspects,
            vec![
                Suspect {
                    hash: "0123456789abcdef".into(),
                    short_hash: "01234567".into(),
                    labels: vec!["password".into(), "token".into()],
                },
                Suspect {
                    hash: "00000000ffffffff".into(),
                    short_hash: "00000000".into(),
                    labels: vec!["access-key".into()],
                },
            ]
        );
    }
}
