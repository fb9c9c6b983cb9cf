use super::keys::KeyPolicy;
use super::table::AggregateTable;
use crate::error::Result;
use crate::model::CommitRecord;
use std::collections::BTreeSet;

/// Folds a commit stream into an [`AggregateTable`] under one key policy.
///
/// Records must be fed in stream order. Each record opens a new commit
/// boundary; a key's commit count rises at most once between two
/// boundaries no matter how many of the commit's files map to it.
pub struct StreamAggregator<P: KeyPolicy> {
    policy: P,
    project: String,
    table: AggregateTable<P::Key>,
    /// Keys already credited with the open commit. Never shares storage
    /// with the totals.
    credited: BTreeSet<P::Key>,
    commits_seen: u64,
    skipped_changes: u64,
}

impl<P: KeyPolicy> StreamAggregator<P> {
    pub fn new(policy: P, project: impl Into<String>) -> Self {
        Self {
            policy,
            project: project.into(),
            table: AggregateTable::new(),
            credited: BTreeSet::new(),
            commits_seen: 0,
            skipped_changes: 0,
        }
    }

    pub fn fold(&mut self, record: &CommitRecord) {
        self.open_boundary();

        for change in &record.file_changes {
            let Some(delta) = change.delta else {
                self.skipped_changes += 1;
                continue;
            };

            let key = self.policy.extract(record, change, &self.project);
            let newly_credited = !self.credited.contains(&key);
            let total = self.table.total_mut(key.clone());
            total.additions += delta.added;
            total.deletions += delta.deleted;
            if newly_credited {
                total.commits += 1;
                self.credited.insert(key);
            }
        }
    }

    fn open_boundary(&mut self) {
        self.credited.clear();
        self.commits_seen += 1;
    }

    pub fn commits_seen(&self) -> u64 {
        self.commits_seen
    }

    /// File changes ignored because their line counts were unresolved.
    pub fn skipped_changes(&self) -> u64 {
        self.skipped_changes
    }

    pub fn table(&self) -> &AggregateTable<P::Key> {
        &self.table
    }

    pub fn finish(self) -> AggregateTable<P::Key> {
        self.table
    }
}

/// Drains `stream` through a fresh [`StreamAggregator`].
///
/// A read failure from the stream is returned as is and the partial table
/// is discarded.
pub fn aggregate<I, P>(stream: I, policy: P, project: &str) -> Result<AggregateTable<P::Key>>
where
    I: IntoIterator<Item = Result<CommitRecord>>,
    P: KeyPolicy,
{
    let mut aggregator = StreamAggregator::new(policy, project);
    for record in stream {
        aggregator.fold(&record?);
    }
    tracing::debug!(
        project,
        commits = aggregator.commits_seen(),
        skipped = aggregator.skipped_changes(),
        keys = aggregator.table().len(),
        "aggregation finished"
    );
    Ok(aggregator.finish())
}
