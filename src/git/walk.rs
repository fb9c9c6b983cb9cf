use super::repo::GitRepo;
use crate::error::{AnalystError, Result};
use crate::model::CommitRecord;
use chrono::{DateTime, Utc};
use gix::ObjectId;
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Only emit commits at or after this instant. Ancestors of an older
    /// commit are not visited.
    pub since: Option<DateTime<Utc>>,
    pub include_merges: bool,
    /// Start from every reference instead of HEAD alone.
    pub all_refs: bool,
    /// Diff each commit against its first parent and fill `file_changes`.
    pub with_changes: bool,
    pub interrupt: Option<Arc<AtomicBool>>,
}

impl WalkOptions {
    pub fn new() -> Self {
        Self {
            include_merges: true,
            ..Self::default()
        }
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn without_merges(mut self) -> Self {
        self.include_merges = false;
        self
    }

    pub fn from_all_refs(mut self) -> Self {
        self.all_refs = true;
        self
    }

    pub fn with_changes(mut self) -> Self {
        self.with_changes = true;
        self
    }

    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }
}

/// Lazy, newest-first traversal of the commit graph.
///
/// Commits are popped from a queue ordered by commit time, so merged
/// branches interleave by date the way `git log` shows them. Each commit is
/// yielded at most once.
pub struct CommitWalk<'repo> {
    repo: &'repo GitRepo,
    queue: BinaryHeap<(i64, ObjectId)>,
    seen: HashSet<ObjectId>,
    options: WalkOptions,
    finished: bool,
}

impl<'repo> CommitWalk<'repo> {
    pub(crate) fn new(repo: &'repo GitRepo, tips: Vec<ObjectId>, options: WalkOptions) -> Result<Self> {
        let mut walk = Self {
            repo,
            queue: BinaryHeap::new(),
            seen: HashSet::new(),
            options,
            finished: false,
        };
        for tip in tips {
            walk.enqueue(tip)?;
        }
        Ok(walk)
    }

    fn enqueue(&mut self, id: ObjectId) -> Result<()> {
        if self.seen.insert(id) {
            let time = self.repo.commit_time(id)?;
            self.queue.push((time, id));
        }
        Ok(())
    }

    fn interrupted(&self) -> bool {
        self.options
            .interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn visit(&mut self, time: i64, id: ObjectId) -> Result<Option<CommitRecord>> {
        if let Some(since) = self.options.since {
            if time < since.timestamp() {
                return Ok(None);
            }
        }

        let parents = self.repo.parent_ids(id)?;
        for pid in &parents {
            self.enqueue(*pid)?;
        }

        if !self.options.include_merges && parents.len() > 1 {
            return Ok(None);
        }

        self.repo
            .record(id, &parents, self.options.with_changes)
            .map(Some)
    }
}

impl Iterator for CommitWalk<'_> {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            if self.interrupted() {
                self.finished = true;
                return Some(Err(AnalystError::Interrupted));
            }

            let (time, id) = self.queue.pop()?;
            match self.visit(time, id) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
