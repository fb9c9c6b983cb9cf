//! Commit records from `git log --numstat` text.
//!
//! Expected shape, as produced by
//! `git log --numstat --format='%H|%an|%ae|%at'`:
//!
//! ```text
//! 3f2a...|Ann|ann@example.com|1714557600
//!
//! 10	2	src/foo.py
//! -	-	assets/logo.png
//! ```
//!
//! A header line opens a commit; the file lines that follow belong to it
//! until the next header. The timestamp field is optional and may be unix
//! seconds or RFC 3339.

use crate::error::{AnalystError, Result};
use crate::model::{CommitRecord, FileChange, LineDelta};
use chrono::{DateTime, FixedOffset, Utc};
use std::io::BufRead;

/// Lazily turns numstat log text into [`CommitRecord`]s.
pub struct NumstatReader<R> {
    lines: std::io::Lines<R>,
    pending: Option<CommitRecord>,
    done: bool,
}

impl<R: BufRead> NumstatReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            pending: None,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for NumstatReader<R> {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(AnalystError::Io(e)));
                }
                None => {
                    self.done = true;
                    return self.pending.take().map(Ok);
                }
            };

            match classify(&line) {
                Line::Header(record) => {
                    if let Some(finished) = self.pending.replace(record) {
                        return Some(Ok(finished));
                    }
                }
                Line::Change(change) => {
                    if let Some(open) = self.pending.as_mut() {
                        open.file_changes.push(change);
                    }
                }
                Line::Ignored => {}
            }
        }
    }
}

enum Line {
    Header(CommitRecord),
    Change(FileChange),
    Ignored,
}

fn classify(line: &str) -> Line {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return Line::Ignored;
    }
    if let Some(change) = parse_change(line) {
        return Line::Change(change);
    }
    match parse_header(line) {
        Some(record) => Line::Header(record),
        None => Line::Ignored,
    }
}

fn parse_change(line: &str) -> Option<FileChange> {
    let mut fields = line.splitn(3, '\t');
    let added = fields.next()?.trim();
    let deleted = fields.next()?.trim();
    let path = fields.next()?.trim();
    if path.is_empty() || !is_count(added) || !is_count(deleted) {
        return None;
    }

    let path = resolve_rename(path);
    let delta = match (added.parse::<u64>(), deleted.parse::<u64>()) {
        (Ok(added), Ok(deleted)) => Some(LineDelta { added, deleted }),
        _ => None,
    };
    Some(FileChange { path, delta })
}

fn is_count(field: &str) -> bool {
    field == "-" || (!field.is_empty() && field.bytes().all(|b| b.is_ascii_digit()))
}

fn parse_header(line: &str) -> Option<CommitRecord> {
    let parts: Vec<&str> = line.splitn(4, '|').collect();
    if parts.len() < 3 || parts[0].trim().is_empty() {
        return None;
    }
    let timestamp = parts
        .get(3)
        .and_then(|raw| parse_timestamp(raw.trim()))
        .unwrap_or_else(epoch);
    Some(CommitRecord::new(parts[0].trim(), parts[1], parts[2], timestamp))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.fixed_offset());
    }
    DateTime::parse_from_rfc3339(raw).ok()
}

fn epoch() -> DateTime<FixedOffset> {
    DateTime::<Utc>::default().fixed_offset()
}

/// Destination path of a numstat rename such as `src/{a => b}/x.rs` or
/// `old.txt => new.txt`.
fn resolve_rename(path: &str) -> String {
    if let (Some(open), Some(close)) = (path.find('{'), path.rfind('}')) {
        if open < close {
            let inner = &path[open + 1..close];
            if let Some((_, to)) = inner.split_once(" => ") {
                let joined = format!("{}{}{}", &path[..open], to, &path[close + 1..]);
                return joined.replace("//", "/");
            }
        }
    }
    match path.split_once(" => ") {
        Some((_, to)) => to.to_string(),
        None => path.to_string(),
    }
}
