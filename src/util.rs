use crate::error::Result;
use crate::model::CommitRecord;
use chrono::{DateTime, Duration, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Start of a window covering the last `days` days.
pub fn days_ago(days: u32) -> DateTime<Utc> {
    Utc::now() - Duration::days(i64::from(days))
}

/// Last component of `path` after resolving `.` and `..`.
pub fn dir_label(path: &Path) -> String {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| resolved.to_string_lossy().into_owned())
}

pub fn spinner(message: &'static str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {pos}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb
}

/// Ticks `pb` once per record pulled through the returned iterator.
pub fn with_progress<'a, I>(stream: I, pb: &'a ProgressBar) -> impl Iterator<Item = Result<CommitRecord>> + 'a
where
    I: Iterator<Item = Result<CommitRecord>> + 'a,
{
    stream.inspect(move |_| pb.inc(1))
}

pub fn percent(part: u64, whole: u64) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_nothing_is_undefined() {
        assert_eq!(percent(0, 0), None);
        assert_eq!(percent(1, 4), Some(25.0));
    }

    #[test]
    fn dir_label_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("service.api");
        std::fs::create_dir(&nested).unwrap();
        assert_eq!(dir_label(&nested.join("..").join("service.api")), "service.api");
    }

    #[test]
    fn window_starts_in_the_past() {
        let start = days_ago(30);
        let age = Utc::now() - start;
        assert!(age.num_days() >= 29 && age.num_days() <= 30);
    }
}
