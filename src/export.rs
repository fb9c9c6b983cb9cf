use crate::aggregate::{AggregateTable, FileTypeKey};
use crate::error::{AnalystError, Result};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

pub const CSV_HEADER: [&str; 7] = [
    "Project",
    "Name",
    "Email",
    "FileType",
    "Additions",
    "Deletions",
    "Commits",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Replace the file with a header and this table's rows.
    Truncate,
    /// Add rows to the end; the header is written only by the call that
    /// creates the file.
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows: usize,
    pub header_written: bool,
}

/// Writes `table` to `path` as CSV.
///
/// The rows of one call are rendered up front and written with a single
/// `write_all` on a file opened for appending, so concurrent appenders do
/// not interleave within a table. Whether this call writes the header is
/// decided by an exclusive create.
pub fn write_table(path: &Path, table: &AggregateTable<FileTypeKey>, mode: ExportMode) -> Result<ExportSummary> {
    let (mut file, header_written) = match mode {
        ExportMode::Truncate => (File::create(path).map_err(|e| write_error(path, e))?, true),
        ExportMode::Append => open_for_append(path)?,
    };

    let buffer = render_rows(table, header_written)?;
    file.write_all(&buffer).map_err(|e| write_error(path, e))?;
    file.flush().map_err(|e| write_error(path, e))?;

    Ok(ExportSummary {
        rows: table.len(),
        header_written,
    })
}

fn open_for_append(path: &Path) -> Result<(File, bool)> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok((file, true)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let file = OpenOptions::new()
                .append(true)
                .open(path)
                .map_err(|e| write_error(path, e))?;
            Ok((file, false))
        }
        Err(e) => Err(write_error(path, e)),
    }
}

fn render_rows(table: &AggregateTable<FileTypeKey>, with_header: bool) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    if with_header {
        wtr.write_record(CSV_HEADER)?;
    }
    for (key, total) in table {
        wtr.write_record([
            key.project.clone(),
            key.name.clone(),
            key.email.clone(),
            key.extension.clone(),
            total.additions.to_string(),
            total.deletions.to_string(),
            total.commits.to_string(),
        ])?;
    }
    wtr.into_inner().map_err(|e| AnalystError::Io(e.into_error()))
}

fn write_error(path: &Path, source: std::io::Error) -> AnalystError {
    AnalystError::ExportWrite {
        path: path.to_path_buf(),
        source,
    }
}
