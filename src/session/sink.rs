//! Data sink: accumulates trial records and exports them as CSV
//!
//! Fields containing a comma, quote or newline are wrapped in double quotes
//! with inner quotes doubled; empty values render as empty strings. Rows are
//! joined with `\n` and the file carries no trailing newline.

use crate::error::{ExperimentError, Result};
use crate::session::record::{TrialRecord, CSV_HEADER};
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Receives completed trial records
pub trait DataSink {
    fn append(&mut self, record: TrialRecord);
    fn records(&self) -> &[TrialRecord];
    /// Drop records not yet exported (abort path)
    fn discard(&mut self);
}

/// In-memory, append-only record list
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordTable {
    records: Vec<TrialRecord>,
}

impl DataSink for RecordTable {
    fn append(&mut self, record: TrialRecord) {
        self.records.push(record);
    }

    fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    fn discard(&mut self) {
        self.records.clear();
    }
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the header and one row per record
    pub fn to_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.records.len() + 1);
        lines.push(CSV_HEADER.join(","));
        for record in &self.records {
            let row: Vec<String> = record.fields().iter().map(|f| csv_escape(f)).collect();
            lines.push(row.join(","));
        }
        lines.join("\n")
    }

    /// Parse a table produced by `to_csv`. Columns are located by header name.
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut rows = parse_csv(text)?.into_iter();
        let header = rows.next().ok_or_else(|| ExperimentError::MalformedCsv {
            line: 1,
            reason: "missing header".into(),
        })?;

        let positions: FxHashMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect();
        let mut columns = [0usize; 13];
        for (slot, name) in columns.iter_mut().zip(CSV_HEADER.iter()) {
            *slot = *positions
                .get(name)
                .ok_or_else(|| ExperimentError::MalformedCsv {
                    line: 1,
                    reason: format!("missing column {}", name),
                })?;
        }

        let mut table = RecordTable::new();
        for (idx, row) in rows.enumerate() {
            let line = idx + 2;
            let mut fields = [""; 13];
            for (field, &col) in fields.iter_mut().zip(columns.iter()) {
                *field = row.get(col).map(String::as_str).ok_or_else(|| {
                    ExperimentError::MalformedCsv {
                        line,
                        reason: format!("expected {} fields, got {}", header.len(), row.len()),
                    }
                })?;
            }
            table.append(TrialRecord::from_fields(&fields, line)?);
        }
        Ok(table)
    }

    /// Write the table to `<dir>/<subject>_pitch_discrimination.csv`
    pub fn export_csv<P: AsRef<Path>>(&self, dir: P, subject_id: &str) -> Result<PathBuf> {
        let path = dir.as_ref().join(export_file_name(subject_id));
        fs::write(&path, self.to_csv())?;
        tracing::info!(path = %path.display(), rows = self.records.len(), "exported trial records");
        Ok(path)
    }
}

/// `<subjectId>_pitch_discrimination.csv`, "subject" when the id is blank
pub fn export_file_name(subject_id: &str) -> String {
    let id = subject_id.trim();
    let id = if id.is_empty() { "subject" } else { id };
    format!("{}_pitch_discrimination.csv", id)
}

pub fn csv_escape(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Split CSV text into rows of unescaped fields. Quoted fields may span lines.
pub fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ExperimentError::MalformedCsv {
            line,
            reason: "unterminated quoted field".into(),
        });
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}
