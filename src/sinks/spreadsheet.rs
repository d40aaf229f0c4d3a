use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use tokio::sync::Mutex;

use super::{SinkError, SinkOutcome, SubmissionSink};
use crate::models::NewSubmission;

pub const HEADERS: [&str; 3] = ["name", "contact", "age"];

const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date number.
    DateTime(f64),
}

/// Header row plus data rows, as read from or written to a workbook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Append a submission, adding any of the known columns the sheet lacks.
    pub fn append(&mut self, submission: &NewSubmission) {
        for header in HEADERS {
            if !self.headers.iter().any(|h| h == header) {
                self.headers.push(header.to_string());
            }
        }

        let row = self
            .headers
            .iter()
            .map(|h| match h.as_str() {
                "name" => Cell::Text(submission.name.clone()),
                "contact" => Cell::Text(submission.contact.clone()),
                "age" => Cell::Number(submission.age as f64),
                _ => Cell::Empty,
            })
            .collect();
        self.rows.push(row);
    }
}

/// Appends each submission to an `.xlsx` workbook, rewriting the whole file.
pub struct SpreadsheetSink {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process. The guard
    // moves into the blocking task so a cancelled request still holds it.
    lock: Arc<Mutex<()>>,
}

impl SpreadsheetSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }
}

#[async_trait]
impl SubmissionSink for SpreadsheetSink {
    fn id(&self) -> &str {
        "spreadsheet"
    }

    async fn store(&self, submission: &NewSubmission) -> Result<SinkOutcome, SinkError> {
        let guard = self.lock.clone().lock_owned().await;

        let path = self.path.clone();
        let submission = submission.clone();
        let rows = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            append_row(&path, &submission)
        })
        .await
        .map_err(|e| format!("Spreadsheet task failed: {e}"))??;

        tracing::debug!("{} now holds {rows} rows", self.path.display());
        Ok(SinkOutcome::default())
    }
}

/// Read the workbook (if any), append one row, and write it back.
/// Returns the number of data rows after the append.
pub fn append_row(path: &Path, submission: &NewSubmission) -> Result<usize> {
    let mut sheet = if path.exists() {
        read_sheet(path)?
    } else {
        Sheet::default()
    };

    sheet.append(submission);
    write_sheet(path, &sheet)?;
    Ok(sheet.rows.len())
}

pub fn read_sheet(path: &Path) -> Result<Sheet> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .context("Workbook has no worksheets")?
        .context("Failed to read first worksheet")?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|header| header.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();

    let rows = rows
        .map(|row| {
            let mut cells: Vec<Cell> = row.iter().map(to_cell).collect();
            cells.resize(headers.len(), Cell::Empty);
            cells
        })
        .collect();

    Ok(Sheet { headers, rows })
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
        other => Cell::Text(other.to_string()),
    }
}

/// Write the sheet to a temporary sibling and rename it over `path`.
pub fn write_sheet(path: &Path, sheet: &Sheet) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format(DATE_FORMAT);

    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .with_context(|| format!("Failed to write header at column {col}"))?;
    }

    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col = col_idx as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet
                        .write_string(excel_row, col, s)
                        .with_context(|| format!("Failed to write string at ({excel_row}, {col})"))?;
                }
                Cell::Number(n) => {
                    worksheet
                        .write_number(excel_row, col, *n)
                        .with_context(|| format!("Failed to write number at ({excel_row}, {col})"))?;
                }
                Cell::Bool(b) => {
                    worksheet
                        .write_boolean(excel_row, col, *b)
                        .with_context(|| format!("Failed to write boolean at ({excel_row}, {col})"))?;
                }
                Cell::DateTime(serial) => {
                    worksheet
                        .write_number_with_format(excel_row, col, *serial, &date_format)
                        .with_context(|| format!("Failed to write date at ({excel_row}, {col})"))?;
                }
            }
        }
    }

    worksheet.autofit();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let tmp = path.with_extension("xlsx.tmp");
    workbook
        .save(&tmp)
        .with_context(|| format!("Failed to save workbook to {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}
