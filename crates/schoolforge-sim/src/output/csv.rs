use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use schoolforge_core::SchoolDataset;

use crate::errors::SimulationError;

/// Attempts per table before the export is skipped.
pub const DEFAULT_RETRIES: u32 = 3;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Summary of one exported table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableExport {
    pub table: String,
    pub path: PathBuf,
    pub rows: u64,
    pub attempts: u32,
}

/// Report for a CSV export run, written alongside the tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub run_id: String,
    pub written: Vec<TableExport>,
    pub skipped: Vec<String>,
}

impl ExportReport {
    fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            written: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Export all five tables as CSV under `dir`.
///
/// A locked file is retried up to `retries` times with a short backoff and
/// a warning per attempt; a table that keeps failing is skipped and the
/// export continues with the remaining tables.
pub fn export_dataset(
    dir: &Path,
    dataset: &SchoolDataset,
    retries: u32,
) -> Result<ExportReport, SimulationError> {
    std::fs::create_dir_all(dir)?;
    let mut report = ExportReport::new();

    let tables: [(&str, Vec<&'static str>, Vec<Vec<String>>); 5] = [
        (
            "grades",
            schoolforge_core::CatalogEntry::HEADER.to_vec(),
            dataset.catalog.iter().map(|r| r.to_row()).collect(),
        ),
        (
            "students",
            schoolforge_core::StudentRow::HEADER.to_vec(),
            dataset.students.iter().map(|r| r.to_row()).collect(),
        ),
        (
            "academic_records",
            schoolforge_core::AcademicRecord::HEADER.to_vec(),
            dataset.academics.iter().map(|r| r.to_row()).collect(),
        ),
        (
            "graduates",
            schoolforge_core::GraduateRecord::HEADER.to_vec(),
            dataset.graduates.iter().map(|r| r.to_row()).collect(),
        ),
        (
            "terminated",
            schoolforge_core::TerminatedRecord::HEADER.to_vec(),
            dataset.terminated.iter().map(|r| r.to_row()).collect(),
        ),
    ];

    for (table, header, rows) in tables {
        let path = dir.join(format!("{table}.csv"));
        match write_with_retry(&path, &header, &rows, retries) {
            Some(attempts) => {
                info!(table, rows = rows.len(), attempts, "table exported");
                report.written.push(TableExport {
                    table: table.to_string(),
                    path,
                    rows: rows.len() as u64,
                    attempts,
                });
            }
            None => {
                warn!(table, "table export skipped");
                report.skipped.push(table.to_string());
            }
        }
    }

    let report_path = dir.join("export_report.json");
    std::fs::write(&report_path, serde_json::to_vec_pretty(&report)?)?;
    Ok(report)
}

/// Returns the number of attempts used, or `None` when the table was
/// skipped. Only lock-style errors are retried; anything else skips the
/// table immediately.
fn write_with_retry(
    path: &Path,
    header: &[&str],
    rows: &[Vec<String>],
    retries: u32,
) -> Option<u32> {
    for attempt in 1..=retries.max(1) {
        match write_table(path, header, rows) {
            Ok(()) => return Some(attempt),
            Err(err) if is_transient_lock(&err) && attempt < retries => {
                warn!(
                    path = %path.display(),
                    attempt,
                    remaining = retries - attempt,
                    "export target locked, retrying"
                );
                std::thread::sleep(RETRY_BACKOFF);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "export failed");
                return None;
            }
        }
    }
    None
}

fn write_table(path: &Path, header: &[&str], rows: &[Vec<String>]) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn is_transient_lock(err: &csv::Error) -> bool {
    match err.kind() {
        csv::ErrorKind::Io(io_err) => matches!(
            io_err.kind(),
            ErrorKind::PermissionDenied | ErrorKind::WouldBlock
        ),
        _ => false,
    }
}
