pub mod csv;

pub use csv::{DEFAULT_RETRIES, ExportReport, TableExport, export_dataset};
