//! Output module for batch results
//!
//! This module handles:
//! - Writing outcomes as JSON lines or as the spreadsheet CSV
//! - Guarding the export boundary (batch ceiling, formula sanitising)
//! - Summarising a finished batch

pub mod csv_export;
pub mod stats;
mod traits;

pub use csv_export::{default_filename, export_csv, write_csv, MAX_EXPORT_ITEMS};
pub use stats::{print_summary, write_summary, BatchSummary};
pub use traits::{CsvSink, ExportError, ExportResult, JsonLinesSink, RecordSink};
