//! Record sinks
//!
//! A sink receives the outcomes of a batch once it has stopped and writes
//! them somewhere. Implementations decide which outcomes they keep.

use crate::output::csv_export::write_csv;
use crate::record::ScrapeOutcome;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur while exporting results
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No records to export")]
    Empty,

    #[error("Too many records: {size} exceeds the maximum of {max} per export")]
    TooMany { size: usize, max: usize },

    #[error("Failed to serialize record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Destination for the outcomes of a batch
pub trait RecordSink {
    /// Writes the outcomes of one batch
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of rows written
    /// * `Err(ExportError)` - The batch was rejected or the write failed
    fn write_outcomes(&mut self, outcomes: &[&ScrapeOutcome]) -> ExportResult<usize>;
}

/// Writes one JSON object per outcome, successes and errors alike
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn write_outcomes(&mut self, outcomes: &[&ScrapeOutcome]) -> ExportResult<usize> {
        for outcome in outcomes {
            serde_json::to_writer(&mut self.out, outcome)?;
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        Ok(outcomes.len())
    }
}

/// Writes the spreadsheet CSV of the successful outcomes
pub struct CsvSink<W: Write> {
    out: W,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_outcomes(&mut self, outcomes: &[&ScrapeOutcome]) -> ExportResult<usize> {
        let records: Vec<_> = outcomes.iter().filter_map(|o| o.record()).collect();
        write_csv(&mut self.out, &records)
    }
}
