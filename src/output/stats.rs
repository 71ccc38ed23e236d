//! Batch statistics
//!
//! A [`BatchSummary`] is tallied from the queue once a batch stops and is
//! printed by the CLI after every run.

use crate::crawler::QueueItem;
use crate::record::ScrapeOutcome;
use crate::state::{ErrorKind, ItemStatus};
use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Duration;

/// Counts describing one finished (or cancelled) batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Number of items in the batch state
    pub total: usize,

    pub done: usize,
    pub errors: usize,

    /// Items never claimed because the batch was cancelled
    pub pending: usize,

    /// Done items served from the result cache
    pub cache_hits: usize,

    /// Error count per failure kind
    pub errors_by_kind: HashMap<ErrorKind, usize>,

    pub elapsed: Duration,
}

impl BatchSummary {
    /// Tallies a summary from a queue snapshot
    ///
    /// # Arguments
    ///
    /// * `items` - Queue items in any state
    /// * `elapsed` - Wall-clock time the batch ran for
    pub fn from_items(items: &[QueueItem], elapsed: Duration) -> Self {
        let mut summary = Self {
            total: items.len(),
            elapsed,
            ..Default::default()
        };

        for item in items {
            match item.status {
                ItemStatus::Done => {
                    summary.done += 1;
                    if item.from_cache() {
                        summary.cache_hits += 1;
                    }
                }
                ItemStatus::Error => {
                    summary.errors += 1;
                    if let Some(ScrapeOutcome::Error(failure)) = &item.outcome {
                        *summary.errors_by_kind.entry(failure.kind).or_insert(0) += 1;
                    }
                }
                // Active items only exist while workers run
                ItemStatus::Pending | ItemStatus::Active => summary.pending += 1,
            }
        }

        summary
    }

    /// Resolved items per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        (self.done + self.errors) as f64 / secs
    }

    /// Share of resolved items that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let resolved = self.done + self.errors;
        if resolved == 0 {
            return 0.0;
        }
        (self.done as f64 / resolved as f64) * 100.0
    }
}

/// Writes a human-readable summary
pub fn write_summary<W: Write>(mut w: W, summary: &BatchSummary) -> io::Result<()> {
    writeln!(w, "=== Batch Summary ===")?;
    writeln!(w)?;
    writeln!(w, "  Total URLs: {}", summary.total)?;
    writeln!(
        w,
        "  Done: {} ({} from cache)",
        summary.done, summary.cache_hits
    )?;
    writeln!(w, "  Errors: {}", summary.errors)?;
    if summary.pending > 0 {
        writeln!(w, "  Pending (cancelled): {}", summary.pending)?;
    }

    if !summary.errors_by_kind.is_empty() {
        writeln!(w)?;
        writeln!(w, "Errors by kind:")?;
        for kind in ErrorKind::all() {
            if let Some(count) = summary.errors_by_kind.get(&kind) {
                writeln!(w, "  {}: {}", kind, count)?;
            }
        }
    }

    writeln!(w)?;
    writeln!(
        w,
        "Elapsed: {:.1}s ({:.2} URLs/s), success rate {:.1}%",
        summary.elapsed.as_secs_f64(),
        summary.throughput(),
        summary.success_rate()
    )?;
    Ok(())
}

/// Prints the summary to stderr, keeping stdout free for records
pub fn print_summary(summary: &BatchSummary) {
    let stderr = io::stderr();
    if let Err(e) = write_summary(stderr.lock(), summary) {
        tracing::warn!("Failed to print batch summary: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CircuitRecord, ScrapeFailure};

    fn resolved(url: &str, outcome: ScrapeOutcome) -> QueueItem {
        let mut item = QueueItem::new(url);
        item.status = if outcome.is_success() {
            ItemStatus::Done
        } else {
            ItemStatus::Error
        };
        item.outcome = Some(outcome);
        item
    }

    #[test]
    fn test_summary_counts() {
        let mut cached = CircuitRecord::empty("https://a.example.com/2");
        cached.from_cache = true;

        let items = vec![
            resolved("https://a.example.com/1", CircuitRecord::empty("https://a.example.com/1").into()),
            resolved("https://a.example.com/2", cached.into()),
            resolved(
                "https://b.example.com/1",
                ScrapeFailure::new("https://b.example.com/1", ErrorKind::Timeout, "timed out").into(),
            ),
            QueueItem::new("https://c.example.com/1"),
        ];

        let summary = BatchSummary::from_items(&items, Duration::from_secs(2));
        assert_eq!(summary.total, 4);
        assert_eq!(summary.done, 2);
        assert_eq!(summary.cache_hits, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.errors_by_kind.get(&ErrorKind::Timeout), Some(&1));
        assert!((summary.throughput() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_summary_rates() {
        let summary = BatchSummary::default();
        assert_eq!(summary.throughput(), 0.0);
        assert_eq!(summary.success_rate(), 0.0);
    }

    #[test]
    fn test_write_summary() {
        let mut items = vec![resolved(
            "https://b.example.com/1",
            ScrapeFailure::new("https://b.example.com/1", ErrorKind::Forbidden, "HTTP 403").into(),
        )];
        items.push(QueueItem::new("https://c.example.com/1"));

        let summary = BatchSummary::from_items(&items, Duration::from_secs(1));
        let mut out = Vec::new();
        write_summary(&mut out, &summary).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Errors: 1"));
        assert!(text.contains("forbidden: 1"));
        assert!(text.contains("Pending (cancelled): 1"));
    }
}
