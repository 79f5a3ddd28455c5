//! The `OutputWriter` trait implemented by all backend writers.

use crate::{EmissionRow, ImmissionRow, IterationSummaryRow, OutputResult, ReceiverRow};

/// Trait implemented by CSV, SQLite, and Parquet writers.
///
/// Errors surface through [`StatsObserver::take_error`][crate::StatsObserver::take_error]
/// when the writer is driven by the observer.
pub trait OutputWriter {
    /// Write the receiver table.  Called once.
    fn write_receivers(&mut self, rows: &[ReceiverRow]) -> OutputResult<()>;

    /// Write a batch of link emission rows.
    fn write_emissions(&mut self, rows: &[EmissionRow]) -> OutputResult<()>;

    /// Write a batch of receiver immission rows.
    fn write_immissions(&mut self, rows: &[ImmissionRow]) -> OutputResult<()>;

    /// Write one iteration summary row.
    fn write_iteration_summary(&mut self, row: &IterationSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
