//! `StatsObserver<W>` — bridges `PipelineObserver` to an `OutputWriter`.

use nz_core::BinClock;
use nz_emission::EmissionLevels;
use nz_pipeline::{IterationSummary, PipelineObserver};
use nz_spatial::ReceiverGrid;

use crate::row::{EmissionRow, ImmissionRow, IterationSummaryRow, ReceiverRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`PipelineObserver`] that writes receivers, emissions, immissions and
/// iteration summaries to any [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because observer methods
/// have no return value.  After the last iteration call
/// [`finish`][Self::finish] and check [`take_error`][Self::take_error].
pub struct StatsObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> StatsObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Flush the writer.  Any error is stored for `take_error`.
    pub fn finish(&mut self) {
        let result = self.writer.finish();
        self.store_err(result);
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> PipelineObserver for StatsObserver<W> {
    fn on_grid_ready(&mut self, grid: &ReceiverGrid) {
        let rows: Vec<ReceiverRow> = grid
            .receivers()
            .iter()
            .map(|r| ReceiverRow {
                receiver_id:    r.id.0,
                x:              r.coord.x,
                y:              r.coord.y,
                relevant_links: r.relevant_links().len() as u32,
            })
            .collect();
        let result = self.writer.write_receivers(&rows);
        self.store_err(result);
    }

    fn on_emissions(&mut self, iteration: u32, levels: &EmissionLevels) {
        let rows: Vec<EmissionRow> = levels
            .iter()
            .map(|e| EmissionRow {
                iteration,
                link_id:   e.link.0,
                bin:       e.bin.0,
                vehicles:  e.vehicles(),
                hgv_share: e.hgv_share,
                level_db:  e.level_db,
            })
            .collect();
        if !rows.is_empty() {
            let result = self.writer.write_emissions(&rows);
            self.store_err(result);
        }
    }

    fn on_immissions(&mut self, iteration: u32, grid: &ReceiverGrid, clock: &BinClock) {
        let mut rows = Vec::with_capacity(grid.len() * clock.bin_count() as usize);
        for r in grid.receivers() {
            for (bin, slot) in r.state.iter() {
                let Some(level_db) = slot.immission_db else { continue };
                rows.push(ImmissionRow {
                    iteration,
                    receiver_id:    r.id.0,
                    bin:            bin.0,
                    level_db,
                    affected_units: slot.affected_units,
                    damage_cost:    slot.damage_cost,
                });
            }
        }
        if !rows.is_empty() {
            let result = self.writer.write_immissions(&rows);
            self.store_err(result);
        }
    }

    fn on_iteration_end(&mut self, summary: &IterationSummary) {
        let t = &summary.totals;
        let row = IterationSummaryRow {
            iteration:       summary.iteration,
            vehicle_events:  summary.vehicle_events,
            activity_events: summary.activity_events,
            skipped_events:  summary.skipped_events,
            anomalies:       summary.anomalies,
            total_damage:    t.total_damage,
            caused_total:    t.caused_total,
            affected_total:  t.affected_total,
            caused_events:   t.caused_events as u64,
            affected_events: t.affected_events as u64,
        };
        let result = self.writer.write_iteration_summary(&row);
        self.store_err(result);
    }
}
