//! CSV output backend.
//!
//! Creates four files in the configured output directory:
//! - `receivers.csv`
//! - `emissions.csv`
//! - `immissions.csv`
//! - `iteration_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{EmissionRow, ImmissionRow, IterationSummaryRow, OutputResult, ReceiverRow};

/// Writes pipeline statistics to four CSV files.
pub struct CsvWriter {
    receivers:  Writer<File>,
    emissions:  Writer<File>,
    immissions: Writer<File>,
    summaries:  Writer<File>,
    finished:   bool,
}

impl CsvWriter {
    /// Open (or create) the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut receivers = Writer::from_path(dir.join("receivers.csv"))?;
        receivers.write_record(["receiver_id", "x", "y", "relevant_links"])?;

        let mut emissions = Writer::from_path(dir.join("emissions.csv"))?;
        emissions.write_record(["iteration", "link_id", "bin", "vehicles", "hgv_share", "level_db"])?;

        let mut immissions = Writer::from_path(dir.join("immissions.csv"))?;
        immissions.write_record([
            "iteration", "receiver_id", "bin", "level_db", "affected_units", "damage_cost",
        ])?;

        let mut summaries = Writer::from_path(dir.join("iteration_summaries.csv"))?;
        summaries.write_record([
            "iteration",
            "vehicle_events",
            "activity_events",
            "skipped_events",
            "anomalies",
            "total_damage",
            "caused_total",
            "affected_total",
            "caused_events",
            "affected_events",
        ])?;

        Ok(Self {
            receivers,
            emissions,
            immissions,
            summaries,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_receivers(&mut self, rows: &[ReceiverRow]) -> OutputResult<()> {
        for row in rows {
            self.receivers.write_record(&[
                row.receiver_id.to_string(),
                row.x.to_string(),
                row.y.to_string(),
                row.relevant_links.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_emissions(&mut self, rows: &[EmissionRow]) -> OutputResult<()> {
        for row in rows {
            self.emissions.write_record(&[
                row.iteration.to_string(),
                row.link_id.to_string(),
                row.bin.to_string(),
                row.vehicles.to_string(),
                row.hgv_share.to_string(),
                row.level_db.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_immissions(&mut self, rows: &[ImmissionRow]) -> OutputResult<()> {
        for row in rows {
            self.immissions.write_record(&[
                row.iteration.to_string(),
                row.receiver_id.to_string(),
                row.bin.to_string(),
                row.level_db.to_string(),
                row.affected_units.to_string(),
                row.damage_cost.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_iteration_summary(&mut self, row: &IterationSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.iteration.to_string(),
            row.vehicle_events.to_string(),
            row.activity_events.to_string(),
            row.skipped_events.to_string(),
            row.anomalies.to_string(),
            row.total_damage.to_string(),
            row.caused_total.to_string(),
            row.affected_total.to_string(),
            row.caused_events.to_string(),
            row.affected_events.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.receivers.flush()?;
        self.emissions.flush()?;
        self.immissions.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
