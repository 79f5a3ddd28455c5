//! Parquet output backend (feature `parquet`).
//!
//! Creates four files in the configured output directory:
//! - `receivers.parquet`
//! - `emissions.parquet`
//! - `immissions.parquet`
//! - `iteration_summaries.parquet`

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Builder, UInt32Builder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::OutputWriter;
use crate::{EmissionRow, ImmissionRow, IterationSummaryRow, OutputResult, ReceiverRow};

fn receiver_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("receiver_id",    DataType::UInt32,  false),
        Field::new("x",              DataType::Float64, false),
        Field::new("y",              DataType::Float64, false),
        Field::new("relevant_links", DataType::UInt32,  false),
    ]))
}

fn emission_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("iteration", DataType::UInt32,  false),
        Field::new("link_id",   DataType::UInt32,  false),
        Field::new("bin",       DataType::UInt32,  false),
        Field::new("vehicles",  DataType::UInt32,  false),
        Field::new("hgv_share", DataType::Float64, false),
        Field::new("level_db",  DataType::Float64, false),
    ]))
}

fn immission_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("iteration",      DataType::UInt32,  false),
        Field::new("receiver_id",    DataType::UInt32,  false),
        Field::new("bin",            DataType::UInt32,  false),
        Field::new("level_db",       DataType::Float64, false),
        Field::new("affected_units", DataType::Float64, false),
        Field::new("damage_cost",    DataType::Float64, false),
    ]))
}

fn summary_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("iteration",       DataType::UInt32,  false),
        Field::new("vehicle_events",  DataType::UInt64,  false),
        Field::new("activity_events", DataType::UInt64,  false),
        Field::new("skipped_events",  DataType::UInt64,  false),
        Field::new("anomalies",       DataType::UInt64,  false),
        Field::new("total_damage",    DataType::Float64, false),
        Field::new("caused_total",    DataType::Float64, false),
        Field::new("affected_total",  DataType::Float64, false),
        Field::new("caused_events",   DataType::UInt64,  false),
        Field::new("affected_events", DataType::UInt64,  false),
    ]))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// One Parquet file and its schema.  `None` after `finish`.
struct Table {
    writer: Option<ArrowWriter<File>>,
    schema: Arc<Schema>,
}

impl Table {
    fn create(path: &Path, schema: Arc<Schema>) -> OutputResult<Self> {
        let file = File::create(path)?;
        let writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(snappy_props()))?;
        Ok(Self { writer: Some(writer), schema })
    }

    fn write(&mut self, columns: Vec<ArrayRef>) -> OutputResult<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let batch = RecordBatch::try_new(Arc::clone(&self.schema), columns)?;
        writer.write(&batch)?;
        Ok(())
    }

    fn close(&mut self) -> OutputResult<()> {
        if let Some(w) = self.writer.take() {
            w.close()?;
        }
        Ok(())
    }
}

/// Writes pipeline statistics to four Parquet files.
///
/// `finish()` **must** be called to write the Parquet file footers; files
/// written without calling `finish()` cannot be opened by Parquet readers.
pub struct ParquetWriter {
    receivers:  Table,
    emissions:  Table,
    immissions: Table,
    summaries:  Table,
}

impl ParquetWriter {
    /// Create all Parquet files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Ok(Self {
            receivers:  Table::create(&dir.join("receivers.parquet"), receiver_schema())?,
            emissions:  Table::create(&dir.join("emissions.parquet"), emission_schema())?,
            immissions: Table::create(&dir.join("immissions.parquet"), immission_schema())?,
            summaries:  Table::create(&dir.join("iteration_summaries.parquet"), summary_schema())?,
        })
    }
}

impl OutputWriter for ParquetWriter {
    fn write_receivers(&mut self, rows: &[ReceiverRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut ids   = UInt32Builder::new();
        let mut xs    = Float64Builder::new();
        let mut ys    = Float64Builder::new();
        let mut links = UInt32Builder::new();
        for row in rows {
            ids.append_value(row.receiver_id);
            xs.append_value(row.x);
            ys.append_value(row.y);
            links.append_value(row.relevant_links);
        }
        self.receivers.write(vec![
            Arc::new(ids.finish()),
            Arc::new(xs.finish()),
            Arc::new(ys.finish()),
            Arc::new(links.finish()),
        ])
    }

    fn write_emissions(&mut self, rows: &[EmissionRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut iterations = UInt32Builder::new();
        let mut links      = UInt32Builder::new();
        let mut bins       = UInt32Builder::new();
        let mut vehicles   = UInt32Builder::new();
        let mut shares     = Float64Builder::new();
        let mut levels     = Float64Builder::new();
        for row in rows {
            iterations.append_value(row.iteration);
            links.append_value(row.link_id);
            bins.append_value(row.bin);
            vehicles.append_value(row.vehicles);
            shares.append_value(row.hgv_share);
            levels.append_value(row.level_db);
        }
        self.emissions.write(vec![
            Arc::new(iterations.finish()),
            Arc::new(links.finish()),
            Arc::new(bins.finish()),
            Arc::new(vehicles.finish()),
            Arc::new(shares.finish()),
            Arc::new(levels.finish()),
        ])
    }

    fn write_immissions(&mut self, rows: &[ImmissionRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut iterations = UInt32Builder::new();
        let mut receivers  = UInt32Builder::new();
        let mut bins       = UInt32Builder::new();
        let mut levels     = Float64Builder::new();
        let mut units      = Float64Builder::new();
        let mut costs      = Float64Builder::new();
        for row in rows {
            iterations.append_value(row.iteration);
            receivers.append_value(row.receiver_id);
            bins.append_value(row.bin);
            levels.append_value(row.level_db);
            units.append_value(row.affected_units);
            costs.append_value(row.damage_cost);
        }
        self.immissions.write(vec![
            Arc::new(iterations.finish()),
            Arc::new(receivers.finish()),
            Arc::new(bins.finish()),
            Arc::new(levels.finish()),
            Arc::new(units.finish()),
            Arc::new(costs.finish()),
        ])
    }

    fn write_iteration_summary(&mut self, row: &IterationSummaryRow) -> OutputResult<()> {
        let u64_col = |v: u64| -> ArrayRef {
            let mut b = UInt64Builder::new();
            b.append_value(v);
            Arc::new(b.finish())
        };
        let f64_col = |v: f64| -> ArrayRef {
            let mut b = Float64Builder::new();
            b.append_value(v);
            Arc::new(b.finish())
        };
        let mut iteration = UInt32Builder::new();
        iteration.append_value(row.iteration);

        self.summaries.write(vec![
            Arc::new(iteration.finish()),
            u64_col(row.vehicle_events),
            u64_col(row.activity_events),
            u64_col(row.skipped_events),
            u64_col(row.anomalies),
            f64_col(row.total_damage),
            f64_col(row.caused_total),
            f64_col(row.affected_total),
            u64_col(row.caused_events),
            u64_col(row.affected_events),
        ])
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.receivers.close()?;
        self.emissions.close()?;
        self.immissions.close()?;
        self.summaries.close()?;
        Ok(())
    }
}
