//! `nz-output` — statistics writers for the rust_noise pipeline.
//!
//! Three backends are provided behind Cargo features:
//!
//! | Feature   | Backend | Files created                                                          |
//! |-----------|---------|------------------------------------------------------------------------|
//! | *(none)*  | CSV     | `receivers.csv`, `emissions.csv`, `immissions.csv`, `iteration_summaries.csv` |
//! | `sqlite`  | SQLite  | `output.db`                                                            |
//! | `parquet` | Parquet | one `.parquet` file per CSV file above                                 |
//!
//! All backends implement [`OutputWriter`] and are driven by
//! [`StatsObserver`], which implements `nz_pipeline::PipelineObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use nz_output::{CsvWriter, StatsObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = StatsObserver::new(writer);
//! pipeline.startup(&mut obs)?;
//! pipeline.run_iteration(0, &events, &mut sink, &mut obs)?;
//! obs.finish();
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::StatsObserver;
pub use row::{EmissionRow, ImmissionRow, IterationSummaryRow, ReceiverRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
