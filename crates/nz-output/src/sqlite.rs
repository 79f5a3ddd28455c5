//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! four tables: `receivers`, `emissions`, `immissions` and
//! `iteration_summaries`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{EmissionRow, ImmissionRow, IterationSummaryRow, OutputResult, ReceiverRow};

/// Writes pipeline statistics to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS receivers (
                 receiver_id    INTEGER PRIMARY KEY,
                 x              REAL    NOT NULL,
                 y              REAL    NOT NULL,
                 relevant_links INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS emissions (
                 iteration INTEGER NOT NULL,
                 link_id   INTEGER NOT NULL,
                 bin       INTEGER NOT NULL,
                 vehicles  INTEGER NOT NULL,
                 hgv_share REAL    NOT NULL,
                 level_db  REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS immissions (
                 iteration      INTEGER NOT NULL,
                 receiver_id    INTEGER NOT NULL,
                 bin            INTEGER NOT NULL,
                 level_db       REAL    NOT NULL,
                 affected_units REAL    NOT NULL,
                 damage_cost    REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS iteration_summaries (
                 iteration       INTEGER PRIMARY KEY,
                 vehicle_events  INTEGER NOT NULL,
                 activity_events INTEGER NOT NULL,
                 skipped_events  INTEGER NOT NULL,
                 anomalies       INTEGER NOT NULL,
                 total_damage    REAL    NOT NULL,
                 caused_total    REAL    NOT NULL,
                 affected_total  REAL    NOT NULL,
                 caused_events   INTEGER NOT NULL,
                 affected_events INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_receivers(&mut self, rows: &[ReceiverRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO receivers (receiver_id, x, y, relevant_links) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![row.receiver_id, row.x, row.y, row.relevant_links])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_emissions(&mut self, rows: &[EmissionRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO emissions \
                 (iteration, link_id, bin, vehicles, hgv_share, level_db) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.iteration,
                    row.link_id,
                    row.bin,
                    row.vehicles,
                    row.hgv_share,
                    row.level_db,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_immissions(&mut self, rows: &[ImmissionRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO immissions \
                 (iteration, receiver_id, bin, level_db, affected_units, damage_cost) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.iteration,
                    row.receiver_id,
                    row.bin,
                    row.level_db,
                    row.affected_units,
                    row.damage_cost,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_iteration_summary(&mut self, row: &IterationSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO iteration_summaries \
             (iteration, vehicle_events, activity_events, skipped_events, anomalies, \
              total_damage, caused_total, affected_total, caused_events, affected_events) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                row.iteration,
                row.vehicle_events,
                row.activity_events,
                row.skipped_events,
                row.anomalies,
                row.total_damage,
                row.caused_total,
                row.affected_total,
                row.caused_events,
                row.affected_events,
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
