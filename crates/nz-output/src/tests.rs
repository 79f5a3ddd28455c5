//! Integration tests for nz-output.

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv::CsvWriter;
    use crate::row::{EmissionRow, ImmissionRow, IterationSummaryRow, ReceiverRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn headers(dir: &TempDir, file: &str) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    fn records(dir: &TempDir, file: &str) -> Vec<csv::StringRecord> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.records().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        for f in ["receivers.csv", "emissions.csv", "immissions.csv", "iteration_summaries.csv"] {
            assert!(dir.path().join(f).exists(), "{f} missing");
        }
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        assert_eq!(headers(&dir, "receivers.csv"), ["receiver_id", "x", "y", "relevant_links"]);
        assert_eq!(
            headers(&dir, "emissions.csv"),
            ["iteration", "link_id", "bin", "vehicles", "hgv_share", "level_db"]
        );
        assert_eq!(
            headers(&dir, "immissions.csv"),
            ["iteration", "receiver_id", "bin", "level_db", "affected_units", "damage_cost"]
        );
        assert_eq!(headers(&dir, "iteration_summaries.csv").len(), 10);
    }

    #[test]
    fn csv_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_receivers(&[
            ReceiverRow { receiver_id: 0, x: 50.0, y: 50.0, relevant_links: 2 },
            ReceiverRow { receiver_id: 1, x: 150.0, y: 50.0, relevant_links: 0 },
        ])
        .unwrap();
        w.write_emissions(&[EmissionRow {
            iteration: 2, link_id: 7, bin: 8, vehicles: 12, hgv_share: 0.25, level_db: 61.5,
        }])
        .unwrap();
        w.write_immissions(&[ImmissionRow {
            iteration: 2, receiver_id: 0, bin: 8, level_db: 55.0, affected_units: 3.0, damage_cost: 0.5,
        }])
        .unwrap();
        w.finish().unwrap();

        let receivers = records(&dir, "receivers.csv");
        assert_eq!(receivers.len(), 2);
        assert_eq!(&receivers[1][0], "1");
        assert_eq!(&receivers[1][3], "0");

        let emissions = records(&dir, "emissions.csv");
        assert_eq!(emissions.len(), 1);
        assert_eq!(&emissions[0][1], "7");  // link_id
        assert_eq!(&emissions[0][4], "0.25");
        assert_eq!(&emissions[0][5], "61.5");

        let immissions = records(&dir, "immissions.csv");
        assert_eq!(&immissions[0][4], "3");
        assert_eq!(&immissions[0][5], "0.5");
    }

    #[test]
    fn csv_iteration_summary() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_iteration_summary(&IterationSummaryRow {
            iteration:       4,
            vehicle_events:  100,
            activity_events: 20,
            skipped_events:  3,
            anomalies:       1,
            total_damage:    2.5,
            caused_total:    2.5,
            affected_total:  2.5,
            caused_events:   40,
            affected_events: 9,
        })
        .unwrap();
        w.finish().unwrap();

        let rows = records(&dir, "iteration_summaries.csv");
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "4");
        assert_eq!(&rows[0][1], "100");
        assert_eq!(&rows[0][5], "2.5");
        assert_eq!(&rows[0][9], "9");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn csv_empty_batches_ok() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_emissions(&[]).unwrap();
        w.write_immissions(&[]).unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tmp();
        assert!(CsvWriter::new(&dir.path().join("nope")).is_err());
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use tempfile::TempDir;

    use nz_core::{Coord, LinkId, LocationId, NoiseConfig, PersonId, SimTime, VehicleClass, VehicleId};
    use nz_events::{ActivityEvent, CostCollector, SimEvent, VehicleMoved};
    use nz_pipeline::{NoisePipeline, PipelineBuilder};
    use nz_spatial::{LocationRegistry, NetworkBuilder};

    use crate::csv::CsvWriter;
    use crate::observer::StatsObserver;
    use crate::row::{EmissionRow, ImmissionRow, IterationSummaryRow, ReceiverRow};
    use crate::writer::OutputWriter;
    use crate::{OutputError, OutputResult};

    const CONFIG: &str = r#"
        [time]
        bin_width_secs = 3600
        horizon_secs   = 86400

        [grid]
        receiver_gap_m   = 100.0
        hearing_radius_m = 100.0

        [emission]
        silence_floor_db = 0.0

        [attenuation]
        reference_db       = 15.8
        log_coefficient    = 10.0
        linear_coefficient = 0.0142
        linear_exponent    = 0.9
        min_distance_m     = 5.0

        [damage]
        audibility_threshold_db = 0.0
        annual_cost_rate        = 63.3
        loudness_doubling_db    = 10.0
        periods = [
          { name = "day",   start_hour = 6,  end_hour = 22, threshold_db = 30.0 },
          { name = "night", start_hour = 22, end_hour = 6,  threshold_db = 25.0 },
        ]

        [activity]
        considered = ["home"]
        weights    = { home = 1.0 }
    "#;

    fn pipeline() -> NoisePipeline {
        let mut b = NetworkBuilder::new();
        b.add_road(LinkId(1), LinkId(2), Coord::new(0.0, 0.0), Coord::new(200.0, 0.0));
        let locations: LocationRegistry = [(LocationId(1), Coord::new(100.0, 5.0))].into_iter().collect();
        PipelineBuilder::new(NoiseConfig::from_toml_str(CONFIG).unwrap(), b.build().unwrap(), locations)
            .receivers(vec![Coord::new(100.0, 10.0), Coord::new(100.0, 90.0)])
            .build()
            .unwrap()
    }

    fn events() -> Vec<SimEvent> {
        let home = |h| ActivityEvent {
            person:        PersonId(1),
            location:      LocationId(1),
            activity_type: "home".into(),
            time:          SimTime::hms(h, 0, 0),
        };
        let mut events = vec![SimEvent::ActivityEnded(home(7))];
        for v in 0..20 {
            events.push(SimEvent::VehicleMoved(VehicleMoved {
                link:      LinkId(1 + v % 2),
                vehicle:   VehicleId(v),
                time:      SimTime::hms(6, v as u64, 0),
                speed_mps: 13.9,
                class:     if v % 5 == 0 { VehicleClass::Hgv } else { VehicleClass::Car },
            }));
        }
        events
    }

    fn row_count(dir: &TempDir, file: &str) -> usize {
        csv::Reader::from_path(dir.path().join(file)).unwrap().records().count()
    }

    #[test]
    fn integration_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut obs = StatsObserver::new(CsvWriter::new(dir.path()).unwrap());
        let mut p = pipeline();
        p.startup(&mut obs).unwrap();

        let mut sink = CostCollector::new();
        for it in 0..2 {
            p.run_iteration(it, &events(), &mut sink, &mut obs).unwrap();
        }
        obs.finish();
        assert!(obs.take_error().is_none(), "no write errors expected");

        assert_eq!(row_count(&dir, "receivers.csv"), 2);
        // Both links carry traffic in bin 6.
        assert_eq!(row_count(&dir, "emissions.csv"), 2 * 2);
        // 2 receivers × 24 bins × 2 iterations.
        assert_eq!(row_count(&dir, "immissions.csv"), 2 * 24 * 2);
        assert_eq!(row_count(&dir, "iteration_summaries.csv"), 2);

        let mut rdr = csv::Reader::from_path(dir.path().join("iteration_summaries.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[1][0], "1");
        assert_eq!(&rows[1][1], "20");
        let damage: f64 = rows[1][5].parse().unwrap();
        assert!(damage > 0.0);
    }

    /// Fails every write after the first.
    #[derive(Default)]
    struct Flaky {
        writes:   usize,
        finished: usize,
    }

    impl Flaky {
        fn tick(&mut self) -> OutputResult<()> {
            self.writes += 1;
            if self.writes > 1 {
                Err(OutputError::Io(std::io::Error::other(format!("write {}", self.writes))))
            } else {
                Ok(())
            }
        }
    }

    impl OutputWriter for Flaky {
        fn write_receivers(&mut self, _rows: &[ReceiverRow]) -> OutputResult<()> {
            self.tick()
        }
        fn write_emissions(&mut self, _rows: &[EmissionRow]) -> OutputResult<()> {
            self.tick()
        }
        fn write_immissions(&mut self, _rows: &[ImmissionRow]) -> OutputResult<()> {
            self.tick()
        }
        fn write_iteration_summary(&mut self, _row: &IterationSummaryRow) -> OutputResult<()> {
            self.tick()
        }
        fn finish(&mut self) -> OutputResult<()> {
            self.finished += 1;
            Ok(())
        }
    }

    #[test]
    fn first_error_is_kept() {
        let mut obs = StatsObserver::new(Flaky::default());
        let mut p = pipeline();
        p.startup(&mut obs).unwrap();
        p.run_iteration(0, &events(), &mut CostCollector::new(), &mut obs).unwrap();
        obs.finish();

        let err = obs.take_error().expect("stored error");
        assert!(err.to_string().contains("write 2"), "got {err}");
        assert!(obs.take_error().is_none());

        let writer = obs.into_writer();
        assert_eq!(writer.writes, 4);
        assert_eq!(writer.finished, 1);
    }
}

// ── SQLite tests ──────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use tempfile::TempDir;

    use crate::row::{EmissionRow, ImmissionRow, IterationSummaryRow, ReceiverRow};
    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn open(dir: &TempDir) -> rusqlite::Connection {
        rusqlite::Connection::open(dir.path().join("output.db")).unwrap()
    }

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("output.db").exists());
    }

    #[test]
    fn sqlite_row_counts() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_receivers(&[
            ReceiverRow { receiver_id: 0, x: 0.0, y: 0.0, relevant_links: 1 },
            ReceiverRow { receiver_id: 1, x: 100.0, y: 0.0, relevant_links: 3 },
        ])
        .unwrap();
        w.write_emissions(&[
            EmissionRow { iteration: 0, link_id: 1, bin: 7, vehicles: 3, hgv_share: 0.0, level_db: 50.0 },
            EmissionRow { iteration: 0, link_id: 2, bin: 7, vehicles: 1, hgv_share: 1.0, level_db: 55.0 },
            EmissionRow { iteration: 0, link_id: 1, bin: 8, vehicles: 2, hgv_share: 0.5, level_db: 52.0 },
        ])
        .unwrap();
        w.finish().unwrap();

        let conn = open(&dir);
        let receivers: i64 = conn.query_row("SELECT COUNT(*) FROM receivers", [], |r| r.get(0)).unwrap();
        let emissions: i64 = conn.query_row("SELECT COUNT(*) FROM emissions", [], |r| r.get(0)).unwrap();
        assert_eq!(receivers, 2);
        assert_eq!(emissions, 3);
    }

    #[test]
    fn sqlite_immission_values() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_immissions(&[ImmissionRow {
            iteration: 1, receiver_id: 4, bin: 22, level_db: 48.5, affected_units: 2.0, damage_cost: 0.75,
        }])
        .unwrap();
        w.finish().unwrap();

        let (level, cost): (f64, f64) = open(&dir)
            .query_row(
                "SELECT level_db, damage_cost FROM immissions WHERE receiver_id = 4 AND bin = 22",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(level, 48.5);
        assert_eq!(cost, 0.75);
    }

    #[test]
    fn sqlite_iteration_summary() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_iteration_summary(&IterationSummaryRow {
            iteration:       7,
            vehicle_events:  1_000,
            activity_events: 200,
            skipped_events:  5,
            anomalies:       2,
            total_damage:    12.5,
            caused_total:    12.5,
            affected_total:  12.5,
            caused_events:   400,
            affected_events: 60,
        })
        .unwrap();
        w.finish().unwrap();

        let (vehicles, damage): (i64, f64) = open(&dir)
            .query_row(
                "SELECT vehicle_events, total_damage FROM iteration_summaries WHERE iteration = 7",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(vehicles, 1_000);
        assert_eq!(damage, 12.5);
    }
}

// ── Parquet tests ─────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "parquet"))]
mod parquet_tests {
    use tempfile::TempDir;

    use arrow::datatypes::DataType;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    use crate::parquet::ParquetWriter;
    use crate::row::{EmissionRow, IterationSummaryRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn emission(link_id: u32) -> EmissionRow {
        EmissionRow { iteration: 0, link_id, bin: 8, vehicles: 4, hgv_share: 0.25, level_db: 58.0 }
    }

    #[test]
    fn parquet_files_created() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        for f in ["receivers.parquet", "emissions.parquet", "immissions.parquet", "iteration_summaries.parquet"] {
            assert!(dir.path().join(f).exists(), "{f} missing");
        }
    }

    #[test]
    fn parquet_emission_rows() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.write_emissions(&[emission(1), emission(2)]).unwrap();
        w.finish().unwrap();

        let file = std::fs::File::open(dir.path().join("emissions.parquet")).unwrap();
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
        let schema = builder.schema().clone();
        let total_rows: usize = builder.build().unwrap().map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(total_rows, 2);

        let field_names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(field_names, ["iteration", "link_id", "bin", "vehicles", "hgv_share", "level_db"]);
        assert_eq!(*schema.field_with_name("level_db").unwrap().data_type(), DataType::Float64);
    }

    #[test]
    fn parquet_summary_rows() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        for iteration in 0..3 {
            w.write_iteration_summary(&IterationSummaryRow {
                iteration,
                vehicle_events:  10,
                activity_events: 4,
                skipped_events:  0,
                anomalies:       0,
                total_damage:    1.0,
                caused_total:    1.0,
                affected_total:  1.0,
                caused_events:   10,
                affected_events: 2,
            })
            .unwrap();
        }
        w.finish().unwrap();

        let file = std::fs::File::open(dir.path().join("iteration_summaries.parquet")).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file).unwrap().build().unwrap();
        let total_rows: usize = reader.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(total_rows, 3);
    }

    #[test]
    fn parquet_finish_required() {
        let dir = tmp();
        {
            let mut w = ParquetWriter::new(dir.path()).unwrap();
            w.write_emissions(&[emission(1)]).unwrap();
            // Dropped without finish(): no footer.
        }

        let file = std::fs::File::open(dir.path().join("emissions.parquet")).unwrap();
        assert!(ParquetRecordBatchReaderBuilder::try_new(file).is_err());
    }
}
