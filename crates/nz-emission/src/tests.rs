//! Unit tests for nz-emission.

use nz_core::config::EmissionConfig;
use nz_core::{AnomalyKind, BinClock, LinkId, SimTime, TimeBin, VehicleClass, VehicleId};
use nz_events::VehicleMoved;

use crate::{EmissionAggregator, EmissionModel, Rls90, TrafficSample};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn emission_config(scale_factor: f64) -> EmissionConfig {
    EmissionConfig {
        silence_floor_db:  0.0,
        scale_factor,
        min_speed_kmh:     30.0,
        max_car_speed_kmh: 130.0,
        max_hgv_speed_kmh: 80.0,
    }
}

fn rls90() -> Rls90 {
    Rls90::from_config(&emission_config(1.0)).unwrap()
}

/// 15-minute bins over 24 h.
fn aggregator(scale_factor: f64) -> EmissionAggregator {
    EmissionAggregator::new(BinClock::new(900, 86_400), emission_config(scale_factor))
}

fn moved(link: u32, vehicle: u32, time: SimTime, speed_kmh: f64, class: VehicleClass) -> VehicleMoved {
    VehicleMoved {
        link: LinkId(link),
        vehicle: VehicleId(vehicle),
        time,
        speed_mps: speed_kmh / 3.6,
        class,
    }
}

/// Always returns the same level.
struct Constant(f64);

impl EmissionModel for Constant {
    fn level(&self, _traffic: &TrafficSample) -> f64 {
        self.0
    }
}

// ── Rls90 ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod rls90_model {
    use super::*;

    fn cars_only(volume: f64, speed: f64) -> TrafficSample {
        TrafficSample { hourly_volume: volume, hgv_share: 0.0, car_speed_kmh: speed, hgv_speed_kmh: speed }
    }

    #[test]
    fn reference_value_for_cars_at_100_kmh() {
        // Lm25 = 37.3 + 30, Lcar = 27.7 + 10·log10(9), Dv = Lcar − 37.3.
        let expected = 37.3 + 30.0 + (27.7 + 10.0 * 9f64.log10() - 37.3);
        let got = rls90().level(&cars_only(1_000.0, 100.0));
        assert!((got - expected).abs() < 1e-9, "got {got}, expected {expected}");
        assert!((got - 67.2424).abs() < 1e-3);
    }

    #[test]
    fn doubling_volume_adds_three_db() {
        let m = rls90();
        let a = m.level(&cars_only(500.0, 50.0));
        let b = m.level(&cars_only(1_000.0, 50.0));
        assert!((b - a - 10.0 * 2f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn speeds_are_clamped() {
        let m = rls90();
        assert_eq!(m.car_level(10.0), m.car_level(30.0));
        assert_eq!(m.car_level(200.0), m.car_level(130.0));
        assert_eq!(m.hgv_level(120.0), m.hgv_level(80.0));
    }

    #[test]
    fn heavy_traffic_is_louder() {
        let m = rls90();
        let cars = m.level(&cars_only(600.0, 50.0));
        let mixed = m.level(&TrafficSample { hgv_share: 0.2, ..cars_only(600.0, 50.0) });
        assert!(mixed > cars);
    }

    #[test]
    fn zero_volume_is_negative_infinity() {
        assert_eq!(rls90().level(&cars_only(0.0, 50.0)), f64::NEG_INFINITY);
    }

    #[test]
    fn single_hgv_louder_than_single_car() {
        let m = rls90();
        let car = m.single_vehicle_level(VehicleClass::Car, 50.0, 4.0);
        let hgv = m.single_vehicle_level(VehicleClass::Hgv, 50.0, 4.0);
        assert!(hgv > car);
    }

    #[test]
    fn rejects_inverted_clamps() {
        assert!(Rls90::new(50.0, 30.0, 80.0).is_err());
        assert!(Rls90::new(0.0, 130.0, 80.0).is_err());
    }
}

// ── EmissionAggregator ────────────────────────────────────────────────────────

#[cfg(test)]
mod aggregation {
    use super::*;

    #[test]
    fn counts_per_link_and_bin() {
        let mut agg = aggregator(1.0);
        agg.record_vehicle_event(&moved(1, 0, SimTime::hms(8, 0, 0), 50.0, VehicleClass::Car), 0);
        agg.record_vehicle_event(&moved(1, 1, SimTime::hms(8, 5, 0), 60.0, VehicleClass::Hgv), 1);
        agg.record_vehicle_event(&moved(1, 2, SimTime::hms(8, 20, 0), 50.0, VehicleClass::Car), 2);
        agg.record_vehicle_event(&moved(2, 3, SimTime::hms(8, 0, 0), 50.0, VehicleClass::Car), 3);

        assert_eq!(agg.link_bin_count(), 3);
        assert_eq!(agg.passage_count(), 4);

        let levels = agg.compute_emission_levels(&rls90());
        let first = levels.get(LinkId(1), TimeBin(32)).unwrap();
        assert_eq!((first.cars, first.hgvs), (1, 1));
        assert!((first.hgv_share - 0.5).abs() < 1e-12);
        assert_eq!(first.car_speed_kmh.map(|v| v.round()), Some(50.0));
        assert_eq!(first.hgv_speed_kmh.map(|v| v.round()), Some(60.0));
        assert_eq!(levels.get(LinkId(1), TimeBin(33)).unwrap().vehicles(), 1);
    }

    #[test]
    fn hourly_volume_is_scaled() {
        // One car in a 15-minute bin with a 10 % sample → 40 veh/h.
        let mut agg = aggregator(10.0);
        agg.record_vehicle_event(&moved(1, 0, SimTime::hms(8, 15, 0), 50.0, VehicleClass::Car), 0);
        let levels = agg.compute_emission_levels(&rls90());
        let rec = levels.get(LinkId(1), TimeBin(33)).unwrap();
        assert!((rec.hourly_volume - 40.0).abs() < 1e-9);
        assert!((agg.unit_volume() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn absent_links_read_as_silence_floor() {
        let agg = aggregator(1.0);
        let levels = agg.compute_emission_levels(&rls90());
        assert!(levels.is_empty());
        assert_eq!(levels.level_db(LinkId(7), TimeBin(3)), 0.0);
    }

    #[test]
    fn levels_are_raised_to_the_floor() {
        let mut agg = aggregator(1.0);
        agg.record_vehicle_event(&moved(1, 0, SimTime::hms(1, 0, 0), 50.0, VehicleClass::Car), 0);
        let levels = agg.compute_emission_levels(&Constant(-20.0));
        assert_eq!(levels.level_db(LinkId(1), TimeBin(4)), 0.0);
        let levels = agg.compute_emission_levels(&Constant(f64::NAN));
        assert_eq!(levels.level_db(LinkId(1), TimeBin(4)), 0.0);
    }

    #[test]
    fn recomputation_is_identical() {
        let mut agg = aggregator(1.0);
        for i in 0..50u32 {
            let class = if i % 7 == 0 { VehicleClass::Hgv } else { VehicleClass::Car };
            agg.record_vehicle_event(&moved(i % 5, i, SimTime(i as u64 * 97), 40.0 + i as f64, class), i as u64);
        }
        let a = agg.compute_emission_levels(&rls90());
        let b = agg.compute_emission_levels(&rls90());
        assert_eq!(a, b);
    }

    #[test]
    fn passages_carry_sequence_order_and_energy() {
        let mut agg = aggregator(1.0);
        agg.record_vehicle_event(&moved(1, 9, SimTime(60), 50.0, VehicleClass::Hgv), 4);
        agg.record_vehicle_event(&moved(1, 8, SimTime(60), 50.0, VehicleClass::Car), 5);
        let levels = agg.compute_emission_levels(&rls90());
        let rec = levels.get(LinkId(1), TimeBin(0)).unwrap();
        let seqs: Vec<u64> = rec.passages.iter().map(|p| p.seq).collect();
        assert_eq!(seqs, vec![4, 5]);
        assert!(rec.passages.iter().all(|p| p.energy > 0.0));
        assert!(rec.passages[0].energy > rec.passages[1].energy);
        assert!((rec.total_energy() - rec.passages[0].energy - rec.passages[1].energy).abs() < 1e-9);
    }

    #[test]
    fn reset_drops_everything() {
        let mut agg = aggregator(1.0);
        agg.record_vehicle_event(&moved(1, 0, SimTime(10), 50.0, VehicleClass::Car), 0);
        agg.record_vehicle_event(&moved(1, 0, SimTime(10), -1.0, VehicleClass::Car), 1);
        assert!(!agg.is_reset());
        agg.reset();
        assert!(agg.is_reset());
        assert!(agg.compute_emission_levels(&rls90()).is_empty());
    }
}

// ── Anomalies ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod anomalies {
    use super::*;

    #[test]
    fn invalid_speed_is_skipped() {
        let mut agg = aggregator(1.0);
        assert!(!agg.record_vehicle_event(&moved(1, 0, SimTime(10), -5.0, VehicleClass::Car), 0));
        let mut nan = moved(1, 0, SimTime(10), 0.0, VehicleClass::Car);
        nan.speed_mps = f64::NAN;
        assert!(!agg.record_vehicle_event(&nan, 1));
        assert_eq!(agg.anomalies().count(AnomalyKind::InvalidSpeed), 2);
        assert_eq!(agg.passage_count(), 0);
    }

    #[test]
    fn events_after_horizon_are_skipped() {
        let mut agg = EmissionAggregator::new(BinClock::new(3_600, 7_200), emission_config(1.0));
        assert!(agg.record_vehicle_event(&moved(1, 0, SimTime(7_199), 50.0, VehicleClass::Car), 0));
        assert!(!agg.record_vehicle_event(&moved(1, 0, SimTime(7_200), 50.0, VehicleClass::Car), 1));
        assert_eq!(agg.anomalies().count(AnomalyKind::AfterHorizon), 1);
    }

    #[test]
    fn unknown_links_are_skipped_when_known_set_is_given() {
        let mut agg = aggregator(1.0).with_known_links([LinkId(2), LinkId(1)]);
        assert!(agg.record_vehicle_event(&moved(1, 0, SimTime(0), 50.0, VehicleClass::Car), 0));
        assert!(!agg.record_vehicle_event(&moved(3, 0, SimTime(0), 50.0, VehicleClass::Car), 1));
        assert_eq!(agg.anomalies().count(AnomalyKind::UnknownLink), 1);
    }

    #[test]
    fn zero_speed_is_valid() {
        let mut agg = aggregator(1.0);
        assert!(agg.record_vehicle_event(&moved(1, 0, SimTime(0), 0.0, VehicleClass::Car), 0));
    }
}

// ── Properties ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn rls90_is_monotone_in_volume(
            volume in 1.0f64..5_000.0,
            extra  in 0.1f64..5_000.0,
            share  in 0.0f64..1.0,
            speed  in 20.0f64..150.0,
        ) {
            let m = rls90();
            let s = TrafficSample { hourly_volume: volume, hgv_share: share, car_speed_kmh: speed, hgv_speed_kmh: speed };
            let more = TrafficSample { hourly_volume: volume + extra, ..s };
            prop_assert!(m.level(&more) > m.level(&s));
        }

        #[test]
        fn levels_never_below_floor(speeds in proptest::collection::vec(0.0f64..200.0, 1..30)) {
            let mut agg = aggregator(1.0);
            for (i, v) in speeds.iter().enumerate() {
                agg.record_vehicle_event(&moved(1, i as u32, SimTime(i as u64 * 10), *v, VehicleClass::Car), i as u64);
            }
            let levels = agg.compute_emission_levels(&rls90());
            for rec in levels.iter() {
                prop_assert!(rec.level_db >= levels.silence_floor_db());
            }
        }
    }
}
