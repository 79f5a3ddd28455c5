//! Unit tests for nz-damage.

use nz_core::config::{DamageConfig, EmissionConfig, ValuationPeriod};
use nz_core::{BinClock, Coord, LinkId, PersonId, ReceiverId, SimTime, TimeBin, VehicleClass, VehicleId};
use nz_emission::{EmissionAggregator, EmissionLevels, EmissionModel, Rls90, TrafficSample};
use nz_events::{CostCollector, CostFlow, Party, VehicleMoved};
use nz_immission::{AttenuationModel, calculate_noise_immission};
use nz_spatial::{NetworkBuilder, PresenceRecord, ReceiverGrid, RelevantLink};

use crate::{DamageError, DoseResponse, PeriodDoseResponse, calculate_noise_damage_costs, validate_dose_response};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn clock() -> BinClock {
    BinClock::new(3_600, 86_400)
}

fn period(name: &str, start_hour: u32, end_hour: u32, threshold_db: f64) -> ValuationPeriod {
    ValuationPeriod { name: name.into(), start_hour, end_hour, threshold_db }
}

/// One currency unit per person per day at the threshold.
fn damage_config(audibility_threshold_db: f64) -> DamageConfig {
    DamageConfig {
        audibility_threshold_db,
        annual_cost_rate:     365.0,
        loudness_doubling_db: 10.0,
        periods:              vec![period("day", 6, 22, 50.0), period("night", 22, 6, 40.0)],
    }
}

fn dose() -> PeriodDoseResponse {
    PeriodDoseResponse::from_config(&damage_config(0.0)).unwrap()
}

struct Constant(f64);

impl EmissionModel for Constant {
    fn level(&self, _traffic: &TrafficSample) -> f64 {
        self.0
    }
}

struct Transparent;

impl AttenuationModel for Transparent {
    fn attenuation_db(&self, _link: &RelevantLink) -> f64 {
        0.0
    }
}

/// Links 1 and 2 (both directions of one road) pass receiver 0; receiver 1
/// is out of range.  Every passage is `(link, vehicle, hour, class)`.
fn scenario(passages: &[(u32, u32, u64, VehicleClass)], model: &dyn EmissionModel) -> (ReceiverGrid, EmissionLevels) {
    let mut b = NetworkBuilder::new();
    b.add_road(LinkId(1), LinkId(2), Coord::new(0.0, 0.0), Coord::new(1_000.0, 0.0));
    let net = b.build().unwrap();
    let mut grid =
        ReceiverGrid::from_points(&net, vec![Coord::new(500.0, 20.0), Coord::new(500.0, 5_000.0)], 200.0).unwrap();

    let config = EmissionConfig {
        silence_floor_db:  0.0,
        scale_factor:      1.0,
        min_speed_kmh:     30.0,
        max_car_speed_kmh: 130.0,
        max_hgv_speed_kmh: 80.0,
    };
    let mut agg = EmissionAggregator::new(clock(), config);
    for (seq, &(link, vehicle, hour, class)) in passages.iter().enumerate() {
        agg.record_vehicle_event(
            &VehicleMoved {
                link: LinkId(link),
                vehicle: VehicleId(vehicle),
                time: SimTime::hms(hour, 10 + seq as u64, 0),
                speed_mps: 13.9,
                class,
            },
            seq as u64,
        );
    }
    let levels = agg.compute_emission_levels(model);
    calculate_noise_immission(&mut grid, &levels, &Transparent, &clock());
    (grid, levels)
}

fn add_presence(grid: &mut ReceiverGrid, receiver: u32, bin: u32, people: &[(u32, f64)]) {
    let slot = grid.get_mut(ReceiverId(receiver)).unwrap().state.bin_mut(TimeBin(bin));
    for &(person, units) in people {
        slot.presence.push(PresenceRecord {
            person:         PersonId(person),
            activity_type:  "home".into(),
            duration_secs:  3_600,
            affected_units: units,
            partial:        false,
        });
        slot.affected_units += units;
    }
}

// ── Dose-response ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod dose_response {
    use super::*;

    #[test]
    fn day_period_formula() {
        // 2^((60 − 50)/10) · 1 unit · 1 h / 16 h
        let c = dose().cost(60.0, 1.0, TimeBin(8), &clock());
        assert!((c - 0.125).abs() < 1e-12);
    }

    #[test]
    fn night_period_uses_its_own_threshold() {
        // 2^((50 − 40)/10) · 1 h / 8 h
        let c = dose().cost(50.0, 1.0, TimeBin(23), &clock());
        assert!((c - 0.25).abs() < 1e-12);
        assert_eq!(dose().cost(50.0, 1.0, TimeBin(12), &clock()), 0.0);
    }

    #[test]
    fn periods_wrap_past_midnight() {
        // Bin 26 starts at 02:00 of the next day: night.
        let long = BinClock::new(3_600, 108_000);
        assert_eq!(dose().cost(50.0, 1.0, TimeBin(26), &long), dose().cost(50.0, 1.0, TimeBin(2), &long));
    }

    #[test]
    fn linear_in_units() {
        let one = dose().cost(65.0, 1.0, TimeBin(10), &clock());
        let three = dose().cost(65.0, 3.0, TimeBin(10), &clock());
        assert!((three - 3.0 * one).abs() < 1e-12);
        assert_eq!(dose().cost(65.0, 0.0, TimeBin(10), &clock()), 0.0);
    }

    #[test]
    fn validation_accepts_default_shape() {
        validate_dose_response(&dose(), &clock()).unwrap();
    }

    #[test]
    fn validation_rejects_decreasing_and_negative() {
        struct Decreasing;
        impl DoseResponse for Decreasing {
            fn cost(&self, level_db: f64, units: f64, _bin: TimeBin, _clock: &BinClock) -> f64 {
                (200.0 - level_db) * units
            }
        }
        struct Negative;
        impl DoseResponse for Negative {
            fn cost(&self, _level_db: f64, _units: f64, _bin: TimeBin, _clock: &BinClock) -> f64 {
                -1.0
            }
        }
        assert!(matches!(validate_dose_response(&Decreasing, &clock()), Err(DamageError::Config(_))));
        assert!(matches!(validate_dose_response(&Negative, &clock()), Err(DamageError::Config(_))));
    }

    #[test]
    fn invalid_periods_rejected() {
        let mut cfg = damage_config(0.0);
        cfg.periods.pop();
        assert!(matches!(PeriodDoseResponse::from_config(&cfg), Err(DamageError::Core(_))));
    }
}

// ── Valuation ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod valuation {
    use nz_events::CostOrigin;

    use super::*;

    #[test]
    fn requires_immission_first() {
        let mut b = NetworkBuilder::new();
        b.add_link(LinkId(1), Coord::new(0.0, 0.0), Coord::new(100.0, 0.0));
        let net = b.build().unwrap();
        let mut grid = ReceiverGrid::from_points(&net, vec![Coord::new(50.0, 10.0)], 100.0).unwrap();
        let levels = EmissionLevels::new(0.0);
        let mut sink = CostCollector::new();
        let err = calculate_noise_damage_costs(&mut grid, &levels, &dose(), &damage_config(0.0), &clock(), &mut sink);
        assert!(matches!(err, Err(DamageError::StageOrder { receiver: ReceiverId(0), bin: TimeBin(0) })));
        assert!(sink.events.is_empty());
    }

    #[test]
    fn affected_shares_follow_units() {
        let (mut grid, levels) = scenario(&[(1, 0, 8, VehicleClass::Car)], &Constant(60.0));
        add_presence(&mut grid, 0, 8, &[(1, 1.0), (2, 2.0), (3, 0.5)]);
        let mut sink = CostCollector::new();
        let totals =
            calculate_noise_damage_costs(&mut grid, &levels, &dose(), &damage_config(0.0), &clock(), &mut sink).unwrap();

        let expected = 0.125 * 3.5;
        assert!((totals.total_damage - expected).abs() < 1e-12);
        assert_eq!(totals.affected_events, 3);
        assert!((sink.affected_total - expected).abs() <= 1e-9 * expected);
        assert!((sink.total_for(Party::Person(PersonId(2))) - 0.125 * 2.0).abs() < 1e-12);

        let slot = grid.get(ReceiverId(0)).unwrap().state.bin(TimeBin(8)).cloned().unwrap();
        assert!((slot.damage_cost_per_unit - 0.125).abs() < 1e-12);

        let first = sink.flow(CostFlow::Affected).next().unwrap();
        assert_eq!(first.time, SimTime::hms(8, 0, 0));
        assert_eq!(first.origin, CostOrigin::Receiver { receiver: ReceiverId(0), activity_type: "home".into() });
    }

    #[test]
    fn caused_cost_split_between_links_by_energy() {
        let (mut grid, levels) =
            scenario(&[(1, 10, 8, VehicleClass::Car), (2, 11, 8, VehicleClass::Car)], &Constant(60.0));
        add_presence(&mut grid, 0, 8, &[(1, 1.0)]);
        let mut sink = CostCollector::new();
        let totals =
            calculate_noise_damage_costs(&mut grid, &levels, &dose(), &damage_config(0.0), &clock(), &mut sink).unwrap();

        let a = sink.total_for(Party::Vehicle(VehicleId(10)));
        let b = sink.total_for(Party::Vehicle(VehicleId(11)));
        assert!((a - b).abs() < 1e-12);
        assert!((a + b - totals.total_damage).abs() <= 1e-9 * totals.total_damage);
        assert_eq!(totals.caused_events, 2);
    }

    #[test]
    fn caused_cost_split_over_passages() {
        // Three vehicles an hour are only audible against the night threshold.
        let passages = [(1, 20, 23, VehicleClass::Car), (1, 21, 23, VehicleClass::Hgv), (1, 22, 23, VehicleClass::Car)];
        let (mut grid, levels) = scenario(&passages, &Rls90::new(30.0, 130.0, 80.0).unwrap());
        add_presence(&mut grid, 0, 23, &[(1, 4.0)]);
        let mut sink = CostCollector::new();
        let totals =
            calculate_noise_damage_costs(&mut grid, &levels, &dose(), &damage_config(0.0), &clock(), &mut sink).unwrap();

        assert!(totals.total_damage > 0.0);
        let car = sink.total_for(Party::Vehicle(VehicleId(20)));
        let hgv = sink.total_for(Party::Vehicle(VehicleId(21)));
        assert!(hgv > car);
        assert!((car - sink.total_for(Party::Vehicle(VehicleId(22)))).abs() < 1e-12);
        assert!((sink.caused_total - totals.total_damage).abs() <= 1e-9 * totals.total_damage);

        // Caused events carry the passage time and come in sequence order.
        let caused: Vec<_> = sink.flow(CostFlow::Caused).collect();
        assert!(caused.windows(2).all(|w| w[0].time <= w[1].time));
        assert_eq!(caused[0].origin, CostOrigin::Link(LinkId(1)));
    }

    #[test]
    fn nothing_below_audibility_threshold() {
        let (mut grid, levels) = scenario(&[(1, 0, 8, VehicleClass::Car)], &Constant(60.0));
        add_presence(&mut grid, 0, 8, &[(1, 1.0)]);
        let mut sink = CostCollector::new();
        let totals =
            calculate_noise_damage_costs(&mut grid, &levels, &dose(), &damage_config(65.0), &clock(), &mut sink).unwrap();
        assert_eq!(totals, Default::default());
        assert!(sink.events.is_empty());
    }

    #[test]
    fn nothing_without_exposed_people() {
        let (mut grid, levels) = scenario(&[(1, 0, 8, VehicleClass::Car)], &Constant(80.0));
        let mut sink = CostCollector::new();
        let totals =
            calculate_noise_damage_costs(&mut grid, &levels, &dose(), &damage_config(0.0), &clock(), &mut sink).unwrap();
        assert_eq!(totals.exposed_bins, 0);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn non_finite_dose_emits_nothing() {
        struct Runaway;
        impl DoseResponse for Runaway {
            fn cost(&self, _level_db: f64, affected_units: f64, _bin: TimeBin, _clock: &BinClock) -> f64 {
                if affected_units > 2.0 { f64::NAN } else { 1.0 }
            }
        }

        let (mut grid, levels) = scenario(&[(1, 0, 8, VehicleClass::Car), (1, 1, 9, VehicleClass::Car)], &Constant(60.0));
        add_presence(&mut grid, 0, 8, &[(1, 1.0)]);
        add_presence(&mut grid, 0, 9, &[(1, 1.0), (2, 2.0)]);
        let mut sink = CostCollector::new();
        let err = calculate_noise_damage_costs(&mut grid, &levels, &Runaway, &damage_config(0.0), &clock(), &mut sink);
        assert!(matches!(err, Err(DamageError::NonFinite { receiver: ReceiverId(0), bin: TimeBin(9) })));
        assert!(sink.events.is_empty());
    }

    #[test]
    fn overflowing_sum_emits_nothing() {
        struct Huge;
        impl DoseResponse for Huge {
            fn cost(&self, _level_db: f64, _affected_units: f64, _bin: TimeBin, _clock: &BinClock) -> f64 {
                f64::MAX
            }
        }

        let (mut grid, levels) = scenario(&[(1, 0, 8, VehicleClass::Car), (1, 1, 9, VehicleClass::Car)], &Constant(60.0));
        add_presence(&mut grid, 0, 8, &[(1, 1.0)]);
        add_presence(&mut grid, 0, 9, &[(1, 1.0)]);
        let mut sink = CostCollector::new();
        let err = calculate_noise_damage_costs(&mut grid, &levels, &Huge, &damage_config(0.0), &clock(), &mut sink);
        assert!(matches!(err, Err(DamageError::NonFiniteTotal)));
        assert!(sink.events.is_empty());
    }

    #[test]
    fn affected_events_precede_caused() {
        let (mut grid, levels) = scenario(&[(1, 0, 8, VehicleClass::Car)], &Constant(60.0));
        add_presence(&mut grid, 0, 8, &[(1, 1.0)]);
        let mut sink = CostCollector::new();
        calculate_noise_damage_costs(&mut grid, &levels, &dose(), &damage_config(0.0), &clock(), &mut sink).unwrap();
        let flows: Vec<CostFlow> = sink.events.iter().map(|e| e.flow).collect();
        assert_eq!(flows, vec![CostFlow::Affected, CostFlow::Caused]);
    }
}

// ── Properties ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn shares_conserve_damage(units in proptest::collection::vec(0.01f64..50.0, 1..12), level in 51.0f64..110.0) {
            let (mut grid, levels) = scenario(&[(1, 0, 8, VehicleClass::Car), (2, 1, 8, VehicleClass::Hgv)], &Constant(level));
            let people: Vec<(u32, f64)> = units.iter().enumerate().map(|(i, u)| (i as u32, *u)).collect();
            add_presence(&mut grid, 0, 8, &people);
            let mut sink = CostCollector::new();
            let totals = calculate_noise_damage_costs(&mut grid, &levels, &dose(), &damage_config(0.0), &clock(), &mut sink).unwrap();

            let tol = 1e-9 * totals.total_damage.max(1.0);
            prop_assert!(totals.total_damage > 0.0);
            prop_assert!((sink.affected_total - totals.total_damage).abs() <= tol);
            prop_assert!((sink.caused_total - totals.total_damage).abs() <= tol);
            prop_assert!(sink.events.iter().all(|e| e.amount >= 0.0));
        }
    }
}
