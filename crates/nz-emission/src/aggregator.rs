//! The `EmissionAggregator` — per-iteration traffic counts per link and bin.
//!
//! # Lifecycle
//!
//! 1. `reset()` before the outer day starts.
//! 2. `record_vehicle_event()` for every routed vehicle movement.  Invalid
//!    events are reported to the anomaly log and skipped.
//! 3. `compute_emission_levels()` once after the day: a pure function of the
//!    recorded passages, so calling it twice gives identical results.

use nz_core::config::EmissionConfig;
use nz_core::{AnomalyKind, AnomalyLog, BinClock, LinkId, TimeBin, VehicleClass};
use nz_events::VehicleMoved;

use crate::{EmissionLevels, EmissionModel, LinkBinEmission, Passage, TrafficSample};

#[cfg(feature = "fx-hash")]
type LinkBinMap<V> = rustc_hash::FxHashMap<(LinkId, TimeBin), V>;
#[cfg(not(feature = "fx-hash"))]
type LinkBinMap<V> = std::collections::HashMap<(LinkId, TimeBin), V>;

/// Raw counts for one link and bin.
#[derive(Clone, Debug, Default)]
struct LinkBinTraffic {
    cars:              u32,
    hgvs:              u32,
    car_speed_sum_kmh: f64,
    hgv_speed_sum_kmh: f64,
    passages:          Vec<Passage>,
}

/// Collects vehicle passages during the day and turns them into
/// [`EmissionLevels`] afterwards.
pub struct EmissionAggregator {
    clock:       BinClock,
    config:      EmissionConfig,
    /// Sorted; `None` accepts any link id.
    known_links: Option<Vec<LinkId>>,
    traffic:     LinkBinMap<LinkBinTraffic>,
    anomalies:   AnomalyLog,
}

impl EmissionAggregator {
    pub fn new(clock: BinClock, config: EmissionConfig) -> Self {
        Self {
            clock,
            config,
            known_links: None,
            traffic:     LinkBinMap::default(),
            anomalies:   AnomalyLog::new("emission"),
        }
    }

    /// Reject passages on links outside `links` as
    /// [`AnomalyKind::UnknownLink`].
    pub fn with_known_links(mut self, links: impl IntoIterator<Item = LinkId>) -> Self {
        let mut ids: Vec<LinkId> = links.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        self.known_links = Some(ids);
        self
    }

    // ── Collection ────────────────────────────────────────────────────────

    /// Record one passage.  Returns `false` if the event was rejected.
    pub fn record_vehicle_event(&mut self, event: &VehicleMoved, seq: u64) -> bool {
        if !(event.speed_mps.is_finite() && event.speed_mps >= 0.0) {
            self.anomalies.report(
                AnomalyKind::InvalidSpeed,
                format_args!("{} on {} at {}: speed {}", event.vehicle, event.link, event.time, event.speed_mps),
            );
            return false;
        }
        if !self.clock.within_horizon(event.time) {
            self.anomalies.report(
                AnomalyKind::AfterHorizon,
                format_args!("{} on {} at {}", event.vehicle, event.link, event.time),
            );
            return false;
        }
        if let Some(known) = &self.known_links {
            if known.binary_search(&event.link).is_err() {
                self.anomalies.report(
                    AnomalyKind::UnknownLink,
                    format_args!("{} at {}", event.link, event.time),
                );
                return false;
            }
        }

        let speed_kmh = event.speed_mps * 3.6;
        let bin = self.clock.bin_of(event.time);
        let entry = self.traffic.entry((event.link, bin)).or_default();
        match event.class {
            VehicleClass::Car => {
                entry.cars += 1;
                entry.car_speed_sum_kmh += speed_kmh;
            }
            VehicleClass::Hgv => {
                entry.hgvs += 1;
                entry.hgv_speed_sum_kmh += speed_kmh;
            }
        }
        entry.passages.push(Passage {
            vehicle: event.vehicle,
            time:    event.time,
            class:   event.class,
            speed_kmh,
            seq,
            energy:  0.0,
        });
        true
    }

    // ── Computation ───────────────────────────────────────────────────────

    /// Hourly volume one observed passage stands for.
    pub fn unit_volume(&self) -> f64 {
        self.config.scale_factor * 3_600.0 / self.clock.bin_width_secs as f64
    }

    /// Emission level of every link and bin with recorded traffic.
    ///
    /// Levels below the silence floor are raised to it.  The result does not
    /// depend on hash-map iteration order.
    pub fn compute_emission_levels(&self, model: &dyn EmissionModel) -> EmissionLevels {
        let floor = self.config.silence_floor_db;
        let unit_volume = self.unit_volume();
        let mut levels = EmissionLevels::new(floor);

        for (&(link, bin), t) in &self.traffic {
            let vehicles = t.cars + t.hgvs;
            let car_speed_kmh = (t.cars > 0).then(|| t.car_speed_sum_kmh / t.cars as f64);
            let hgv_speed_kmh = (t.hgvs > 0).then(|| t.hgv_speed_sum_kmh / t.hgvs as f64);
            let hourly_volume = vehicles as f64 * unit_volume;
            let hgv_share = if vehicles == 0 { 0.0 } else { t.hgvs as f64 / vehicles as f64 };

            // A class that did not pass borrows the other class's speed; its
            // share is zero so only the formula's cross term sees it.
            let sample = TrafficSample {
                hourly_volume,
                hgv_share,
                car_speed_kmh: car_speed_kmh.or(hgv_speed_kmh).unwrap_or(0.0),
                hgv_speed_kmh: hgv_speed_kmh.or(car_speed_kmh).unwrap_or(0.0),
            };
            let level_db = clamp_to_floor(model.level(&sample), floor);

            let mut passages = t.passages.clone();
            passages.sort_unstable_by_key(|p| p.seq);
            for p in &mut passages {
                let single = model.single_vehicle_level(p.class, p.speed_kmh, unit_volume);
                p.energy = if single.is_finite() { 10f64.powf(single / 10.0) } else { 0.0 };
            }

            levels.insert(LinkBinEmission {
                link,
                bin,
                cars: t.cars,
                hgvs: t.hgvs,
                hourly_volume,
                hgv_share,
                car_speed_kmh,
                hgv_speed_kmh,
                level_db,
                passages,
            });
        }

        tracing::debug!(link_bins = levels.len(), passages = levels.passage_count(), "emission levels computed");
        levels
    }

    // ── Access / lifecycle ────────────────────────────────────────────────

    /// Number of `(link, bin)` pairs with traffic.
    pub fn link_bin_count(&self) -> usize {
        self.traffic.len()
    }

    pub fn passage_count(&self) -> usize {
        self.traffic.values().map(|t| t.passages.len()).sum()
    }

    pub fn anomalies(&self) -> &AnomalyLog {
        &self.anomalies
    }

    pub fn anomalies_mut(&mut self) -> &mut AnomalyLog {
        &mut self.anomalies
    }

    /// Drop every recorded passage and the per-iteration anomaly counts.
    pub fn reset(&mut self) {
        self.traffic.clear();
        self.anomalies.reset_counts();
    }

    /// `true` if nothing has been recorded since the last reset.
    pub fn is_reset(&self) -> bool {
        self.traffic.is_empty() && self.anomalies.total() == 0
    }
}

fn clamp_to_floor(level: f64, floor: f64) -> f64 {
    if level.is_nan() { floor } else { level.max(floor) }
}
