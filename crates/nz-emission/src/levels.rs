//! The emission stage's output: one record per link and bin with traffic.

use std::collections::BTreeMap;

use nz_core::{LinkId, SimTime, TimeBin, VehicleClass, VehicleId};

/// One observed vehicle passage, with its weight for caused-cost
/// apportioning.
#[derive(Clone, Debug, PartialEq)]
pub struct Passage {
    pub vehicle:   VehicleId,
    pub time:      SimTime,
    pub class:     VehicleClass,
    pub speed_kmh: f64,
    /// Routing sequence number; orders same-timestamp passages.
    pub seq:       u64,
    /// `10^(L/10)` of this vehicle's single-vehicle level.  Zero until the
    /// emission stage has run.
    pub energy:    f64,
}

/// Aggregated traffic and emission level of one link in one bin.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkBinEmission {
    pub link:          LinkId,
    pub bin:           TimeBin,
    pub cars:          u32,
    pub hgvs:          u32,
    /// Scaled vehicles per hour.
    pub hourly_volume: f64,
    pub hgv_share:     f64,
    /// `None` if no car passed.
    pub car_speed_kmh: Option<f64>,
    /// `None` if no heavy goods vehicle passed.
    pub hgv_speed_kmh: Option<f64>,
    /// Emission level, never below the silence floor.
    pub level_db:      f64,
    /// Passages in sequence order.
    pub passages:      Vec<Passage>,
}

impl LinkBinEmission {
    pub fn vehicles(&self) -> u32 {
        self.cars + self.hgvs
    }

    /// Sum of passage energies.
    pub fn total_energy(&self) -> f64 {
        self.passages.iter().map(|p| p.energy).sum()
    }
}

/// Emission levels for every `(link, bin)` with recorded traffic.
///
/// Pairs without traffic are absent and read back as the silence floor.
#[derive(Clone, Debug, PartialEq)]
pub struct EmissionLevels {
    silence_floor_db: f64,
    records:          BTreeMap<(LinkId, TimeBin), LinkBinEmission>,
}

impl EmissionLevels {
    pub fn new(silence_floor_db: f64) -> Self {
        Self { silence_floor_db, records: BTreeMap::new() }
    }

    pub(crate) fn insert(&mut self, record: LinkBinEmission) {
        self.records.insert((record.link, record.bin), record);
    }

    pub fn silence_floor_db(&self) -> f64 {
        self.silence_floor_db
    }

    /// Emission level of `link` in `bin`; the silence floor without traffic.
    pub fn level_db(&self, link: LinkId, bin: TimeBin) -> f64 {
        self.records
            .get(&(link, bin))
            .map_or(self.silence_floor_db, |r| r.level_db)
    }

    pub fn get(&self, link: LinkId, bin: TimeBin) -> Option<&LinkBinEmission> {
        self.records.get(&(link, bin))
    }

    /// Records ascending by `(link, bin)`.
    pub fn iter(&self) -> impl Iterator<Item = &LinkBinEmission> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn passage_count(&self) -> usize {
        self.records.values().map(|r| r.passages.len()).sum()
    }
}
