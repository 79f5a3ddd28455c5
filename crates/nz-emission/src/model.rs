//! Emission models: traffic in, sound power level out.

use nz_core::VehicleClass;
use nz_core::config::EmissionConfig;

use crate::{EmissionError, EmissionResult};

/// Traffic observed on one link during one bin, normalised to an hour.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrafficSample {
    /// Vehicles per hour, already multiplied by the sample scale factor.
    pub hourly_volume: f64,
    /// Share of heavy goods vehicles, `0.0..=1.0`.
    pub hgv_share:     f64,
    /// Mean speed of cars in km/h.
    pub car_speed_kmh: f64,
    /// Mean speed of heavy goods vehicles in km/h.
    pub hgv_speed_kmh: f64,
}

/// Maps hourly traffic on a link to an emission level in dB(A).
///
/// Implementations must be `Send + Sync`; the pipeline holds one behind a
/// `Box<dyn EmissionModel>` for the whole run.
pub trait EmissionModel: Send + Sync {
    /// Emission level of `traffic`.  May return `f64::NEG_INFINITY` for zero
    /// volume; the caller raises everything to the silence floor.
    fn level(&self, traffic: &TrafficSample) -> f64;

    /// Level of a single vehicle of `class` at `speed_kmh`, where
    /// `unit_volume` is the hourly volume one observed passage stands for.
    ///
    /// Used to apportion a link's caused cost over its passages.
    fn single_vehicle_level(&self, class: VehicleClass, speed_kmh: f64, unit_volume: f64) -> f64 {
        let hgv_share = if class.is_heavy() { 1.0 } else { 0.0 };
        self.level(&TrafficSample {
            hourly_volume: unit_volume,
            hgv_share,
            car_speed_kmh: speed_kmh,
            hgv_speed_kmh: speed_kmh,
        })
    }
}

// ── RLS-90 ────────────────────────────────────────────────────────────────────

/// The emission formula of the German road-traffic noise guideline RLS-90.
///
/// ```text
/// Lm25 = 37.3 + 10·log10(M·(1 + 0.082·p))
/// Lcar = 27.7 + 10·log10(1 + (0.02·vCar)³)
/// Lhgv = 23.1 + 12.5·log10(vHgv)
/// D    = Lhgv − Lcar
/// Dv   = Lcar − 37.3 + 10·log10((100 + (10^(0.1·D) − 1)·p) / (100 + 8.23·p))
/// L    = Lm25 + Dv
/// ```
///
/// with `M` in vehicles per hour and `p` the HGV share in percent.  Speeds
/// are clamped to the configured ranges before use.
#[derive(Clone, Debug, PartialEq)]
pub struct Rls90 {
    min_speed_kmh:     f64,
    max_car_speed_kmh: f64,
    max_hgv_speed_kmh: f64,
}

impl Rls90 {
    pub fn new(min_speed_kmh: f64, max_car_speed_kmh: f64, max_hgv_speed_kmh: f64) -> EmissionResult<Self> {
        if !(min_speed_kmh > 0.0 && min_speed_kmh <= max_car_speed_kmh && min_speed_kmh <= max_hgv_speed_kmh) {
            return Err(EmissionError::Model(format!(
                "speed clamps must satisfy 0 < {min_speed_kmh} <= {max_car_speed_kmh}, {max_hgv_speed_kmh}"
            )));
        }
        Ok(Self { min_speed_kmh, max_car_speed_kmh, max_hgv_speed_kmh })
    }

    pub fn from_config(config: &EmissionConfig) -> EmissionResult<Self> {
        Self::new(config.min_speed_kmh, config.max_car_speed_kmh, config.max_hgv_speed_kmh)
    }

    /// Mean emission level of one car at `speed_kmh`, before volume terms.
    pub fn car_level(&self, speed_kmh: f64) -> f64 {
        let v = speed_kmh.clamp(self.min_speed_kmh, self.max_car_speed_kmh);
        27.7 + 10.0 * (1.0 + (0.02 * v).powi(3)).log10()
    }

    /// Mean emission level of one heavy goods vehicle at `speed_kmh`.
    pub fn hgv_level(&self, speed_kmh: f64) -> f64 {
        let v = speed_kmh.clamp(self.min_speed_kmh, self.max_hgv_speed_kmh);
        23.1 + 12.5 * v.log10()
    }
}

impl EmissionModel for Rls90 {
    fn level(&self, traffic: &TrafficSample) -> f64 {
        if !(traffic.hourly_volume > 0.0) {
            return f64::NEG_INFINITY;
        }
        let p = 100.0 * traffic.hgv_share.clamp(0.0, 1.0);

        let lm25 = 37.3 + 10.0 * (traffic.hourly_volume * (1.0 + 0.082 * p)).log10();
        let l_car = self.car_level(traffic.car_speed_kmh);
        let l_hgv = self.hgv_level(traffic.hgv_speed_kmh);
        let d = l_hgv - l_car;
        let dv = l_car - 37.3
            + 10.0 * ((100.0 + (10f64.powf(0.1 * d) - 1.0) * p) / (100.0 + 8.23 * p)).log10();

        lm25 + dv
    }
}
