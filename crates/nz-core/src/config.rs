//! Noise pipeline configuration.
//!
//! Loaded from TOML by the application and validated once, before the first
//! iteration.  Every check here is a configuration error: nothing in this
//! module is re-checked at runtime.
//!
//! ```toml
//! [time]
//! bin_width_secs = 3600
//! horizon_secs   = 108000
//!
//! [grid]
//! receiver_gap_m   = 250.0
//! hearing_radius_m = 500.0
//!
//! [emission]
//! silence_floor_db = 0.0
//!
//! [attenuation]
//! reference_db       = 15.8
//! log_coefficient    = 10.0
//! linear_coefficient = 0.0142
//! linear_exponent    = 0.9
//! min_distance_m     = 5.0
//!
//! [damage]
//! audibility_threshold_db = 0.0
//! annual_cost_rate        = 63.3
//! loudness_doubling_db    = 10.0
//! periods = [
//!   { name = "day",     start_hour = 6,  end_hour = 18, threshold_db = 50.0 },
//!   { name = "evening", start_hour = 18, end_hour = 22, threshold_db = 45.0 },
//!   { name = "night",   start_hour = 22, end_hour = 6,  threshold_db = 40.0 },
//! ]
//!
//! [activity]
//! considered = ["home", "work"]
//! weights    = { home = 1.0, work = 0.5 }
//! ```
//!
//! Attenuation and damage coefficients have no defaults: they are regulatory
//! parameters and must come from the application.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::{BinClock, CoreError, CoreResult};

fn config_err(msg: impl Into<String>) -> CoreError {
    CoreError::Config(msg.into())
}

// ── NoiseConfig ───────────────────────────────────────────────────────────────

/// Top-level configuration of the noise pipeline.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoiseConfig {
    pub time:        TimeConfig,
    pub grid:        GridConfig,
    pub emission:    EmissionConfig,
    pub attenuation: AttenuationConfig,
    pub damage:      DamageConfig,
    pub activity:    ActivityConfig,
    #[serde(default)]
    pub run:         RunConfig,
}

impl NoiseConfig {
    /// Parse (but do not validate) a TOML document.
    pub fn from_toml_str(s: &str) -> CoreResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section.  The first violation is returned.
    pub fn validate(&self) -> CoreResult<()> {
        self.time.validate()?;
        self.grid.validate()?;
        self.emission.validate()?;
        self.attenuation.validate()?;
        self.damage.validate()?;
        self.activity.validate()?;
        Ok(())
    }

    /// The bin clock shared by every component.
    pub fn clock(&self) -> BinClock {
        self.time.clock()
    }
}

// ── [time] ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeConfig {
    /// Width of one aggregation bin in seconds.
    pub bin_width_secs: u64,
    /// End of the simulated day in seconds (e.g. 30 h = 108 000).
    pub horizon_secs:   u64,
}

impl TimeConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.bin_width_secs == 0 {
            return Err(config_err("time.bin_width_secs must be > 0"));
        }
        if self.horizon_secs == 0 {
            return Err(config_err("time.horizon_secs must be > 0"));
        }
        Ok(())
    }

    pub fn clock(&self) -> BinClock {
        BinClock::new(self.bin_width_secs, self.horizon_secs)
    }
}

// ── [grid] ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    /// Distance between neighbouring receivers in metres.
    pub receiver_gap_m:   f64,
    /// Links farther than this from a receiver are not heard there.
    pub hearing_radius_m: f64,
    /// Optional `[min_x, min_y, max_x, max_y]`; defaults to the network's
    /// bounding box.
    #[serde(default)]
    pub bounds:           Option<[f64; 4]>,
}

impl GridConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.hearing_radius_m.is_finite() && self.hearing_radius_m > 0.0) {
            return Err(config_err(format!(
                "grid.hearing_radius_m must be > 0, got {}",
                self.hearing_radius_m
            )));
        }
        if !(self.receiver_gap_m.is_finite() && self.receiver_gap_m > 0.0) {
            return Err(config_err(format!(
                "grid.receiver_gap_m must be > 0, got {}",
                self.receiver_gap_m
            )));
        }
        if let Some([min_x, min_y, max_x, max_y]) = self.bounds {
            if !(min_x <= max_x && min_y <= max_y) {
                return Err(config_err("grid.bounds must be [min_x, min_y, max_x, max_y]"));
            }
        }
        Ok(())
    }
}

// ── [emission] ────────────────────────────────────────────────────────────────

fn default_scale_factor() -> f64 { 1.0 }
fn default_min_speed_kmh() -> f64 { 30.0 }
fn default_max_car_speed_kmh() -> f64 { 130.0 }
fn default_max_hgv_speed_kmh() -> f64 { 80.0 }

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmissionConfig {
    /// Level standing in for "no sound" (no traffic, no audible link).
    pub silence_floor_db:  f64,
    /// Upscaling of observed volumes when the outer simulation runs a sample
    /// of the population (e.g. 10 for a 10 % sample).
    #[serde(default = "default_scale_factor")]
    pub scale_factor:      f64,
    /// Lower speed clamp of the emission formula.
    #[serde(default = "default_min_speed_kmh")]
    pub min_speed_kmh:     f64,
    /// Upper speed clamp for cars.
    #[serde(default = "default_max_car_speed_kmh")]
    pub max_car_speed_kmh: f64,
    /// Upper speed clamp for heavy goods vehicles.
    #[serde(default = "default_max_hgv_speed_kmh")]
    pub max_hgv_speed_kmh: f64,
}

impl EmissionConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !self.silence_floor_db.is_finite() {
            return Err(config_err("emission.silence_floor_db must be finite"));
        }
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(config_err("emission.scale_factor must be > 0"));
        }
        if !(self.min_speed_kmh > 0.0
            && self.min_speed_kmh <= self.max_car_speed_kmh
            && self.min_speed_kmh <= self.max_hgv_speed_kmh)
        {
            return Err(config_err(
                "emission speed clamps must satisfy 0 < min_speed_kmh <= max_*_speed_kmh",
            ));
        }
        Ok(())
    }
}

// ── [attenuation] ─────────────────────────────────────────────────────────────

/// Coefficients of the distance attenuation
/// `A(s) = reference_db − log_coefficient·log10(s) − linear_coefficient·s^linear_exponent`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttenuationConfig {
    pub reference_db:       f64,
    pub log_coefficient:    f64,
    pub linear_coefficient: f64,
    pub linear_exponent:    f64,
    /// Distances below this are evaluated at this distance.
    pub min_distance_m:     f64,
    /// Add `10·log10(angle/180)` for the angle under which the link is seen.
    #[serde(default)]
    pub angle_correction:   bool,
}

impl AttenuationConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !self.reference_db.is_finite() {
            return Err(config_err("attenuation.reference_db must be finite"));
        }
        // Both terms must be non-increasing in distance.
        if !(self.log_coefficient.is_finite() && self.log_coefficient >= 0.0) {
            return Err(config_err("attenuation.log_coefficient must be >= 0"));
        }
        if !(self.linear_coefficient.is_finite() && self.linear_coefficient >= 0.0) {
            return Err(config_err("attenuation.linear_coefficient must be >= 0"));
        }
        if !(self.linear_exponent.is_finite() && self.linear_exponent > 0.0) {
            return Err(config_err("attenuation.linear_exponent must be > 0"));
        }
        if !(self.min_distance_m.is_finite() && self.min_distance_m > 0.0) {
            return Err(config_err("attenuation.min_distance_m must be > 0"));
        }
        Ok(())
    }
}

// ── [damage] ──────────────────────────────────────────────────────────────────

/// One valuation period of the day, e.g. night 22–6 with a 40 dB threshold.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ValuationPeriod {
    pub name:         String,
    /// First hour of the period (0–23).
    pub start_hour:   u32,
    /// Hour at which the period ends (exclusive, 0–24); may wrap past midnight.
    pub end_hour:     u32,
    /// Level above which exposure is valued.
    pub threshold_db: f64,
}

impl ValuationPeriod {
    /// Length of the period in hours, accounting for wrap-around.
    pub fn length_hours(&self) -> u32 {
        if self.end_hour > self.start_hour {
            self.end_hour - self.start_hour
        } else {
            24 - self.start_hour + self.end_hour
        }
    }

    /// `true` if `hour` (0–23) belongs to this period.
    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.end_hour > self.start_hour {
            (self.start_hour..self.end_hour).contains(&hour)
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DamageConfig {
    /// Receiver/bins at or below this level produce no cost at all.
    pub audibility_threshold_db: f64,
    /// Cost per exposed person per year at one loudness unit.
    pub annual_cost_rate:        f64,
    /// Level increase that doubles perceived loudness (and cost).
    pub loudness_doubling_db:    f64,
    /// Valuation periods; together they must cover each hour exactly once.
    pub periods:                 Vec<ValuationPeriod>,
}

impl DamageConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !self.audibility_threshold_db.is_finite() {
            return Err(config_err("damage.audibility_threshold_db must be finite"));
        }
        if !(self.annual_cost_rate.is_finite() && self.annual_cost_rate >= 0.0) {
            return Err(config_err("damage.annual_cost_rate must be >= 0"));
        }
        if !(self.loudness_doubling_db.is_finite() && self.loudness_doubling_db > 0.0) {
            return Err(config_err("damage.loudness_doubling_db must be > 0"));
        }
        for p in &self.periods {
            if p.start_hour >= 24 || p.end_hour > 24 || p.start_hour == p.end_hour {
                return Err(config_err(format!(
                    "damage period {:?}: invalid hours {}–{}",
                    p.name, p.start_hour, p.end_hour
                )));
            }
            if !p.threshold_db.is_finite() {
                return Err(config_err(format!("damage period {:?}: threshold must be finite", p.name)));
            }
        }
        for hour in 0..24 {
            let n = self.periods.iter().filter(|p| p.contains_hour(hour)).count();
            if n != 1 {
                return Err(config_err(format!(
                    "damage periods must cover every hour exactly once; hour {hour} is covered {n} times"
                )));
            }
        }
        Ok(())
    }

    /// The period containing `hour` (0–23).  Always `Some` after validation.
    pub fn period_for_hour(&self, hour: u32) -> Option<&ValuationPeriod> {
        self.periods.iter().find(|p| p.contains_hour(hour % 24))
    }
}

// ── [activity] ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityConfig {
    /// Activity types that count towards exposure.
    pub considered: Vec<String>,
    /// Affected-agent-unit weight per activity type.
    pub weights:    BTreeMap<String, f64>,
}

impl ActivityConfig {
    pub fn validate(&self) -> CoreResult<()> {
        for act in &self.considered {
            match self.weights.get(act) {
                None => {
                    return Err(config_err(format!(
                        "activity type {act:?} is considered but has no weight"
                    )));
                }
                Some(w) if !(w.is_finite() && *w >= 0.0) => {
                    return Err(config_err(format!(
                        "activity weight for {act:?} must be >= 0, got {w}"
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

// ── [run] ─────────────────────────────────────────────────────────────────────

fn default_seed() -> u64 { 42 }

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Seed for synthetic scenario generation.  The pipeline itself is
    /// deterministic and does not use it.
    #[serde(default = "default_seed")]
    pub seed:             u64,
    /// Rayon worker count.  `None` uses all logical cores.
    #[serde(default)]
    pub parallel_threads: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { seed: default_seed(), parallel_threads: None }
    }
}
