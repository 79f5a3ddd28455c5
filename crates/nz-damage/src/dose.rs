//! Dose-response functions: exposure in, money out.

use nz_core::config::DamageConfig;
use nz_core::{BinClock, TimeBin};

use crate::{DamageError, DamageResult};

/// Monetised damage of `affected_units` exposed to `level_db` during `bin`.
///
/// Must be finite, non-negative and non-decreasing in the level; checked once
/// at startup by [`validate_dose_response`].
pub trait DoseResponse: Send + Sync {
    fn cost(&self, level_db: f64, affected_units: f64, bin: TimeBin, clock: &BinClock) -> f64;
}

/// Period-dependent loudness valuation.
///
/// ```text
/// cost = rate / 365 · 2^((L − threshold) / doubling) · units · bin_width / period_length
/// ```
///
/// for `L > threshold`, zero otherwise.  The period (and its threshold) is the
/// one containing the bin's start hour.
#[derive(Clone, Debug)]
pub struct PeriodDoseResponse {
    config: DamageConfig,
}

impl PeriodDoseResponse {
    pub fn from_config(config: &DamageConfig) -> DamageResult<Self> {
        config.validate()?;
        Ok(Self { config: config.clone() })
    }
}

impl DoseResponse for PeriodDoseResponse {
    fn cost(&self, level_db: f64, affected_units: f64, bin: TimeBin, clock: &BinClock) -> f64 {
        let Some(period) = self.config.period_for_hour(clock.start_hour_of_day(bin)) else {
            return 0.0;
        };
        if !(level_db > period.threshold_db) || affected_units <= 0.0 {
            return 0.0;
        }
        let loudness = 2f64.powf((level_db - period.threshold_db) / self.config.loudness_doubling_db);
        let period_secs = period.length_hours() as f64 * 3_600.0;
        self.config.annual_cost_rate / 365.0 * loudness * affected_units * clock.bin_width_secs as f64 / period_secs
    }
}

const PROBE_UNITS: [f64; 4] = [0.0, 0.5, 1.0, 25.0];

/// Probe `model` over 0–140 dB in every bin of the day.
///
/// # Errors
///
/// `DamageError::Config` naming the first negative, non-finite or decreasing
/// output.
pub fn validate_dose_response(model: &dyn DoseResponse, clock: &BinClock) -> DamageResult<()> {
    for bin in clock.bins() {
        for units in PROBE_UNITS {
            let mut prev = 0.0;
            for level in 0..=140 {
                let level = level as f64;
                let c = model.cost(level, units, bin, clock);
                if !(c.is_finite() && c >= 0.0) {
                    return Err(DamageError::Config(format!(
                        "cost {c} at {level} dB, {units} units in {bin}"
                    )));
                }
                if c < prev {
                    return Err(DamageError::Config(format!(
                        "cost decreases from {prev} to {c} at {level} dB, {units} units in {bin}"
                    )));
                }
                prev = c;
            }
        }
    }
    Ok(())
}
