//! Sound propagation from a link to a receiver.

use nz_core::LinkId;
use nz_core::config::AttenuationConfig;
use nz_spatial::RelevantLink;

use crate::{ImmissionError, ImmissionResult};

/// Level correction (usually negative) between a link's emission and its
/// contribution at a receiver.
///
/// Must be non-increasing in distance.
pub trait AttenuationModel: Send + Sync {
    fn attenuation_db(&self, link: &RelevantLink) -> f64;
}

/// `A(s) = reference − log_coefficient·log10(s) − linear_coefficient·s^exponent`,
/// plus `10·log10(angle/180)` with angle correction on.
///
/// Distances below `min_distance_m` are evaluated at `min_distance_m`.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceAttenuation {
    reference_db:       f64,
    log_coefficient:    f64,
    linear_coefficient: f64,
    linear_exponent:    f64,
    min_distance_m:     f64,
    angle_correction:   bool,
}

/// Distances at which `validate` checks monotonicity.
const PROBE_DISTANCES_M: [f64; 12] =
    [0.5, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 5_000.0];

impl DistanceAttenuation {
    /// # Errors
    ///
    /// `ImmissionError::Core` if the section is invalid, `ImmissionError::Config`
    /// if the resulting curve increases with distance.
    pub fn from_config(config: &AttenuationConfig) -> ImmissionResult<Self> {
        config.validate()?;
        let model = Self {
            reference_db:       config.reference_db,
            log_coefficient:    config.log_coefficient,
            linear_coefficient: config.linear_coefficient,
            linear_exponent:    config.linear_exponent,
            min_distance_m:     config.min_distance_m,
            angle_correction:   config.angle_correction,
        };
        model.validate()?;
        Ok(model)
    }

    /// Attenuation at `distance_m` seen under `angle_deg`.
    pub fn at(&self, distance_m: f64, angle_deg: f64) -> f64 {
        let s = distance_m.max(self.min_distance_m);
        let mut a = self.reference_db
            - self.log_coefficient * s.log10()
            - self.linear_coefficient * s.powf(self.linear_exponent);
        if self.angle_correction {
            let angle = angle_deg.clamp(f64::MIN_POSITIVE, 180.0);
            a += 10.0 * (angle / 180.0).log10();
        }
        a
    }

    /// Probe the curve for finite, non-increasing values.
    pub fn validate(&self) -> ImmissionResult<()> {
        validate_attenuation(self)
    }
}

/// Probe `model` at increasing distances with a full viewing angle.
///
/// # Errors
///
/// `ImmissionError::Config` naming the first non-finite value or increase.
pub fn validate_attenuation(model: &dyn AttenuationModel) -> ImmissionResult<()> {
    let mut prev = f64::INFINITY;
    for d in PROBE_DISTANCES_M {
        let probe = RelevantLink { link: LinkId(0), distance_m: d, angle_deg: 180.0 };
        let a = model.attenuation_db(&probe);
        if !a.is_finite() {
            return Err(ImmissionError::Config(format!("attenuation at {d} m is {a}")));
        }
        if a > prev + 1e-12 {
            return Err(ImmissionError::Config(format!(
                "attenuation increases with distance at {d} m ({prev} → {a})"
            )));
        }
        prev = a;
    }
    Ok(())
}

impl AttenuationModel for DistanceAttenuation {
    fn attenuation_db(&self, link: &RelevantLink) -> f64 {
        self.at(link.distance_m, link.angle_deg)
    }
}
