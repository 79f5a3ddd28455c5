//! The immission stage.

use std::collections::BTreeMap;

use nz_core::{BinClock, LinkId};
use nz_emission::EmissionLevels;
use nz_spatial::{Receiver, ReceiverGrid};

use crate::AttenuationModel;

/// Energetic (power) sum of levels in dB: `10·log10(Σ 10^(L/10))`.
///
/// `f64::NEG_INFINITY` for an empty input.
pub fn energetic_sum(levels: impl IntoIterator<Item = f64>) -> f64 {
    let power: f64 = levels.into_iter().map(|l| 10f64.powf(l / 10.0)).sum();
    10.0 * power.log10()
}

/// Counts from one [`calculate_noise_immission`] call.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ImmissionSummary {
    /// Receiver/bins evaluated.
    pub receiver_bins: usize,
    /// Receiver/bins with at least one audible link.
    pub audible_bins:  usize,
}

/// Compute the immission level of every receiver in every bin of the day.
///
/// Each relevant link whose emission lies above the silence floor adds
/// `emission + attenuation`; contributions are combined energetically and
/// kept individually for caused-cost apportioning.  Receivers without an
/// audible link, or whose combined level is below the floor, get the floor.
///
/// Recomputes from scratch: calling twice leaves the grid unchanged.
pub fn calculate_noise_immission(
    grid:        &mut ReceiverGrid,
    emissions:   &EmissionLevels,
    attenuation: &dyn AttenuationModel,
    clock:       &BinClock,
) -> ImmissionSummary {
    let receivers = grid.receivers_mut();

    #[cfg(not(feature = "parallel"))]
    let audible: usize = receivers
        .iter_mut()
        .map(|r| propagate_receiver(r, emissions, attenuation, clock))
        .sum();

    #[cfg(feature = "parallel")]
    let audible: usize = {
        use rayon::prelude::*;
        receivers
            .par_iter_mut()
            .map(|r| propagate_receiver(r, emissions, attenuation, clock))
            .sum()
    };

    let summary = ImmissionSummary {
        receiver_bins: receivers.len() * clock.bin_count() as usize,
        audible_bins:  audible,
    };
    tracing::debug!(
        receiver_bins = summary.receiver_bins,
        audible = summary.audible_bins,
        "immission computed"
    );
    summary
}

/// Fill one receiver's bins.  Returns the number of audible bins.
fn propagate_receiver(
    receiver:    &mut Receiver,
    emissions:   &EmissionLevels,
    attenuation: &dyn AttenuationModel,
    clock:       &BinClock,
) -> usize {
    let floor = emissions.silence_floor_db();
    let mut audible = 0;

    for bin in clock.bins() {
        let mut isolated: BTreeMap<LinkId, f64> = BTreeMap::new();
        for rl in receiver.relevant_links() {
            let emission = emissions.level_db(rl.link, bin);
            if emission > floor {
                isolated.insert(rl.link, emission + attenuation.attenuation_db(rl));
            }
        }

        let level = if isolated.is_empty() {
            floor
        } else {
            audible += 1;
            let sum = energetic_sum(isolated.values().copied());
            if sum.is_nan() { floor } else { sum.max(floor) }
        };

        let slot = receiver.state.bin_mut(bin);
        slot.immission_db = Some(level);
        slot.isolated_db = isolated;
    }
    audible
}
