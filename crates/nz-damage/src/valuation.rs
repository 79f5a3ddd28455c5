//! The damage stage: value exposure and apportion it to both sides.
//!
//! # Apportioning
//!
//! For every receiver/bin above the audibility threshold with exposed units:
//!
//! - **Affected**: each presence record bears `damage · units / total_units`.
//!   The last record takes the remainder, so the shares sum to the total.
//! - **Caused**: each audible link bears `damage · 10^(Li/10) / Σ 10^(Lj/10)`
//!   of its isolated contribution.  A link's cost, summed over receivers, is
//!   then split over its passages in the bin by single-vehicle energy.
//!
//! Valuation runs receiver by receiver (optionally in parallel); events are
//! emitted afterwards in a fixed order: affected by receiver, bin and record;
//! caused by link, bin and passage sequence.

use std::collections::BTreeMap;

use nz_core::config::DamageConfig;
use nz_core::{BinClock, LinkId, ReceiverId, TimeBin};
use nz_emission::EmissionLevels;
use nz_events::{CostFlow, CostOrigin, CostSink, NoiseCostEvent, Party};
use nz_spatial::{Receiver, ReceiverGrid};

use crate::{DamageError, DamageResult, DoseResponse};

/// Sums over one valuation run, for iteration-end logging.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DamageTotals {
    pub total_damage:    f64,
    pub affected_total:  f64,
    pub caused_total:    f64,
    pub affected_events: usize,
    pub caused_events:   usize,
    /// Receiver/bins with non-zero damage.
    pub exposed_bins:    usize,
}

/// Caused cost per link and bin contributed by one receiver.
type LinkShares = Vec<((LinkId, TimeBin), f64)>;

/// Value every receiver/bin, write damage into the grid and emit affected and
/// caused cost events to `sink`.
///
/// # Errors
///
/// - `DamageError::StageOrder` if any receiver/bin has no immission level.
/// - `DamageError::NonFinite` if the dose-response returns NaN or infinity.
/// - `DamageError::NonFiniteTotal` if the summed damage overflows.
///
/// Nothing is emitted on error.
pub fn calculate_noise_damage_costs(
    grid:      &mut ReceiverGrid,
    emissions: &EmissionLevels,
    dose:      &dyn DoseResponse,
    config:    &DamageConfig,
    clock:     &BinClock,
    sink:      &mut dyn CostSink,
) -> DamageResult<DamageTotals> {
    let threshold = config.audibility_threshold_db;
    let receivers = grid.receivers_mut();

    #[cfg(not(feature = "parallel"))]
    let shares: Vec<LinkShares> = receivers
        .iter_mut()
        .map(|r| value_receiver(r, dose, threshold, clock))
        .collect::<DamageResult<_>>()?;

    #[cfg(feature = "parallel")]
    let shares: Vec<LinkShares> = {
        use rayon::prelude::*;
        receivers
            .par_iter_mut()
            .map(|r| value_receiver(r, dose, threshold, clock))
            .collect::<DamageResult<_>>()?
    };

    let total: f64 = receivers
        .iter()
        .flat_map(|r| r.state.iter().map(|(_, slot)| slot.damage_cost))
        .sum();
    if !total.is_finite() {
        return Err(DamageError::NonFiniteTotal);
    }

    let mut totals = DamageTotals::default();

    // ── Affected ──────────────────────────────────────────────────────────
    for r in receivers.iter() {
        for (bin, slot) in r.state.iter() {
            if slot.damage_cost <= 0.0 {
                continue;
            }
            totals.exposed_bins += 1;
            totals.total_damage += slot.damage_cost;

            let time = clock.bin_start(bin);
            let last = slot.presence.len().saturating_sub(1);
            let mut assigned = 0.0;
            for (i, record) in slot.presence.iter().enumerate() {
                let amount = if i == last {
                    (slot.damage_cost - assigned).max(0.0)
                } else {
                    slot.damage_cost * record.affected_units / slot.affected_units
                };
                assigned += amount;
                totals.affected_total += amount;
                totals.affected_events += 1;
                sink.emit(NoiseCostEvent {
                    flow:   CostFlow::Affected,
                    party:  Party::Person(record.person),
                    amount,
                    time,
                    origin: CostOrigin::Receiver {
                        receiver:      r.id,
                        activity_type: record.activity_type.clone(),
                    },
                });
            }
        }
    }

    // ── Caused ────────────────────────────────────────────────────────────
    let mut per_link: BTreeMap<(LinkId, TimeBin), f64> = BTreeMap::new();
    for receiver_shares in shares {
        for (key, amount) in receiver_shares {
            *per_link.entry(key).or_insert(0.0) += amount;
        }
    }

    for ((link, bin), cost) in per_link {
        let Some(record) = emissions.get(link, bin) else {
            tracing::debug!(%link, %bin, cost, "caused cost on a link without passages");
            continue;
        };
        let passages = &record.passages;
        if passages.is_empty() {
            continue;
        }
        let energy = record.total_energy();
        let last = passages.len() - 1;
        let mut assigned = 0.0;
        for (i, p) in passages.iter().enumerate() {
            let amount = if i == last {
                (cost - assigned).max(0.0)
            } else if energy > 0.0 {
                cost * p.energy / energy
            } else {
                cost / passages.len() as f64
            };
            assigned += amount;
            totals.caused_total += amount;
            totals.caused_events += 1;
            sink.emit(NoiseCostEvent {
                flow:   CostFlow::Caused,
                party:  Party::Vehicle(p.vehicle),
                amount,
                time:   p.time,
                origin: CostOrigin::Link(link),
            });
        }
    }

    tracing::debug!(
        damage = totals.total_damage,
        affected = totals.affected_total,
        caused = totals.caused_total,
        "damage costs computed"
    );
    Ok(totals)
}

/// Fill damage fields of one receiver and return its per-link caused shares.
fn value_receiver(
    receiver:  &mut Receiver,
    dose:      &dyn DoseResponse,
    threshold: f64,
    clock:     &BinClock,
) -> DamageResult<LinkShares> {
    let id: ReceiverId = receiver.id;
    let mut shares = LinkShares::new();

    for bin in clock.bins() {
        let slot = receiver.state.bin_mut(bin);
        let level = slot.immission_db.ok_or(DamageError::StageOrder { receiver: id, bin })?;

        let damage = if level > threshold && slot.affected_units > 0.0 {
            dose.cost(level, slot.affected_units, bin, clock)
        } else {
            0.0
        };
        if !damage.is_finite() {
            return Err(DamageError::NonFinite { receiver: id, bin });
        }

        slot.damage_cost = 0.0;
        slot.damage_cost_per_unit = 0.0;
        if damage <= 0.0 {
            continue;
        }
        slot.damage_cost = damage;
        slot.damage_cost_per_unit = damage / slot.affected_units;

        let power: f64 = slot.isolated_db.values().map(|l| 10f64.powf(l / 10.0)).sum();
        if power > 0.0 {
            for (&link, &l) in &slot.isolated_db {
                shares.push(((link, bin), damage * 10f64.powf(l / 10.0) / power));
            }
        }
    }
    Ok(shares)
}
