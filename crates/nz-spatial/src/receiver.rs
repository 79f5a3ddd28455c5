//! Receivers and their per-iteration state.
//!
//! A receiver has two halves with different lifetimes:
//!
//! - **Static**: id, coordinate and the set of links within hearing radius.
//!   Fixed at grid construction; only readable afterwards.
//! - **Per-iteration**: [`ReceiverState`], a `TimeBin → ReceiverBin` map
//!   filled by the activity, immission and damage stages.  Cleared in full
//!   before every iteration's event collection.

use std::collections::BTreeMap;

use nz_core::{Coord, LinkId, PersonId, ReceiverId, TimeBin};

use crate::network::LinkProximity;

/// A link within hearing radius of a receiver.
pub type RelevantLink = LinkProximity;

// ── PresenceRecord ────────────────────────────────────────────────────────────

/// One person's presence at a receiver during one time bin.
#[derive(Clone, Debug, PartialEq)]
pub struct PresenceRecord {
    pub person:         PersonId,
    pub activity_type:  String,
    /// Seconds of the bin the person spent at the activity.
    pub duration_secs:  u64,
    /// Exposure weight: activity weight × share of the bin × scale factor.
    pub affected_units: f64,
    /// The activity interval was opened or closed artificially (missing
    /// start or end event).
    pub partial:        bool,
}

// ── ReceiverBin ───────────────────────────────────────────────────────────────

/// Everything computed for one receiver in one time bin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReceiverBin {
    /// Presence records, in the order the activity tracker produced them.
    pub presence:             Vec<PresenceRecord>,
    /// Sum of `affected_units` over `presence`.
    pub affected_units:       f64,
    /// Damage cost divided by `affected_units` (0 if none).
    pub damage_cost_per_unit: f64,
    /// Total monetised damage at this receiver in this bin.
    pub damage_cost:          f64,
    /// Combined immission level; `None` until the immission stage has run.
    pub immission_db:         Option<f64>,
    /// Isolated immission contribution of every audible link.
    pub isolated_db:          BTreeMap<LinkId, f64>,
}

// ── ReceiverState ─────────────────────────────────────────────────────────────

/// Per-iteration mutable state of one receiver.
#[derive(Clone, Debug, Default)]
pub struct ReceiverState {
    bins: BTreeMap<TimeBin, ReceiverBin>,
}

impl ReceiverState {
    pub fn bin(&self, bin: TimeBin) -> Option<&ReceiverBin> {
        self.bins.get(&bin)
    }

    /// Mutable access, creating an empty bin on first use.
    pub fn bin_mut(&mut self, bin: TimeBin) -> &mut ReceiverBin {
        self.bins.entry(bin).or_default()
    }

    /// Bins in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (TimeBin, &ReceiverBin)> {
        self.bins.iter().map(|(b, v)| (*b, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TimeBin, &mut ReceiverBin)> {
        self.bins.iter_mut().map(|(b, v)| (*b, v))
    }

    /// Immission level in `bin`, if computed.
    pub fn immission_db(&self, bin: TimeBin) -> Option<f64> {
        self.bins.get(&bin).and_then(|b| b.immission_db)
    }

    /// Drop every per-bin field.
    pub fn clear(&mut self) {
        self.bins.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

// ── Receiver ──────────────────────────────────────────────────────────────────

/// A fixed point where noise exposure is evaluated.
#[derive(Clone, Debug)]
pub struct Receiver {
    pub id:         ReceiverId,
    pub coord:      Coord,
    relevant_links: Box<[RelevantLink]>,
    /// Per-iteration state; see the module docs.
    pub state:      ReceiverState,
}

impl Receiver {
    pub(crate) fn new(id: ReceiverId, coord: Coord, relevant_links: Vec<RelevantLink>) -> Self {
        Self {
            id,
            coord,
            relevant_links: relevant_links.into_boxed_slice(),
            state: ReceiverState::default(),
        }
    }

    /// Links within hearing radius, ascending by link id.
    pub fn relevant_links(&self) -> &[RelevantLink] {
        &self.relevant_links
    }

    /// `true` if no link is within hearing radius.
    pub fn is_isolated(&self) -> bool {
        self.relevant_links.is_empty()
    }
}
