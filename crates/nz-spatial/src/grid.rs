//! The receiver grid.
//!
//! # Layout
//!
//! Receivers sit at the centres of a regular lattice with spacing
//! `receiver_gap_m` over the configured bounds (or the network's bounding
//! box), numbered row-major from the south-west corner:
//!
//! ```text
//! y ▲   6  7  8
//!   │   3  4  5
//!   │   0  1  2
//!   └──────────▶ x
//! ```
//!
//! Each receiver's relevant-link set is every link whose segment lies within
//! `hearing_radius_m`.  Construction is a pure function of the network and
//! the config, so identical inputs always give identical grids.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use nz_core::config::GridConfig;
use nz_core::{Bounds, Coord, ReceiverId};

use crate::{Network, Receiver, SpatialError, SpatialResult};

/// R-tree entry for nearest-receiver lookups.
#[derive(Clone)]
struct ReceiverEntry {
    point: [f64; 2],
    id:    ReceiverId,
}

impl RTreeObject for ReceiverEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for ReceiverEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// The set of receivers, owned by the pipeline for the whole run.
pub struct ReceiverGrid {
    /// Indexed by `ReceiverId`.
    receivers:        Vec<Receiver>,
    spatial_idx:      RTree<ReceiverEntry>,
    hearing_radius_m: f64,
}

impl ReceiverGrid {
    /// Lay out a regular grid over the configured bounds and associate links.
    ///
    /// # Errors
    ///
    /// - `SpatialError::Core` if the grid config is invalid.
    /// - `SpatialError::EmptyNetwork` if there are no links.
    /// - `SpatialError::NoLinksInRange` if no receiver hears any link.
    pub fn build(network: &Network, config: &GridConfig) -> SpatialResult<Self> {
        config.validate()?;
        let bounds = match config.bounds {
            Some([min_x, min_y, max_x, max_y]) => Bounds {
                min: Coord::new(min_x, min_y),
                max: Coord::new(max_x, max_y),
            },
            None => network.bounds().ok_or(SpatialError::EmptyNetwork)?,
        };

        let gap = config.receiver_gap_m;
        let nx = ((bounds.width() / gap).ceil() as usize).max(1);
        let ny = ((bounds.height() / gap).ceil() as usize).max(1);

        let mut points = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                points.push(Coord::new(
                    bounds.min.x + gap * (i as f64 + 0.5),
                    bounds.min.y + gap * (j as f64 + 0.5),
                ));
            }
        }
        tracing::debug!(nx, ny, gap, "laying out receiver lattice");
        Self::from_points(network, points, config.hearing_radius_m)
    }

    /// Build a grid from explicitly placed receivers (ids follow `points`
    /// order).
    pub fn from_points(
        network:          &Network,
        points:           Vec<Coord>,
        hearing_radius_m: f64,
    ) -> SpatialResult<Self> {
        if !(hearing_radius_m.is_finite() && hearing_radius_m > 0.0) {
            return Err(nz_core::CoreError::Config(format!(
                "hearing radius must be > 0, got {hearing_radius_m}"
            ))
            .into());
        }
        if network.is_empty() {
            return Err(SpatialError::EmptyNetwork);
        }

        let receivers: Vec<Receiver> = points
            .into_iter()
            .enumerate()
            .map(|(i, coord)| {
                let links = network.links_within(coord, hearing_radius_m);
                Receiver::new(ReceiverId(i as u32), coord, links)
            })
            .collect();

        if receivers.iter().all(Receiver::is_isolated) {
            return Err(SpatialError::NoLinksInRange { radius_m: hearing_radius_m });
        }

        let entries: Vec<ReceiverEntry> = receivers
            .iter()
            .map(|r| ReceiverEntry { point: [r.coord.x, r.coord.y], id: r.id })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        let isolated = receivers.iter().filter(|r| r.is_isolated()).count();
        tracing::info!(
            receivers = receivers.len(),
            isolated,
            hearing_radius_m,
            "receiver grid built"
        );

        Ok(Self { receivers, spatial_idx, hearing_radius_m })
    }

    // ── Access ────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    pub fn hearing_radius_m(&self) -> f64 {
        self.hearing_radius_m
    }

    /// All receivers in id order.
    pub fn receivers(&self) -> &[Receiver] {
        &self.receivers
    }

    /// Mutable receivers in id order.  The relevant-link sets stay read-only.
    pub fn receivers_mut(&mut self) -> &mut [Receiver] {
        &mut self.receivers
    }

    pub fn get(&self, id: ReceiverId) -> Option<&Receiver> {
        self.receivers.get(id.index())
    }

    pub fn get_mut(&mut self, id: ReceiverId) -> Option<&mut Receiver> {
        self.receivers.get_mut(id.index())
    }

    /// The receiver closest to `pos`.  `None` only for an empty grid.
    pub fn nearest_receiver(&self, pos: Coord) -> Option<ReceiverId> {
        self.spatial_idx.nearest_neighbor(&[pos.x, pos.y]).map(|e| e.id)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Clear every receiver's per-iteration state.
    pub fn reset(&mut self) {
        for r in &mut self.receivers {
            r.state.clear();
        }
    }

    /// `true` if no receiver carries any per-iteration state.
    pub fn is_reset(&self) -> bool {
        self.receivers.iter().all(|r| r.state.is_empty())
    }
}
