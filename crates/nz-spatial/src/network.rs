//! Link network representation and builder.
//!
//! # Data layout
//!
//! Links are stored in a `Vec` sorted by `LinkId`; lookups are binary
//! searches.  The outer simulation's link ids may be sparse, so they are not
//! used as direct indices.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) holds one segment per link.  Used at grid
//! construction to find every link within the hearing radius of a receiver.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use nz_core::{Bounds, Coord, LinkId};

use crate::{SpatialError, SpatialResult};

// ── R-tree segment entry ──────────────────────────────────────────────────────

/// Entry stored in the R-tree: a straight link segment.
#[derive(Clone)]
struct LinkSegment {
    from: [f64; 2],
    to:   [f64; 2],
    id:   LinkId,
}

impl RTreeObject for LinkSegment {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.from, self.to)
    }
}

impl PointDistance for LinkSegment {
    /// Squared shortest distance from `point` to the segment.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let p = Coord::new(point[0], point[1]);
        let d = p.distance_to_segment_m(
            Coord::new(self.from[0], self.from[1]),
            Coord::new(self.to[0], self.to[1]),
        );
        d * d
    }
}

// ── Link ──────────────────────────────────────────────────────────────────────

/// A directed, straight road segment.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub id:       LinkId,
    pub from:     Coord,
    pub to:       Coord,
    pub length_m: f64,
}

/// A link heard by a receiver, with the geometry the attenuation model needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkProximity {
    pub link:       LinkId,
    /// Shortest receiver-to-segment distance in metres.
    pub distance_m: f64,
    /// Angle under which the segment is seen from the receiver (0–180°).
    pub angle_deg:  f64,
}

// ── Network ───────────────────────────────────────────────────────────────────

/// Read-only road network: link geometry plus a segment R-tree.
///
/// Do not construct directly; use [`NetworkBuilder`].
pub struct Network {
    /// Links sorted ascending by id.
    links:       Vec<Link>,
    spatial_idx: RTree<LinkSegment>,
}

impl Network {
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// All links in ascending id order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links
            .binary_search_by_key(&id, |l| l.id)
            .ok()
            .map(|i| &self.links[i])
    }

    pub fn contains_link(&self, id: LinkId) -> bool {
        self.link(id).is_some()
    }

    /// Bounding box of all link end points, `None` for an empty network.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(self.links.iter().flat_map(|l| [l.from, l.to]))
    }

    /// Every link whose segment lies within `radius_m` of `pos`, sorted by
    /// link id so the result is independent of R-tree layout.
    pub fn links_within(&self, pos: Coord, radius_m: f64) -> Vec<LinkProximity> {
        let mut found: Vec<LinkProximity> = self
            .spatial_idx
            .locate_within_distance([pos.x, pos.y], radius_m * radius_m)
            .map(|seg| {
                let a = Coord::new(seg.from[0], seg.from[1]);
                let b = Coord::new(seg.to[0], seg.to[1]);
                LinkProximity {
                    link:       seg.id,
                    distance_m: pos.distance_to_segment_m(a, b),
                    angle_deg:  pos.viewing_angle_deg(a, b),
                }
            })
            .collect();
        found.sort_unstable_by_key(|p| p.link);
        found
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`Network`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use nz_core::{Coord, LinkId};
/// use nz_spatial::NetworkBuilder;
///
/// let mut b = NetworkBuilder::new();
/// b.add_link(LinkId(1), Coord::new(0.0, 0.0), Coord::new(500.0, 0.0));
/// b.add_link(LinkId(2), Coord::new(500.0, 0.0), Coord::new(0.0, 0.0));
/// let net = b.build().unwrap();
/// assert_eq!(net.link_count(), 2);
/// ```
#[derive(Default)]
pub struct NetworkBuilder {
    links: Vec<Link>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(links: usize) -> Self {
        Self { links: Vec::with_capacity(links) }
    }

    /// Add a straight directed link from `from` to `to`.
    pub fn add_link(&mut self, id: LinkId, from: Coord, to: Coord) -> &mut Self {
        self.links.push(Link { id, from, to, length_m: from.distance_m(to) });
        self
    }

    /// Convenience: add both directions of a road as two links.
    pub fn add_road(&mut self, forward: LinkId, backward: LinkId, a: Coord, b: Coord) -> &mut Self {
        self.add_link(forward, a, b);
        self.add_link(backward, b, a)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Consume the builder and produce a [`Network`].
    ///
    /// Time complexity: O(L log L) for the sort and the R-tree bulk load.
    pub fn build(self) -> SpatialResult<Network> {
        let mut links = self.links;
        links.sort_unstable_by_key(|l| l.id);
        if let Some(w) = links.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(SpatialError::DuplicateLink(w[0].id));
        }

        // Bulk-load R-tree for O(N log N) construction (faster than N inserts).
        let entries: Vec<LinkSegment> = links
            .iter()
            .map(|l| LinkSegment {
                from: [l.from.x, l.from.y],
                to:   [l.to.x, l.to.y],
                id:   l.id,
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        Ok(Network { links, spatial_idx })
    }
}
