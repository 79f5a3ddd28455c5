//! The corridor road network.
//!
//! A 2 km straight arterial along the x axis, split into four 500 m
//! segments.  Each segment has a forward (west → east) and a backward link:
//!
//! ```text
//!   x = 0      500     1000     1500     2000
//!       ●───1───●───2───●───3───●───4───●     forward
//!       ●──101──●──102──●──103──●──104──●     backward
//! ```

use nz_core::{Coord, LinkId};
use nz_spatial::{Network, NetworkBuilder, SpatialResult};

pub const SEGMENT_M: f64 = 500.0;
pub const SEGMENTS:  u32 = 4;

/// Total corridor length.
pub const LENGTH_M: f64 = SEGMENT_M * SEGMENTS as f64;

pub fn forward(segment: u32) -> LinkId {
    LinkId(1 + segment)
}

pub fn backward(segment: u32) -> LinkId {
    LinkId(101 + segment)
}

/// Segment containing `x`, clamped to the corridor.
pub fn segment_of(x: f64) -> u32 {
    ((x.max(0.0) / SEGMENT_M) as u32).min(SEGMENTS - 1)
}

pub fn build_network() -> SpatialResult<Network> {
    let mut b = NetworkBuilder::with_capacity(2 * SEGMENTS as usize);
    for s in 0..SEGMENTS {
        let a = Coord::new(s as f64 * SEGMENT_M, 0.0);
        let z = Coord::new((s + 1) as f64 * SEGMENT_M, 0.0);
        b.add_road(forward(s), backward(s), a, z);
    }
    b.build()
}
