//! Planar coordinate type and segment geometry.
//!
//! Network and receiver coordinates are projected (e.g. UTM) and measured in
//! metres, so plain Euclidean geometry is exact enough for noise propagation
//! distances of a few hundred metres.

/// A projected coordinate in metres.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in metres.
    #[inline]
    pub fn distance_m(self, other: Coord) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Shortest distance from `self` to the segment `a`–`b`.
    ///
    /// A degenerate segment (`a == b`) is treated as a point.
    pub fn distance_to_segment_m(self, a: Coord, b: Coord) -> f64 {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len_2 = dx * dx + dy * dy;
        if len_2 == 0.0 {
            return self.distance_m(a);
        }
        let t = (((self.x - a.x) * dx + (self.y - a.y) * dy) / len_2).clamp(0.0, 1.0);
        self.distance_m(Coord::new(a.x + t * dx, a.y + t * dy))
    }

    /// Angle in degrees (0–180) under which the segment `a`–`b` is seen from
    /// `self`.
    ///
    /// Returns 180 when `self` lies on the segment.
    pub fn viewing_angle_deg(self, a: Coord, b: Coord) -> f64 {
        let (ax, ay) = (a.x - self.x, a.y - self.y);
        let (bx, by) = (b.x - self.x, b.y - self.y);
        let na = ax.hypot(ay);
        let nb = bx.hypot(by);
        if na == 0.0 || nb == 0.0 {
            return 180.0;
        }
        let cos = ((ax * bx + ay * by) / (na * nb)).clamp(-1.0, 1.0);
        cos.acos().to_degrees()
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Axis-aligned bounding box in projected metres.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min: Coord,
    pub max: Coord,
}

impl Bounds {
    /// The smallest box containing every point, or `None` for an empty input.
    pub fn enclosing(points: impl IntoIterator<Item = Coord>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let mut b = Bounds { min: first, max: first };
        for p in it {
            b.min.x = b.min.x.min(p.x);
            b.min.y = b.min.y.min(p.y);
            b.max.x = b.max.x.max(p.x);
            b.max.y = b.max.y.max(p.y);
        }
        Some(b)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}
