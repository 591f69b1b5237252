use nalgebra as na;

pub type Point = na::Point2<f32>;

pub trait PointExt {
    /// Per-axis tolerance test: both coordinates are within `eps` of `other`. The accepted region
    /// is a square around `other`, not a disk.
    fn is_near(&self, other: &Point, eps: f32) -> bool;

    /// Truncates both coordinates toward zero to a multiple of `resolution`.
    fn snap(&self, resolution: f32) -> Point;
}

impl PointExt for Point {
    #[inline]
    fn is_near(&self, other: &Point, eps: f32) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }

    #[inline]
    fn snap(&self, resolution: f32) -> Point {
        let snap_coord = |coord: f32| (coord / resolution).trunc() * resolution;
        Point::new(snap_coord(self.x), snap_coord(self.y))
    }
}

/// A tree edge in the direction of growth, from `parent` to `child`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub parent: Point,
    pub child: Point,
}

impl Edge {
    pub fn new(parent: Point, child: Point) -> Self {
        Edge { parent, child }
    }

    /// Squared length of the edge.
    #[inline]
    pub fn weight(&self) -> f32 {
        na::distance_squared(&self.parent, &self.child)
    }
}
