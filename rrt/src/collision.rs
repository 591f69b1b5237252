use crate::obstacle::{BBox, Obstacle, Segment};
use crate::point::Point;

/// Twice the signed area of the triangle `p`, `q`, `r`. Positive when the triangle turns
/// counter-clockwise.
#[inline]
pub fn area(p: &Point, q: &Point, r: &Point) -> f32 {
    (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
}

// Whether the intervals [a, b] and [c, d] overlap, in any endpoint order.
#[inline]
fn intervals_overlap(mut a: f32, mut b: f32, mut c: f32, mut d: f32) -> bool {
    if a > b {
        std::mem::swap(&mut a, &mut b);
    }
    if c > d {
        std::mem::swap(&mut c, &mut d);
    }
    a.max(c) <= b.min(d)
}

/// Whether the segment `a1`-`a2` touches the segment `b1`-`b2`. Touching endpoints and collinear
/// overlap count as intersections.
pub fn segments_intersect(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> bool {
    intervals_overlap(a1.x, a2.x, b1.x, b2.x)
        && intervals_overlap(a1.y, a2.y, b1.y, b2.y)
        && area(a1, a2, b1) * area(a1, a2, b2) <= 0.0
        && area(b1, b2, a1) * area(b1, b2, a2) <= 0.0
}

/// Whether the segment `p`-`q` touches any of the boundary segments of `obstacle`.
pub fn segment_intersects_obstacle<O>(p: &Point, q: &Point, obstacle: &O) -> bool
where
    O: Obstacle + ?Sized,
{
    obstacle
        .segments()
        .iter()
        .any(|Segment { start, end }| segments_intersect(p, q, start, end))
}

/// The configuration space of a planning episode: bounds and obstacles. It doesn't change while
/// an episode runs, so several episodes may share it.
pub struct Environment {
    bounds: BBox,
    obstacles: Vec<Box<dyn Obstacle>>,
}

impl Environment {
    pub fn new(bounds: BBox) -> Self {
        Environment {
            bounds,
            obstacles: Vec::new(),
        }
    }

    pub fn with_obstacle(mut self, obstacle: impl Obstacle + 'static) -> Self {
        self.add_obstacle(obstacle);
        self
    }

    pub fn add_obstacle(&mut self, obstacle: impl Obstacle + 'static) {
        self.obstacles.push(Box::new(obstacle));
    }

    pub fn extend_obstacles<O, I>(mut self, obstacles: I) -> Self
    where
        O: Obstacle + 'static,
        I: IntoIterator<Item = O>,
    {
        self.obstacles
            .extend(obstacles.into_iter().map(|o| Box::new(o) as Box<dyn Obstacle>));
        self
    }

    pub fn bounds(&self) -> &BBox {
        &self.bounds
    }

    pub fn obstacles(&self) -> &[Box<dyn Obstacle>] {
        &self.obstacles
    }

    /// Whether the tree may grow an edge from `from` to `to`: `to` must be strictly inside the
    /// bounds and the edge must not touch any obstacle.
    pub fn is_move_allowed(&self, from: &Point, to: &Point) -> bool {
        self.bounds.contains(to)
            && !self
                .obstacles
                .iter()
                .any(|obstacle| segment_intersects_obstacle(from, to, obstacle))
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("bounds", &self.bounds)
            .field("obstacles", &self.obstacles.len())
            .finish()
    }
}
