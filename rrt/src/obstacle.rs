use std::borrow::Cow;
use std::f32::consts::TAU;

use itertools::Itertools;
use nalgebra as na;

use crate::point::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Segment { start, end }
    }
}

impl From<(Point, Point)> for Segment {
    fn from((start, end): (Point, Point)) -> Self {
        Segment::new(start, end)
    }
}

/// Anything that blocks motion. The only thing the collision checks need from an obstacle is its
/// boundary, given as a sequence of segments.
pub trait Obstacle {
    fn segments(&self) -> Cow<'_, [Segment]>;
}

impl<T: Obstacle + ?Sized> Obstacle for &T {
    #[inline(always)]
    fn segments(&self) -> Cow<'_, [Segment]> {
        (**self).segments()
    }
}

impl<T: Obstacle + ?Sized> Obstacle for Box<T> {
    #[inline(always)]
    fn segments(&self) -> Cow<'_, [Segment]> {
        (**self).segments()
    }
}

/// Axis aligned bounds of the configuration space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_corner: Point,
    pub max_corner: Point,
}

impl BBox {
    pub fn new(min_corner: Point, max_corner: Point) -> BBox {
        BBox {
            min_corner,
            max_corner,
        }
    }

    /// Whether `p` lies strictly inside the box. Points on the border are outside.
    pub fn contains(&self, p: &Point) -> bool {
        itertools::izip!(p.iter(), self.min_corner.iter(), self.max_corner.iter())
            .all(|(&coord, &min, &max)| min < coord && coord < max)
    }
}

/// A closed polygon boundary. The segments must be given in traversal order, each one starting
/// where the previous one ended. This is assumed, never checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    segments: Vec<Segment>,
}

impl Polygon {
    /// Builds the boundary from pairs of adjacent vertices, closing it with one extra segment from
    /// the end of the last pair back to the start of the first. `N` pairs produce `N + 1`
    /// segments.
    ///
    /// # Panics
    ///
    /// Panics if `pairs` is empty.
    pub fn new<I>(pairs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Segment>,
    {
        let mut segments: Vec<Segment> = pairs.into_iter().map(Into::into).collect();
        assert!(!segments.is_empty(), "a polygon needs at least one pair of vertices");

        let closing = Segment::new(segments[segments.len() - 1].end, segments[0].start);
        segments.push(closing);

        Polygon { segments }
    }

    /// Builds the polygon from its vertices in boundary order.
    ///
    /// # Panics
    ///
    /// Panics if there are less than two vertices.
    pub fn from_vertices<I>(vertices: I) -> Self
    where
        I: IntoIterator<Item = Point>,
    {
        Polygon::new(vertices.into_iter().tuple_windows::<(Point, Point)>())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn vertices(&self) -> impl Iterator<Item = Point> + ExactSizeIterator + '_ {
        self.segments.iter().map(|segment| segment.start)
    }
}

impl Obstacle for Polygon {
    fn segments(&self) -> Cow<'_, [Segment]> {
        Cow::Borrowed(&self.segments)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub corner: Point,
    pub size: na::Vector2<f32>,
}

impl Rectangle {
    pub fn new(corner: Point, size: na::Vector2<f32>) -> Self {
        Self { corner, size }
    }

    /// The four corners in boundary order, starting at `corner`.
    pub fn vertices(&self) -> [Point; 4] {
        [
            self.corner,
            Point::new(self.corner.x, self.corner.y + self.size.y),
            self.corner + self.size,
            Point::new(self.corner.x + self.size.x, self.corner.y),
        ]
    }
}

impl Obstacle for Rectangle {
    fn segments(&self) -> Cow<'_, [Segment]> {
        Cow::Owned(
            self.vertices()
                .into_iter()
                .circular_tuple_windows::<(Point, Point)>()
                .map(Segment::from)
                .collect(),
        )
    }
}

/// A circle, approximated by the regular polygon inscribed in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f32,
    boundary: Vec<Segment>,
}

impl Circle {
    pub const DEFAULT_SIDES: usize = 32;

    pub fn new(center: Point, radius: f32) -> Self {
        Circle::with_sides(center, radius, Circle::DEFAULT_SIDES)
    }

    /// # Panics
    ///
    /// Panics if `sides` is less than 3.
    pub fn with_sides(center: Point, radius: f32, sides: usize) -> Self {
        assert!(sides >= 3, "a circle needs at least 3 sides, but got {}", sides);

        let boundary = (0..sides)
            .map(|i| {
                let angle = TAU * i as f32 / sides as f32;
                center + na::Vector2::new(angle.cos(), angle.sin()) * radius
            })
            .circular_tuple_windows::<(Point, Point)>()
            .map(Segment::from)
            .collect();

        Circle {
            center,
            radius,
            boundary,
        }
    }
}

impl Obstacle for Circle {
    fn segments(&self) -> Cow<'_, [Segment]> {
        Cow::Borrowed(&self.boundary)
    }
}
