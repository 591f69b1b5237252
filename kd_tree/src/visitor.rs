use nalgebra as na;

use crate::HasCoords;

macro_rules! impl_default_with_new {
    (impl$(<$($generics:tt),*>)? Default for $($type:tt)*) => {
        impl$(<$($generics),*>)? Default for $($type)* {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// This trait defines an interface for any algorithm query in the KD-Tree. In a
/// KD-Tree, the `query` function takes a visitor that implements this trait as
/// well as a reference point that is used to navigate the tree. In the visitor,
/// parameters this reference point is called `other`.
///
/// The `accept` function may modify the visitor in some way. The only way to
/// get nodes out of the tree is through the accept function, which also receives
/// the insertion index of the point.
///
/// The radius function should return a radius around the reference point that
/// still needs to be searched through. If one wanted to get all of the points in
/// the tree, it would suffice to always return `f32::INFINITY` from `radius`.
///
/// The lifetime `'a` is the lifetime of the KD-Tree.
pub trait Visitor<'a, P, const N: usize> {
    /// The final result of the visitor.
    type Result;

    /// Return the radius around `other` that still has to be searched through.
    /// This function is assumed to be decreasing. If for the same `other` it's
    /// value increases, it is a logic error.
    fn radius(&self, other: &na::Point<f32, N>) -> f32;

    /// Accept the point at `index` of the KD-Tree. `other` is the reference point that is
    /// used to navigate the KD-Tree.
    fn accept(&mut self, index: usize, point: &'a P, other: &na::Point<f32, N>);

    /// Consume the visitor into the final result.
    fn result(self) -> Self::Result;

    /// Calculates the radius squared. May be overwritten for better performance.
    fn radius_sq(&self, other: &na::Point<f32, N>) -> f32 {
        self.radius(other).powi(2)
    }
}

/// A visitor that returns the nearest point to the reference point, along with its index and
/// squared distance. Among points at the same distance the one with the lowest index wins.
pub struct NearestVisitor<'a, P> {
    min: Option<(usize, &'a P, f32)>,
}

impl<'a, P> NearestVisitor<'a, P> {
    pub fn new() -> Self {
        NearestVisitor { min: None }
    }
}

impl<'a, P: HasCoords<N>, const N: usize> Visitor<'a, P, N> for NearestVisitor<'a, P> {
    type Result = Option<(usize, &'a P, f32)>;

    fn radius(&self, other: &na::Point<f32, N>) -> f32 {
        self.radius_sq(other).sqrt()
    }

    fn accept(&mut self, index: usize, point: &'a P, other: &na::Point<f32, N>) {
        let dist_sq = na::distance_squared(&point.point(), other);
        let closer = match self.min {
            Some((min_idx, _, min_dist_sq)) => {
                dist_sq < min_dist_sq || (dist_sq == min_dist_sq && index < min_idx)
            }
            None => true,
        };

        if closer {
            self.min.replace((index, point, dist_sq));
        }
    }

    fn result(self) -> Self::Result {
        self.min
    }

    fn radius_sq(&self, _other: &na::Point<f32, N>) -> f32 {
        self.min
            .map(|(_, _, dist_sq)| dist_sq)
            .unwrap_or(f32::INFINITY)
    }
}

impl_default_with_new! { impl<'a, P> Default for NearestVisitor<'a, P> }
