//! Goal-biased RRT planning in a bounded 2D domain with polygonal obstacles.
//!
//! The tree grows from the start, always sampling around the vertex nearest to the goal with a
//! Gaussian whose deviation shrinks as the tree closes in. New vertices are connected to the tree
//! vertex nearest to them, provided the connection stays inside the domain and clear of every
//! obstacle.

pub mod collision;
pub mod config;
pub mod error;
pub mod obstacle;
pub mod planner;
pub mod point;
pub mod sampler;
pub mod tree;

pub use collision::Environment;
pub use config::PlannerConfig;
pub use error::{ConfigError, PlanError, SamplerError, TreeError};
pub use planner::{EpisodeStats, Outcome, Planner, Step};
pub use point::{Edge, Point, PointExt};
pub use sampler::{GaussianSampler, Sampler};
pub use tree::PlanningTree;

use nalgebra as na;

/// A collision free path, from the start to the vertex that reached the goal.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub waypoints: Vec<Point>,
}

impl Path {
    pub fn new(waypoints: Vec<Point>) -> Self {
        Self { waypoints }
    }

    /// Number of vertices in the path.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Sum of the lengths of the path segments.
    pub fn cost(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|pair| na::distance(&pair[0], &pair[1]))
            .sum()
    }
}

/// Plans a single episode with the default Gaussian sampler seeded with `seed`. The configuration
/// is validated first.
pub fn plan(
    env: &Environment,
    start: Point,
    goal: Point,
    config: PlannerConfig,
    seed: u64,
) -> Result<Outcome, PlanError> {
    config.validate()?;
    Planner::new(env, start, goal, config, GaussianSampler::seeded(seed)).run()
}
