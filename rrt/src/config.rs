use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tuning knobs of the planner. Missing fields take their default value when deserializing, and
/// deserialized values should go through [`PlannerConfig::validate`] before planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Per-axis distance at which a new vertex counts as reaching the goal.
    pub goal_tolerance: f32,
    /// The sampling deviation is the distance between the tree and the goal divided by this.
    pub spread_divisor: f32,
    /// Candidates are truncated toward zero to a multiple of this.
    pub resolution: f32,
    /// Number of attempts between two activations of escape mode.
    pub stuck_interval: usize,
    /// Number of iterations escape mode lasts.
    pub escape_attempts: usize,
    /// The episode fails once this many attempts have been exceeded.
    pub max_attempts: usize,
    /// Vertices dropped from the tree every time escape mode is activated. Zero disables pruning.
    pub stuck_prune: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            goal_tolerance: 5.0,
            spread_divisor: 3.0,
            resolution: 1.0,
            stuck_interval: 1000,
            escape_attempts: 200,
            max_attempts: 20_000,
            stuck_prune: 0,
        }
    }
}

fn check(
    field: &'static str,
    value: f32,
    requirement: &'static str,
    ok: bool,
) -> Result<(), ConfigError> {
    if value.is_finite() && ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            requirement,
            value,
        })
    }
}

impl PlannerConfig {
    /// Checks the invariants the `with_*` builders assert.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check(
            "goal_tolerance",
            self.goal_tolerance,
            "finite and not negative",
            self.goal_tolerance >= 0.0,
        )?;
        check(
            "spread_divisor",
            self.spread_divisor,
            "finite and positive",
            self.spread_divisor > 0.0,
        )?;
        check("resolution", self.resolution, "finite and positive", self.resolution > 0.0)?;

        if self.stuck_interval == 0 {
            return Err(ConfigError::ZeroStuckInterval);
        }
        Ok(())
    }

    pub fn with_goal_tolerance(mut self, goal_tolerance: f32) -> Self {
        assert!(
            goal_tolerance >= 0.0,
            "goal tolerance must not be negative, but was {}",
            goal_tolerance
        );
        self.goal_tolerance = goal_tolerance;
        self
    }

    pub fn with_spread_divisor(mut self, spread_divisor: f32) -> Self {
        assert!(
            spread_divisor > 0.0,
            "spread divisor must be positive, but was {}",
            spread_divisor
        );
        self.spread_divisor = spread_divisor;
        self
    }

    pub fn with_resolution(mut self, resolution: f32) -> Self {
        assert!(
            resolution > 0.0,
            "resolution must be positive, but was {}",
            resolution
        );
        self.resolution = resolution;
        self
    }

    pub fn with_stuck_interval(mut self, stuck_interval: usize) -> Self {
        assert!(stuck_interval > 0, "stuck interval must be positive");
        self.stuck_interval = stuck_interval;
        self
    }

    pub fn with_escape_attempts(mut self, escape_attempts: usize) -> Self {
        self.escape_attempts = escape_attempts;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_stuck_prune(mut self, stuck_prune: usize) -> Self {
        self.stuck_prune = stuck_prune;
        self
    }
}
