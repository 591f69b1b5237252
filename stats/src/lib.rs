//! Repeated planning episodes and their aggregate statistics.

use std::fmt;

use statrs::statistics::Statistics;
use tracing::{debug, info};

use rrt2d::{GaussianSampler, Outcome, PlanError, Planner, PlannerConfig};
use rrt2d_scene::Episode;

/// Metrics of a round that found a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundResult {
    /// Number of vertices in the path.
    pub path_len: usize,
    pub attempts: usize,
    /// Percentage of attempts that grew the tree.
    pub success_rate: f32,
}

impl RoundResult {
    /// `None` when the episode ran out of attempts.
    pub fn from_outcome(outcome: &Outcome) -> Option<Self> {
        outcome.path.as_ref().map(|path| RoundResult {
            path_len: path.len(),
            attempts: outcome.stats.attempts,
            success_rate: outcome.stats.success_rate(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Metric {
    /// `None` for an empty sample.
    pub fn of(values: &[f64]) -> Option<Metric> {
        if values.is_empty() {
            return None;
        }

        Some(Metric {
            mean: values.mean(),
            std_dev: values.population_std_dev(),
            min: values.min(),
            max: values.max(),
        })
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean {:.2} std {:.2} min {} max {}",
            self.mean, self.std_dev, self.min, self.max
        )
    }
}

/// Aggregate over a batch of rounds. The metrics only take successful rounds into account and
/// are `None` when every round failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub rounds: usize,
    pub failures: usize,
    pub path_len: Option<Metric>,
    pub attempts: Option<Metric>,
    pub success_rate: Option<Metric>,
}

impl Summary {
    pub fn from_rounds(rounds: &[Option<RoundResult>]) -> Self {
        let found: Vec<&RoundResult> = rounds.iter().flatten().collect();
        let metric = |f: fn(&RoundResult) -> f64| {
            let values: Vec<f64> = found.iter().map(|r| f(r)).collect();
            Metric::of(&values)
        };

        Summary {
            rounds: rounds.len(),
            failures: rounds.len() - found.len(),
            path_len: metric(|r| r.path_len as f64),
            attempts: metric(|r| r.attempts as f64),
            success_rate: metric(|r| r.success_rate as f64),
        }
    }

    /// Fraction of rounds, between 0 and 1, that found no path.
    pub fn fail_fraction(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            self.failures as f64 / self.rounds as f64
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |metric: &Option<Metric>| match metric {
            Some(metric) => metric.to_string(),
            None => "n/a".to_string(),
        };

        writeln!(f, "rounds       {}", self.rounds)?;
        writeln!(f, "path length  {}", show(&self.path_len))?;
        writeln!(f, "attempts     {}", show(&self.attempts))?;
        writeln!(f, "place rate   {}", show(&self.success_rate))?;
        write!(f, "fail         {}", self.fail_fraction())
    }
}

/// Plans `rounds` independent episodes of the same scene. Round `i` samples with seed `seed + i`.
pub fn run_rounds(
    episode: &Episode,
    config: &PlannerConfig,
    rounds: usize,
    seed: u64,
) -> Result<Vec<Option<RoundResult>>, PlanError> {
    config.validate()?;

    (0..rounds)
        .map(|i| {
            let round_seed = seed.wrapping_add(i as u64);
            let outcome = Planner::new(
                &episode.env,
                episode.start,
                episode.goal,
                config.clone(),
                GaussianSampler::seeded(round_seed),
            )
            .run()?;

            let result = RoundResult::from_outcome(&outcome);
            match &result {
                Some(r) => debug!(
                    round = i,
                    seed = round_seed,
                    path_len = r.path_len,
                    attempts = r.attempts,
                    "round done"
                ),
                None => info!(
                    round = i,
                    seed = round_seed,
                    attempts = outcome.stats.attempts,
                    "round failed"
                ),
            }
            Ok(result)
        })
        .collect()
}
