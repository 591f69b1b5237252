use tracing::{debug, info};

use crate::collision::Environment;
use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::point::{Edge, Point, PointExt};
use crate::sampler::Sampler;
use crate::tree::PlanningTree;
use crate::Path;

/// Counters of a planning episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpisodeStats {
    /// Candidates drawn so far.
    pub attempts: usize,
    /// Candidates that made it into the tree.
    pub successes: usize,
}

impl EpisodeStats {
    /// Percentage of the attempts that grew the tree.
    pub fn success_rate(&self) -> f32 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f32 / self.attempts as f32 * 100.0
        }
    }
}

/// What happened in one iteration of the planner.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The candidate was thrown away.
    Rejected { base: Point, candidate: Point },
    /// The candidate was added to the tree through `edge`.
    Accepted { base: Point, edge: Edge },
    /// The candidate was added and is close enough to the goal. The episode is over.
    Reached { base: Point, edge: Edge, path: Path },
    /// The attempt budget ran out. The episode is over.
    Exhausted,
}

impl Step {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Reached { .. } | Step::Exhausted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The path from start to goal, `None` if the episode ran out of attempts.
    pub path: Option<Path>,
    pub stats: EpisodeStats,
}

impl Outcome {
    /// Number of vertices of the path, zero when no path was found.
    pub fn path_len(&self) -> usize {
        self.path.as_ref().map(Path::len).unwrap_or(0)
    }
}

/// A single planning episode. Grows a tree from `start` until one of its vertices lands within the
/// goal tolerance, or until the attempt budget runs out.
///
/// Every iteration the tree grows from the vertex nearest to the goal, sampling around it with a
/// deviation proportional to its distance to the goal. Every `stuck_interval` attempts the planner
/// switches to escape mode for `escape_attempts` iterations, in which it grows from the newest
/// vertex instead. That shakes the search out of pockets in front of obstacles.
pub struct Planner<'e, S> {
    env: &'e Environment,
    config: PlannerConfig,
    sampler: S,
    tree: PlanningTree,
    goal: Point,
    stats: EpisodeStats,
    escape: bool,
    escape_count: usize,
    last_base: Option<Point>,
    terminal: Option<Step>,
}

impl<'e, S: Sampler> Planner<'e, S> {
    pub fn new(
        env: &'e Environment,
        start: Point,
        goal: Point,
        config: PlannerConfig,
        sampler: S,
    ) -> Self {
        Planner {
            env,
            config,
            sampler,
            tree: PlanningTree::with_root(start),
            goal,
            stats: EpisodeStats::default(),
            escape: false,
            escape_count: 0,
            last_base: None,
            terminal: None,
        }
    }

    pub fn tree(&self) -> &PlanningTree {
        &self.tree
    }

    pub fn environment(&self) -> &Environment {
        self.env
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn goal(&self) -> Point {
        self.goal
    }

    pub fn stats(&self) -> EpisodeStats {
        self.stats
    }

    pub fn is_escaping(&self) -> bool {
        self.escape
    }

    /// The vertex the last iteration grew from.
    pub fn last_base(&self) -> Option<Point> {
        self.last_base
    }

    pub fn is_finished(&self) -> bool {
        self.terminal.is_some()
    }

    /// Runs a single iteration. Once the episode is over, the final step is returned again.
    pub fn step(&mut self) -> Result<Step, PlanError> {
        if let Some(terminal) = &self.terminal {
            return Ok(terminal.clone());
        }

        let (dist_to_goal, nearest_to_goal) = self.tree.nearest(&self.goal)?;
        let base = self.choose_base(nearest_to_goal)?;
        self.last_base = Some(base);

        let mut candidate = self.sampler.sample(&base, dist_to_goal / self.config.spread_divisor)?;
        if self.config.resolution > 0.0 {
            candidate = candidate.snap(self.config.resolution);
        }

        self.stats.attempts += 1;
        self.check_stuck();
        if self.stats.attempts > self.config.max_attempts {
            info!(attempts = self.stats.attempts, vertices = self.tree.len(), "no path found");
            return Ok(self.finish(Step::Exhausted));
        }

        let rejected = Step::Rejected { base, candidate };

        // A candidate on top of its base would make a zero length edge.
        if candidate == base || !self.env.is_move_allowed(&base, &candidate) {
            return Ok(rejected);
        }

        // The new vertex hangs from whichever vertex is closest to it, which may not be the base.
        let (_, nearest_idx) = self.tree.nearest(&candidate)?;
        let nearest = self.tree.vertex_at(nearest_idx as isize)?;
        if nearest == candidate || !self.env.is_move_allowed(&nearest, &candidate) {
            return Ok(rejected);
        }

        let idx = self.tree.insert_vertex(candidate);
        self.tree.insert_edge(nearest_idx, idx)?;
        self.stats.successes += 1;
        let edge = Edge::new(nearest, candidate);

        if candidate.is_near(&self.goal, self.config.goal_tolerance) {
            let mut waypoints = self.tree.path_to_root(idx)?;
            waypoints.reverse();
            let path = Path::new(waypoints);
            info!(
                attempts = self.stats.attempts,
                vertices = self.tree.len(),
                path_len = path.len(),
                "goal reached"
            );
            return Ok(self.finish(Step::Reached { base, edge, path }));
        }

        Ok(Step::Accepted { base, edge })
    }

    /// Runs iterations until the episode is over.
    pub fn run(&mut self) -> Result<Outcome, PlanError> {
        loop {
            match self.step()? {
                Step::Reached { path, .. } => {
                    return Ok(Outcome {
                        path: Some(path),
                        stats: self.stats,
                    })
                }
                Step::Exhausted => {
                    return Ok(Outcome {
                        path: None,
                        stats: self.stats,
                    })
                }
                Step::Rejected { .. } | Step::Accepted { .. } => {}
            }
        }
    }

    fn choose_base(&mut self, nearest_to_goal: usize) -> Result<Point, PlanError> {
        if !self.escape {
            return Ok(self.tree.vertex_at(nearest_to_goal as isize)?);
        }

        self.escape_count += 1;
        if self.escape_count >= self.config.escape_attempts {
            debug!(attempts = self.stats.attempts, "escape mode off");
            self.escape = false;
            self.escape_count = 0;
        }

        Ok(self.tree.vertex_at(-1)?)
    }

    fn check_stuck(&mut self) {
        let interval = self.config.stuck_interval;
        if self.escape || interval == 0 || self.stats.attempts % interval != 0 {
            return;
        }

        if self.config.escape_attempts > 0 {
            debug!(attempts = self.stats.attempts, "escape mode on");
            self.escape = true;
            self.escape_count = 0;
        }

        if self.config.stuck_prune > 0 {
            debug!(removed = self.config.stuck_prune, "pruning newest vertices");
            self.tree.prune_last(self.config.stuck_prune);
        }
    }

    fn finish(&mut self, step: Step) -> Step {
        self.terminal = Some(step.clone());
        step
    }
}

#[cfg(test)]
mod test {
    use std::collections::VecDeque;

    use nalgebra as na;

    use super::*;
    use crate::error::SamplerError;
    use crate::obstacle::{BBox, Polygon};
    use crate::sampler::GaussianSampler;

    fn point2(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    fn open_env() -> Environment {
        Environment::new(BBox::new(point2(0.0, 0.0), point2(100.0, 100.0)))
    }

    // Answers with the scripted offsets from the base, then keeps returning the base itself.
    struct ScriptedSampler {
        offsets: VecDeque<na::Vector2<f32>>,
        requests: Vec<(Point, f32)>,
    }

    impl ScriptedSampler {
        fn new(offsets: impl IntoIterator<Item = (f32, f32)>) -> Self {
            ScriptedSampler {
                offsets: offsets.into_iter().map(|(x, y)| na::Vector2::new(x, y)).collect(),
                requests: Vec::new(),
            }
        }
    }

    impl Sampler for ScriptedSampler {
        fn sample(&mut self, base: &Point, spread: f32) -> Result<Point, SamplerError> {
            self.requests.push((*base, spread));
            Ok(self.offsets.pop_front().map(|offset| base + offset).unwrap_or(*base))
        }
    }

    #[test]
    fn test_scripted_episode() {
        let env = open_env();
        let mut sampler = ScriptedSampler::new([(10.0, 10.0), (10.0, 10.0), (0.0, 0.0)]);
        let mut planner = Planner::new(
            &env,
            point2(10.0, 10.0),
            point2(33.0, 31.0),
            PlannerConfig::default(),
            &mut sampler,
        );

        let first = planner.step().unwrap();
        assert_eq!(
            first,
            Step::Accepted {
                base: point2(10.0, 10.0),
                edge: Edge::new(point2(10.0, 10.0), point2(20.0, 20.0)),
            }
        );

        match planner.step().unwrap() {
            Step::Reached { base, edge, path } => {
                assert_eq!(base, point2(20.0, 20.0));
                assert_eq!(edge, Edge::new(point2(20.0, 20.0), point2(30.0, 30.0)));
                assert_eq!(
                    path.waypoints,
                    vec![point2(10.0, 10.0), point2(20.0, 20.0), point2(30.0, 30.0)]
                );
            }
            other => panic!("expected to reach the goal, got {:?}", other),
        }

        // The episode is over, further steps don't sample anymore.
        assert!(planner.step().unwrap().is_terminal());
        assert!(planner.is_finished());
        assert_eq!(planner.stats(), EpisodeStats { attempts: 2, successes: 2 });
        assert_eq!(planner.stats().success_rate(), 100.0);
        drop(planner);

        // The deviation is a third of the distance from the tree to the goal.
        let expected_spread = na::distance(&point2(10.0, 10.0), &point2(33.0, 31.0)) / 3.0;
        assert_eq!(sampler.requests.len(), 2);
        assert_eq!(sampler.requests[0].1, expected_spread);
    }

    #[test]
    fn test_candidates_are_snapped() {
        let env = open_env();
        let sampler = ScriptedSampler::new([(5.7, -2.2)]);
        let (start, goal) = (point2(50.0, 50.0), point2(90.0, 90.0));
        let mut planner = Planner::new(&env, start, goal, PlannerConfig::default(), sampler);

        match planner.step().unwrap() {
            Step::Accepted { edge, .. } => assert_eq!(edge.child, point2(55.0, 47.0)),
            other => panic!("expected an accepted step, got {:?}", other),
        }
    }

    #[test]
    fn test_rejections() {
        let square = Polygon::from_vertices(vec![
            point2(40.0, 40.0),
            point2(40.0, 60.0),
            point2(60.0, 60.0),
            point2(60.0, 40.0),
        ]);
        let env = open_env().with_obstacle(square);
        // Into the obstacle, out of bounds, and on top of the base.
        let sampler = ScriptedSampler::new([(20.0, 20.0), (-40.0, 0.0), (0.0, 0.0)]);
        let (start, goal) = (point2(30.0, 30.0), point2(90.0, 90.0));
        let mut planner = Planner::new(&env, start, goal, PlannerConfig::default(), sampler);

        for _ in 0..3 {
            assert!(matches!(planner.step().unwrap(), Step::Rejected { .. }));
        }
        assert_eq!(planner.tree().len(), 1);
        assert_eq!(planner.stats(), EpisodeStats { attempts: 3, successes: 0 });
        assert_eq!(planner.stats().success_rate(), 0.0);
    }

    #[test]
    fn test_edge_starts_at_nearest_vertex() {
        // A wall between the root and the goal, the tree has to go around it.
        let wall = Polygon::from_vertices(vec![point2(50.0, 10.0), point2(50.0, 70.0)]);
        let env = open_env().with_obstacle(wall);
        let sampler = ScriptedSampler::new([
            (0.0, 40.0),  // (20, 60) from the root
            (0.0, 10.0),  // (20, 30) from the root, the new vertex closest to the goal
            (30.0, 40.0), // (50, 70) from (20, 30) touches the wall
            (0.0, 45.0),  // (20, 75) from (20, 30), nearest vertex is (20, 60)
        ]);
        let (start, goal) = (point2(20.0, 20.0), point2(80.0, 30.0));
        let mut planner = Planner::new(&env, start, goal, PlannerConfig::default(), sampler);

        assert!(matches!(planner.step().unwrap(), Step::Accepted { .. }));
        assert!(matches!(planner.step().unwrap(), Step::Accepted { .. }));
        assert_eq!(planner.step().unwrap(), Step::Rejected {
            base: point2(20.0, 30.0),
            candidate: point2(50.0, 70.0),
        });
        match planner.step().unwrap() {
            Step::Accepted { base, edge } => {
                assert_eq!(base, point2(20.0, 30.0));
                assert_eq!(edge, Edge::new(point2(20.0, 60.0), point2(20.0, 75.0)));
            }
            other => panic!("expected an accepted step, got {:?}", other),
        }
        assert_eq!(planner.tree().parent_of(3), Some(1));
    }

    #[test]
    fn test_escape_mode_schedule() {
        let env = open_env();
        let config = PlannerConfig::default()
            .with_stuck_interval(10)
            .with_escape_attempts(3)
            .with_max_attempts(100);
        // Everything after the first two candidates is degenerate and gets rejected.
        let sampler = ScriptedSampler::new([(0.0, 10.0), (0.0, 20.0)]);
        let (start, goal) = (point2(10.0, 10.0), point2(90.0, 10.0));
        let mut planner = Planner::new(&env, start, goal, config, sampler);

        let mut escaping_after = Vec::new();
        let mut bases = Vec::new();
        for _ in 0..25 {
            planner.step().unwrap();
            escaping_after.push(planner.is_escaping());
            bases.push(planner.last_base().unwrap());
        }

        let expected: Vec<bool> = (1..=25)
            .map(|i| (10..=12).contains(&i) || (20..=22).contains(&i))
            .collect();
        assert_eq!(escaping_after, expected);

        // Escape iterations grow from the newest vertex, the others from the one nearest the goal.
        let newest = point2(10.0, 30.0);
        let closest = point2(10.0, 10.0);
        for (i, base) in bases.iter().enumerate().skip(2) {
            let step = i + 1;
            let escaped = (11..=13).contains(&step) || (21..=23).contains(&step);
            assert_eq!(*base, if escaped { newest } else { closest }, "step {}", step);
        }
    }

    #[test]
    fn test_exhausted() {
        let env = open_env();
        let config = PlannerConfig::default().with_max_attempts(20);
        let sampler = ScriptedSampler::new([]);
        let (start, goal) = (point2(10.0, 10.0), point2(90.0, 90.0));
        let mut planner = Planner::new(&env, start, goal, config, sampler);

        let outcome = planner.run().unwrap();

        assert_eq!(outcome.path, None);
        assert_eq!(outcome.path_len(), 0);
        assert_eq!(outcome.stats.attempts, 21);
        assert_eq!(outcome.stats.successes, 0);
        assert_eq!(planner.step().unwrap(), Step::Exhausted);
    }

    #[test]
    fn test_stuck_prune() {
        let env = open_env();
        let config = PlannerConfig::default()
            .with_stuck_interval(5)
            .with_escape_attempts(1)
            .with_stuck_prune(2);
        let sampler = ScriptedSampler::new([(1.0, 0.0), (1.0, 0.0), (1.0, 0.0), (1.0, 0.0)]);
        let (start, goal) = (point2(10.0, 10.0), point2(90.0, 10.0));
        let mut planner = Planner::new(&env, start, goal, config, sampler);

        for _ in 0..4 {
            assert!(matches!(planner.step().unwrap(), Step::Accepted { .. }));
        }
        assert_eq!(planner.tree().len(), 5);

        // The fifth attempt turns on escape mode and drops the two newest vertices.
        planner.step().unwrap();
        assert_eq!(planner.tree().len(), 3);
        assert_eq!(planner.tree().vertex_at(-1), Ok(point2(12.0, 10.0)));
    }

    #[test]
    fn test_random_episode_under_wall() {
        // A wall hanging from the top of the domain, the way to the goal goes under it.
        let wall = Polygon::from_vertices(vec![
            point2(400.0, 150.0),
            point2(400.0, 399.0),
            point2(500.0, 399.0),
            point2(500.0, 150.0),
        ]);
        let bounds = BBox::new(point2(0.0, 0.0), point2(1000.0, 400.0));
        let env = Environment::new(bounds).with_obstacle(wall);
        let start = point2(100.0, 100.0);
        let goal = point2(900.0, 100.0);

        for seed in 0..3 {
            let sampler = GaussianSampler::seeded(seed);
            let mut planner = Planner::new(&env, start, goal, PlannerConfig::default(), sampler);
            let outcome = planner.run().unwrap();
            let path = outcome.path.as_ref().expect("a path under the wall");

            assert_eq!(path.waypoints[0], start);
            assert!(path.waypoints[path.len() - 1].is_near(&goal, 5.0));
            for pair in path.waypoints.windows(2) {
                assert!(env.is_move_allowed(&pair[0], &pair[1]));
            }
            assert_eq!(outcome.stats.successes, planner.tree().len() - 1);
            assert_eq!(outcome.path_len(), path.len());
        }
    }
}
