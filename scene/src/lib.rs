//! Loads planning scenes from JSON files.
//!
//! Scene files are written in coarse units. Every coordinate gets multiplied by
//! [`SceneOptions::scale`] before building the [`Environment`], whose bounds are
//! `(0, width) x (0, height)`.

use std::path::Path;

use nalgebra as na;
use thiserror::Error;
use tracing::{debug, warn};

use rrt2d::obstacle::{BBox, Polygon};
use rrt2d::{Environment, Point};

pub mod json_format;

pub use json_format::{RawObject, RawPoint, RawScene};

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("failed to read scene file")]
    Io(#[from] std::io::Error),

    #[error("malformed scene")]
    Json(#[from] serde_json::Error),

    #[error("polygon {index} has {vertices} vertices, at least 2 are needed")]
    DegeneratePolygon { index: usize, vertices: usize },
}

/// How raw scene coordinates map into the planning domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneOptions {
    pub scale: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for SceneOptions {
    fn default() -> Self {
        SceneOptions {
            scale: 10.0,
            width: 1000.0,
            height: 400.0,
        }
    }
}

/// Everything a planner needs to run: where to start, where to go and what is in the way.
#[derive(Debug)]
pub struct Episode {
    pub env: Environment,
    pub start: Point,
    pub goal: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    raw: RawScene,
}

impl Scene {
    pub fn new(raw: RawScene) -> Self {
        Scene { raw }
    }

    pub fn from_json_str(s: &str) -> Result<Self, SceneError> {
        Ok(Scene::new(serde_json::from_str(s)?))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let contents = std::fs::read_to_string(path)?;
        Scene::from_json_str(&contents)
    }

    pub fn raw(&self) -> &RawScene {
        &self.raw
    }

    /// Polygon vertex lists in file order. Objects without vertices are skipped.
    pub fn polygon_vertices(&self) -> impl Iterator<Item = &[RawPoint]> + '_ {
        self.raw
            .polygons
            .iter()
            .enumerate()
            .filter_map(|(i, object)| match &object.vertices {
                Some(vertices) => Some(vertices.as_slice()),
                None => {
                    warn!(index = i, "skipping scene object without vertices");
                    None
                }
            })
    }

    /// Scales the scene and builds the environment. Each polygon is bounded by the segments
    /// between consecutive vertices plus one segment closing it.
    pub fn build(&self, options: &SceneOptions) -> Result<Episode, SceneError> {
        let scale = |p: &RawPoint| Point::new(p.x * options.scale, p.y * options.scale);

        let bounds = BBox::new(Point::origin(), Point::new(options.width, options.height));
        let mut env = Environment::new(bounds);

        for (index, vertices) in self.polygon_vertices().enumerate() {
            if vertices.len() < 2 {
                return Err(SceneError::DegeneratePolygon {
                    index,
                    vertices: vertices.len(),
                });
            }
            env.add_obstacle(Polygon::from_vertices(vertices.iter().map(scale)));
        }

        let start = scale(&self.raw.start);
        let goal = scale(&self.raw.finish);
        debug!(
            obstacles = env.obstacles().len(),
            start = ?start,
            goal = ?goal,
            "scene built"
        );

        Ok(Episode { env, start, goal })
    }
}

/// Rescales a point of the planning domain back to scene units.
pub fn to_scene_units(p: &Point, options: &SceneOptions) -> RawPoint {
    let v: na::Vector2<f32> = p.coords / options.scale;
    RawPoint { x: v.x, y: v.y }
}

#[cfg(test)]
mod test {
    use rrt2d::obstacle::Obstacle;

    use super::*;

    const SQUARE_SCENE: &str = r#"{
        "start": { "x": 5, "y": 5 },
        "finish": { "x": 90, "y": 30 },
        "polygons": [
            { "vertices": [
                { "x": 40, "y": 0 }, { "x": 40, "y": 25 },
                { "x": 45, "y": 25 }, { "x": 45, "y": 0 }
            ] },
            { "label": "not an obstacle" }
        ]
    }"#;

    fn point2(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_parse() {
        let scene = Scene::from_json_str(SQUARE_SCENE).unwrap();

        assert_eq!(scene.raw().start, RawPoint { x: 5.0, y: 5.0 });
        assert_eq!(scene.raw().polygons.len(), 2);
        assert_eq!(scene.polygon_vertices().count(), 1);
    }

    #[test]
    fn test_build_scales_coordinates() {
        let episode = Scene::from_json_str(SQUARE_SCENE)
            .unwrap()
            .build(&SceneOptions::default())
            .unwrap();

        assert_eq!(episode.start, point2(50.0, 50.0));
        assert_eq!(episode.goal, point2(900.0, 300.0));
        assert_eq!(episode.env.obstacles().len(), 1);

        // 3 pairs of consecutive vertices and the closing segment.
        let segments = episode.env.obstacles()[0].segments();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].start, point2(400.0, 0.0));
        assert_eq!(segments[3].start, point2(450.0, 0.0));
        assert_eq!(segments[3].end, point2(400.0, 0.0));
    }

    #[test]
    fn test_built_environment_blocks_moves() {
        let episode = Scene::from_json_str(SQUARE_SCENE)
            .unwrap()
            .build(&SceneOptions::default())
            .unwrap();

        assert!(!episode.env.is_move_allowed(&point2(300.0, 100.0), &point2(500.0, 100.0)));
        assert!(episode.env.is_move_allowed(&point2(300.0, 300.0), &point2(500.0, 300.0)));
        assert!(!episode.env.is_move_allowed(&point2(300.0, 300.0), &point2(500.0, 400.0)));
    }

    #[test]
    fn test_custom_options() {
        let options = SceneOptions {
            scale: 1.0,
            width: 100.0,
            height: 50.0,
        };
        let episode = Scene::from_json_str(SQUARE_SCENE).unwrap().build(&options).unwrap();

        assert_eq!(episode.goal, point2(90.0, 30.0));
        assert_eq!(episode.env.bounds(), &BBox::new(point2(0.0, 0.0), point2(100.0, 50.0)));
        assert_eq!(to_scene_units(&episode.goal, &options), RawPoint { x: 90.0, y: 30.0 });
    }

    #[test]
    fn test_degenerate_polygon() {
        let input = r#"{
            "start": { "x": 1, "y": 1 },
            "finish": { "x": 2, "y": 2 },
            "polygons": [
                { "vertices": [{ "x": 3, "y": 3 }, { "x": 4, "y": 3 }] },
                { "vertices": [{ "x": 5, "y": 5 }] }
            ]
        }"#;
        let result = Scene::from_json_str(input).unwrap().build(&SceneOptions::default());

        assert!(matches!(
            result,
            Err(SceneError::DegeneratePolygon { index: 1, vertices: 1 })
        ));
    }

    #[test]
    fn test_missing_polygons() {
        let input = r#"{ "start": { "x": 1, "y": 1 }, "finish": { "x": 2, "y": 2 } }"#;
        let episode = Scene::from_json_str(input).unwrap().build(&SceneOptions::default()).unwrap();

        assert!(episode.env.obstacles().is_empty());
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(Scene::from_json_str("{ \"start\": 1 }"), Err(SceneError::Json(_))));
        assert!(matches!(
            Scene::load("this/file/does/not/exist.json"),
            Err(SceneError::Io(_))
        ));
    }
}
