//! Raw layout of a scene file, before scaling.
//!
//! ```json
//! {
//!     "start": { "x": 5, "y": 5 },
//!     "finish": { "x": 90, "y": 30 },
//!     "polygons": [
//!         { "vertices": [{ "x": 40, "y": 0 }, { "x": 40, "y": 25 }, { "x": 45, "y": 25 }] }
//!     ]
//! }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub x: f32,
    pub y: f32,
}

/// An entry of the `polygons` array. Entries that carry no `vertices` key are not obstacles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawObject {
    #[serde(default)]
    pub vertices: Option<Vec<RawPoint>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScene {
    pub start: RawPoint,
    pub finish: RawPoint,
    #[serde(default)]
    pub polygons: Vec<RawObject>,
}
