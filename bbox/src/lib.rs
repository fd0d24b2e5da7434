//! Geometry primitives for visual grounding annotations.
//!
//! Boxes are stored as `[x1, y1, x2, y2]` corner pairs and points as `[x, y]`,
//! the layout used by `bbox_2d` and `point_2d` fields. Pixel coordinates and
//! the scale-invariant 0-1000 space are distinguished by [CoordinateSystem].

mod common;

pub use error::*;
pub mod error;

pub use size::*;
pub mod size;

pub use xyxy::*;
pub mod xyxy;

pub use point::*;
pub mod point;

pub use transform::*;
mod transform;

pub use system::*;
pub mod system;

pub mod rounding;

pub use resize::*;
pub mod resize;
