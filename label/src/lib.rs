//! Visual grounding annotations.
//!
//! An [AnnotationRecord] pairs an image with an ordered list of [Region]s,
//! each a labelled bounding box or point. The [normalize] module converts
//! region coordinates between pixel space and the 0-1000 relative space, and
//! [sample] reads and writes the conversation-style annotation files.

mod common;

pub use error::*;
pub mod error;

pub use region::*;
pub mod region;

pub use record::*;
pub mod record;

pub mod normalize;

pub use sample::*;
pub mod sample;

pub use family::*;
pub mod family;

pub mod pointing;

pub use bbox::{CoordinateSystem, ImageSize};
