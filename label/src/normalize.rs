//! Conversion of region coordinates between pixel and 0-1000 space.
//!
//! These functions are pure: they take the original image dimensions and
//! return new values, so they can be called concurrently without locking.
//! Coordinates are rounded half away from zero and then clamped; the clamp is
//! the policy for out-of-bounds input rather than an error. A round trip
//! through both directions is not exact but stays within one unit for boxes
//! on images up to 2000 pixels per side.

use crate::{common::*, AnnotationRecord, Region};

/// Converts an absolute region into 0-1000 units of a `width` x `height` image.
pub fn to_relative(region: &Region, width: i64, height: i64) -> Result<Region> {
    let size = ImageSize::try_new(width, height)?;
    Ok(region.to_relative(size))
}

/// Converts a 0-1000 region into pixels of a `width` x `height` image.
pub fn to_absolute(region: &Region, width: i64, height: i64) -> Result<Region> {
    let size = ImageSize::try_new(width, height)?;
    Ok(region.to_absolute(size))
}

/// Converts every region of `record` into `target` units.
pub fn convert_record(
    record: &AnnotationRecord,
    target: CoordinateSystem,
    width: i64,
    height: i64,
) -> Result<AnnotationRecord> {
    let size = ImageSize::try_new(width, height)?;
    Ok(record.convert(target, size))
}

/// True iff the record uses a single coordinate system and all boxes are non-degenerate.
pub fn is_consistent(record: &AnnotationRecord) -> bool {
    record.is_consistent()
}
