//! The dimensions a vision processor resizes an image to.

use crate::{common::*, ImageSize};

/// Images whose long side exceeds the short side by more than this are rejected.
pub const MAX_ASPECT_RATIO: f64 = 200.0;

/// Parameters of the patch-aligned resize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeConfig {
    /// Both sides are rounded to a multiple of this, typically `patch_size * merge_size`.
    #[serde(default = "default_factor")]
    pub factor: u32,
    #[serde(default = "default_min_pixels")]
    pub min_pixels: u64,
    #[serde(default = "default_max_pixels")]
    pub max_pixels: u64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            factor: default_factor(),
            min_pixels: default_min_pixels(),
            max_pixels: default_max_pixels(),
        }
    }
}

fn default_factor() -> u32 {
    28
}

fn default_min_pixels() -> u64 {
    56 * 56
}

fn default_max_pixels() -> u64 {
    28 * 28 * 16384
}

/// Computes the patch-aligned size an image is resized to before encoding.
///
/// Each side is rounded to the nearest multiple of `factor` (ties to even, the
/// way the processor does it) and kept at least `factor`. If the pixel count
/// leaves `[min_pixels, max_pixels]`, both sides are rescaled by the same ratio
/// and floored (too large) or ceiled (too small) to the factor.
pub fn smart_resize(size: ImageSize, config: &ResizeConfig) -> Result<ImageSize> {
    let ResizeConfig {
        factor,
        min_pixels,
        max_pixels,
    } = *config;
    if factor == 0 {
        return Err(Error::InvalidDimension {
            width: factor as i64,
            height: factor as i64,
        });
    }

    let h = size.h() as f64;
    let w = size.w() as f64;
    let ratio = h.max(w) / h.min(w);
    if ratio > MAX_ASPECT_RATIO {
        return Err(Error::AspectRatio {
            ratio,
            max: MAX_ASPECT_RATIO,
        });
    }

    let factor_f = factor as f64;
    let round_by_factor = |value: f64| (value / factor_f).round_ties_even() * factor_f;
    let floor_by_factor = |value: f64| (value / factor_f).floor() * factor_f;
    let ceil_by_factor = |value: f64| (value / factor_f).ceil() * factor_f;

    let mut h_bar = factor_f.max(round_by_factor(h));
    let mut w_bar = factor_f.max(round_by_factor(w));

    if h_bar * w_bar > max_pixels as f64 {
        let beta = (h * w / max_pixels as f64).sqrt();
        h_bar = factor_f.max(floor_by_factor(h / beta));
        w_bar = factor_f.max(floor_by_factor(w / beta));
    } else if h_bar * w_bar < min_pixels as f64 {
        let beta = (min_pixels as f64 / (h * w)).sqrt();
        h_bar = ceil_by_factor(h * beta);
        w_bar = ceil_by_factor(w * beta);
    }

    ImageSize::try_new(w_bar as i64, h_bar as i64)
}
