//! Normalized-grid to pixel-space coordinate mapping

use crate::types::{BoundingBoxNormalized, BoundingBoxPixel, NORMALIZED_GRID};
use tracing::debug;

/// Map a 0-1000 grid box onto an image of `img_width` x `img_height` pixels
///
/// Never fails. Each component is floored; width and height are clamped to
/// a minimum of 1, so backwards or zero-area boxes collapse to 1 pixel on
/// the offending axis. Negative origins are clamped to 0.
#[must_use]
pub fn to_pixel_box(norm: &BoundingBoxNormalized, img_width: u32, img_height: u32) -> BoundingBoxPixel {
    let w = f64::from(img_width);
    let h = f64::from(img_height);

    let x = scale(norm.xmin, w);
    let y = scale(norm.ymin, h);
    let width = scale(norm.xmax - norm.xmin, w);
    let height = scale(norm.ymax - norm.ymin, h);

    if norm.is_degenerate() {
        debug!(
            xmin = norm.xmin,
            ymin = norm.ymin,
            xmax = norm.xmax,
            ymax = norm.ymax,
            "Clamping backwards or zero-area bounding box to minimum size"
        );
    } else if width < 1 || height < 1 {
        debug!(
            raw_width = width,
            raw_height = height,
            "Clamping sub-pixel bounding box to minimum size"
        );
    }

    BoundingBoxPixel {
        x: saturate(x.max(0)),
        y: saturate(y.max(0)),
        width: saturate(width.max(1)),
        height: saturate(height.max(1)),
    }
}

fn scale(value: f64, extent: f64) -> i64 {
    let scaled = (value / NORMALIZED_GRID * extent).floor();
    if scaled.is_nan() {
        0
    } else {
        // `as` saturates on out-of-range floats
        scaled as i64
    }
}

fn saturate(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
