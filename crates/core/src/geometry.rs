//! Crop geometry for fitting a target aspect ratio inside a source frame.
//!
//! Every function here is pure: inputs are passed explicitly and a new value
//! is returned. Coordinates are in source-frame pixels with the origin at the
//! top-left corner.

use serde::{Deserialize, Serialize};

use crate::resolution::Resolution;

/// Width and height of a crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSize {
    pub width: i32,
    pub height: i32,
}

/// Top-left corner of a crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropOrigin {
    pub x: i32,
    pub y: i32,
}

/// A crop rectangle within the source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CropRect {
    pub fn new(origin: CropOrigin, size: CropSize) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    /// Center point of the rectangle, in fractional pixels.
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Sizing
// ---------------------------------------------------------------------------

/// Largest rectangle with the aspect ratio `target_width:target_height` that
/// fits inside an `original_width x original_height` frame.
///
/// Non-positive target components fall back to the full original frame.
pub fn crop_size_for_dimensions(
    target_width: i32,
    target_height: i32,
    original_width: i32,
    original_height: i32,
) -> CropSize {
    if target_width <= 0 || target_height <= 0 || original_width <= 0 || original_height <= 0 {
        return CropSize {
            width: original_width,
            height: original_height,
        };
    }

    let target_aspect = target_width as f64 / target_height as f64;
    let video_aspect = original_width as f64 / original_height as f64;

    if target_aspect > video_aspect {
        let width = original_width;
        let height = (width as f64 / target_aspect).round() as i32;
        CropSize {
            width,
            height: height.clamp(1, original_height),
        }
    } else {
        let height = original_height;
        let width = (height as f64 * target_aspect).round() as i32;
        CropSize {
            width: width.clamp(1, original_width),
            height,
        }
    }
}

/// Largest crop rectangle with the resolution's aspect ratio.
pub fn crop_size_for_resolution(
    resolution: Resolution,
    original_width: i32,
    original_height: i32,
) -> CropSize {
    let (w, h) = resolution.dimensions();
    crop_size_for_dimensions(w, h, original_width, original_height)
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// `true` iff the rectangle lies entirely inside the source frame.
///
/// Edges are summed in `i64` so origins near `i32::MAX` cannot wrap.
pub fn is_valid_crop(
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    original_width: i32,
    original_height: i32,
) -> bool {
    x >= 0
        && y >= 0
        && i64::from(x) + i64::from(width) <= i64::from(original_width)
        && i64::from(y) + i64::from(height) <= i64::from(original_height)
}

/// Origin that centers a `width x height` rectangle in the frame.
pub fn center_crop(
    width: i32,
    height: i32,
    original_width: i32,
    original_height: i32,
) -> CropOrigin {
    CropOrigin {
        x: centered_offset(width, original_width),
        y: centered_offset(height, original_height),
    }
}

fn centered_offset(extent: i32, original: i32) -> i32 {
    let offset = (i64::from(original) - i64::from(extent)) / 2;
    offset.clamp(0, i64::from(i32::MAX)) as i32
}

/// Largest origin that keeps `extent` inside `original`, never below zero.
fn max_origin(extent: i32, original: i32) -> i32 {
    (i64::from(original) - i64::from(extent)).clamp(0, i64::from(i32::MAX)) as i32
}

/// Clamp the origin so the rectangle stays on-canvas, moving it to the
/// closest valid position rather than snapping to center.
pub fn constrain_crop(
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    original_width: i32,
    original_height: i32,
) -> CropOrigin {
    CropOrigin {
        x: x.min(max_origin(width, original_width)).max(0),
        y: y.min(max_origin(height, original_height)).max(0),
    }
}

/// Place a rectangle of `size` on the center point of `previous`, then clamp
/// it into the frame.
///
/// Used when the resolution changes so the crop does not jump to a corner.
pub fn recenter_on(
    previous: CropRect,
    size: CropSize,
    original_width: i32,
    original_height: i32,
) -> CropRect {
    let (cx, cy) = previous.center();
    let x = (cx - size.width as f64 / 2.0).round() as i32;
    let y = (cy - size.height as f64 / 2.0).round() as i32;
    let origin = constrain_crop(x, y, size.width, size.height, original_width, original_height);
    CropRect::new(origin, size)
}

/// Repair a rectangle that no longer fits the frame.
///
/// Valid rectangles are returned unchanged. Otherwise the size is shrunk to
/// the frame and the rectangle is re-centered.
pub fn fit_crop(rect: CropRect, original_width: i32, original_height: i32) -> CropRect {
    if is_valid_crop(
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        original_width,
        original_height,
    ) {
        return rect;
    }

    let size = CropSize {
        width: rect.width.clamp(1, original_width.max(1)),
        height: rect.height.clamp(1, original_height.max(1)),
    };
    let origin = center_crop(size.width, size.height, original_width, original_height);
    CropRect::new(origin, size)
}

/// Default crop for a freshly uploaded video: the largest rectangle for
/// `resolution`, centered.
pub fn default_crop(resolution: Resolution, original_width: i32, original_height: i32) -> CropRect {
    let size = crop_size_for_resolution(resolution, original_width, original_height);
    let origin = center_crop(size.width, size.height, original_width, original_height);
    CropRect::new(origin, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::ALL_RESOLUTIONS;

    fn crop(x: i32, y: i32, width: i32, height: i32) -> CropRect {
        CropRect {
            x,
            y,
            width,
            height,
        }
    }

    fn dims(width: i32, height: i32) -> CropSize {
        CropSize { width, height }
    }

    const FRAMES: &[(i32, i32)] = &[
        (1920, 1080),
        (1080, 1920),
        (640, 480),
        (3840, 2160),
        (1000, 1000),
        (853, 481),
        (101, 37),
    ];

    #[test]
    fn square_on_landscape_frame() {
        let size = crop_size_for_resolution(Resolution::Square768, 1920, 1080);
        assert_eq!(size, dims(1080, 1080));
        assert_eq!(center_crop(1080, 1080, 1920, 1080), CropOrigin { x: 420, y: 0 });
    }

    #[test]
    fn landscape_on_portrait_frame_is_width_limited() {
        let size = crop_size_for_resolution(Resolution::Landscape720, 1080, 1920);
        assert_eq!(size, dims(1080, 608));
    }

    #[test]
    fn matching_aspect_uses_full_frame() {
        let size = crop_size_for_resolution(Resolution::Landscape720, 1920, 1080);
        assert_eq!(size, dims(1920, 1080));
    }

    #[test]
    fn degenerate_target_falls_back_to_full_frame() {
        assert_eq!(
            crop_size_for_dimensions(0, 720, 640, 480),
            dims(640, 480)
        );
        assert_eq!(
            crop_size_for_dimensions(1280, -1, 640, 480),
            dims(640, 480)
        );
    }

    #[test]
    fn aspect_fit_stays_in_frame_within_rounding() {
        for &resolution in ALL_RESOLUTIONS {
            let (rw, rh) = resolution.dimensions();
            for &(w, h) in FRAMES {
                let size = crop_size_for_resolution(resolution, w, h);
                assert!(size.width <= w && size.height <= h, "{resolution} on {w}x{h}");
                let got = size.width as f64 / size.height as f64;
                let want = rw as f64 / rh as f64;
                let tolerance = 1.0 / size.width.min(size.height) as f64;
                assert!(
                    (got - want).abs() <= tolerance,
                    "{resolution} on {w}x{h}: {got} vs {want}"
                );
            }
        }
    }

    #[test]
    fn centered_crop_is_always_valid() {
        for &resolution in ALL_RESOLUTIONS {
            for &(w, h) in FRAMES {
                let size = crop_size_for_resolution(resolution, w, h);
                let origin = center_crop(size.width, size.height, w, h);
                assert!(is_valid_crop(origin.x, origin.y, size.width, size.height, w, h));
            }
        }
    }

    #[test]
    fn is_valid_crop_edges() {
        assert!(is_valid_crop(0, 0, 1920, 1080, 1920, 1080));
        assert!(!is_valid_crop(1, 0, 1920, 1080, 1920, 1080));
        assert!(!is_valid_crop(-1, 0, 100, 100, 1920, 1080));
        assert!(!is_valid_crop(0, 1000, 100, 100, 1920, 1080));
    }

    #[test]
    fn constrain_is_noop_on_valid_input() {
        for (x, y) in [(0, 0), (420, 0), (840, 0), (100, 0)] {
            assert!(is_valid_crop(x, y, 1080, 1080, 1920, 1080));
            assert_eq!(constrain_crop(x, y, 1080, 1080, 1920, 1080), CropOrigin { x, y });
        }
    }

    #[test]
    fn constrain_moves_to_closest_valid_position() {
        assert_eq!(
            constrain_crop(1000, -20, 1080, 1080, 1920, 1080),
            CropOrigin { x: 840, y: 0 }
        );
        assert_eq!(
            constrain_crop(-5, 50, 500, 500, 1920, 1080),
            CropOrigin { x: 0, y: 50 }
        );
    }

    #[test]
    fn recenter_preserves_center_point() {
        // Square crop on the right side of a 1920x1080 frame.
        let previous = crop(600, 0, 1080, 1080);
        let size = dims(608, 1080);
        let rect = recenter_on(previous, size, 1920, 1080);
        assert_eq!(rect.center(), previous.center());
        assert_eq!(rect, crop(836, 0, 608, 1080));
    }

    #[test]
    fn recenter_clamps_at_frame_edge() {
        let previous = crop(1312, 0, 608, 1080);
        let size = dims(1920, 1080);
        let rect = recenter_on(previous, size, 1920, 1080);
        assert_eq!(rect, crop(0, 0, 1920, 1080));
    }

    #[test]
    fn fit_crop_leaves_valid_rect_alone() {
        let rect = crop(10, 10, 100, 100);
        assert_eq!(fit_crop(rect, 1920, 1080), rect);
    }

    #[test]
    fn fit_crop_shrinks_and_recenters() {
        let rect = crop(500, 0, 2000, 1080);
        assert_eq!(
            fit_crop(rect, 1920, 1080),
            crop(0, 0, 1920, 1080)
        );

        let rect = crop(1800, 900, 400, 400);
        assert_eq!(
            fit_crop(rect, 1920, 1080),
            crop(760, 340, 400, 400)
        );
    }

    #[test]
    fn extreme_origins_do_not_overflow() {
        assert!(!is_valid_crop(i32::MAX, 0, 1920, 1080, 1920, 1080));
        assert!(!is_valid_crop(0, i32::MAX, 1920, 1080, 1920, 1080));
        assert_eq!(
            constrain_crop(i32::MAX, i32::MAX, 1080, 1080, 1920, 1080),
            CropOrigin { x: 840, y: 0 }
        );
        assert_eq!(
            center_crop(i32::MAX, 100, 1920, 1080),
            CropOrigin { x: 0, y: 490 }
        );

        let rect = crop(i32::MAX, i32::MAX, 1080, 1080);
        assert_eq!(fit_crop(rect, 1920, 1080), crop(420, 0, 1080, 1080));
        let moved = recenter_on(rect, dims(608, 1080), 1920, 1080);
        assert_eq!(moved.x, 1312);
        assert_eq!(moved.y, 0);
    }

    #[test]
    fn default_crop_is_centered_largest_fit() {
        assert_eq!(
            default_crop(Resolution::Portrait720, 1920, 1080),
            crop(656, 0, 608, 1080)
        );
    }
}
