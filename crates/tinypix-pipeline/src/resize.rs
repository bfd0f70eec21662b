//! Shrink-to-fit sizing and surface resizing.
//!
//! [`target_size`] computes aspect-ratio-preserving output bounds that
//! never upscale. The resize functions produce the scaled RGBA surface,
//! preferring a Lanczos filter with a mild unsharp mask and dropping to
//! plain bilinear interpolation when the high-quality path fails.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::types::{Dimensions, PipelineError};

/// Unsharp-mask radius applied after the high-quality resize.
const UNSHARP_SIGMA: f32 = 1.2;

/// Unsharp-mask threshold; pixels differing by less are left alone.
const UNSHARP_THRESHOLD: i32 = 10;

/// Compute output dimensions that fit within `max_width` x `max_height`.
///
/// Images already inside the bounds pass through unchanged. Otherwise
/// both axes are scaled by the smaller of the width/height ratios and
/// floored, preserving the aspect ratio to within one pixel of
/// rounding.
#[must_use]
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn target_size(original: Dimensions, max_width: u32, max_height: u32) -> Dimensions {
    if original.width <= max_width && original.height <= max_height {
        return original;
    }

    let width_ratio = f64::from(max_width) / f64::from(original.width);
    let height_ratio = f64::from(max_height) / f64::from(original.height);
    let ratio = width_ratio.min(height_ratio);

    Dimensions::new(
        (f64::from(original.width) * ratio).floor() as u32,
        (f64::from(original.height) * ratio).floor() as u32,
    )
}

/// Resize with Lanczos3 followed by a mild unsharp mask.
///
/// # Errors
///
/// Returns [`PipelineError::Resize`] when either target axis is zero
/// (a degenerate aspect ratio collapsed under the shrink-to-fit rule).
pub fn resize_high_quality(
    image: &RgbaImage,
    target: Dimensions,
) -> Result<RgbaImage, PipelineError> {
    ensure_nonzero(target)?;
    let resized = imageops::resize(image, target.width, target.height, FilterType::Lanczos3);
    Ok(imageops::unsharpen(&resized, UNSHARP_SIGMA, UNSHARP_THRESHOLD))
}

/// Resize with plain bilinear interpolation.
///
/// # Errors
///
/// Returns [`PipelineError::Resize`] when either target axis is zero.
pub fn resize_bilinear(image: &RgbaImage, target: Dimensions) -> Result<RgbaImage, PipelineError> {
    ensure_nonzero(target)?;
    Ok(imageops::resize(
        image,
        target.width,
        target.height,
        FilterType::Triangle,
    ))
}

/// High-quality resize, falling back to the bilinear path on failure.
///
/// # Errors
///
/// Returns [`PipelineError::Resize`] only when both paths fail.
pub fn resize_to_target(image: &RgbaImage, target: Dimensions) -> Result<RgbaImage, PipelineError> {
    resize_high_quality(image, target).or_else(|_| resize_bilinear(image, target))
}

fn ensure_nonzero(target: Dimensions) -> Result<(), PipelineError> {
    if target.width == 0 || target.height == 0 {
        return Err(PipelineError::Resize(format!(
            "target dimensions collapsed to {}x{}",
            target.width, target.height,
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba([128, 64, 32, 255]))
    }

    #[test]
    fn within_bounds_passes_through() {
        let result = target_size(Dimensions::new(100, 80), 1920, 1080);
        assert_eq!(result, Dimensions::new(100, 80));
    }

    #[test]
    fn exact_bounds_pass_through() {
        let result = target_size(Dimensions::new(1920, 1080), 1920, 1080);
        assert_eq!(result, Dimensions::new(1920, 1080));
    }

    #[test]
    fn landscape_shrinks_to_bounds() {
        let result = target_size(Dimensions::new(3840, 2160), 1920, 1080);
        assert_eq!(result, Dimensions::new(1920, 1080));
    }

    #[test]
    fn portrait_constrained_by_height() {
        // Height ratio 1080/3840 = 0.28125 is the smaller one.
        let result = target_size(Dimensions::new(2160, 3840), 1920, 1080);
        assert_eq!(result, Dimensions::new(607, 1080));
    }

    #[test]
    fn width_only_overflow() {
        let result = target_size(Dimensions::new(2000, 500), 1920, 1080);
        assert_eq!(result, Dimensions::new(1920, 480));
    }

    #[test]
    fn extreme_aspect_ratio_floors_both_axes() {
        let result = target_size(Dimensions::new(10_000, 10), 1920, 1080);
        assert_eq!(result, Dimensions::new(1920, 1));
    }

    #[test]
    fn degenerate_aspect_can_collapse_to_zero() {
        // 1x10000 against 1920x1080 floors the width to zero; the
        // resize stage rejects this rather than producing an empty
        // surface.
        let result = target_size(Dimensions::new(1, 10_000), 1920, 1080);
        assert_eq!(result.width, 0);
    }

    #[test]
    fn resize_high_quality_produces_target_dimensions() {
        let img = test_image(64, 32);
        let resized = resize_high_quality(&img, Dimensions::new(16, 8)).unwrap();
        assert_eq!(resized.width(), 16);
        assert_eq!(resized.height(), 8);
    }

    #[test]
    fn resize_bilinear_produces_target_dimensions() {
        let img = test_image(64, 32);
        let resized = resize_bilinear(&img, Dimensions::new(32, 16)).unwrap();
        assert_eq!(resized.width(), 32);
        assert_eq!(resized.height(), 16);
    }

    #[test]
    fn resize_rejects_zero_target() {
        let img = test_image(64, 32);
        assert!(matches!(
            resize_to_target(&img, Dimensions::new(0, 8)),
            Err(PipelineError::Resize(_)),
        ));
        assert!(matches!(
            resize_to_target(&img, Dimensions::new(16, 0)),
            Err(PipelineError::Resize(_)),
        ));
    }

    #[test]
    fn resize_to_target_matches_requested_size() {
        let img = test_image(100, 60);
        let resized = resize_to_target(&img, Dimensions::new(50, 30)).unwrap();
        assert_eq!(resized.width(), 50);
        assert_eq!(resized.height(), 30);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for source dimensions (kept modest for speed).
    fn dimensions_strategy() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=8192, 1u32..=8192)
    }

    /// Strategy for resize bounds.
    fn bounds_strategy() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=4096, 1u32..=4096)
    }

    /// Strategy producing a source size together with bounds that are
    /// guaranteed to contain it, so the within-bounds precondition holds
    /// by construction instead of by rejection sampling.
    fn within_bounds_strategy() -> impl Strategy<Value = ((u32, u32), (u32, u32))> {
        dimensions_strategy()
            .prop_flat_map(|(width, height)| (Just((width, height)), (width..=8192, height..=8192)))
    }

    proptest! {
        /// Inputs already within the bounds are returned unchanged.
        #[test]
        fn prop_identity_when_within_bounds(
            ((width, height), (max_w, max_h)) in within_bounds_strategy(),
        ) {
            let result = target_size(Dimensions::new(width, height), max_w, max_h);
            prop_assert_eq!(result, Dimensions::new(width, height));
        }

        /// Output never exceeds the bounds and never upscales.
        #[test]
        fn prop_output_bounded(
            (width, height) in dimensions_strategy(),
            (max_w, max_h) in bounds_strategy(),
        ) {
            let result = target_size(Dimensions::new(width, height), max_w, max_h);
            prop_assert!(result.width <= max_w);
            prop_assert!(result.height <= max_h);
            prop_assert!(result.width <= width);
            prop_assert!(result.height <= height);
        }

        /// Both axes are floored from the same ratio, so the cross
        /// products differ by at most one pixel's worth of rounding.
        #[test]
        fn prop_aspect_ratio_preserved(
            (width, height) in dimensions_strategy(),
            (max_w, max_h) in bounds_strategy(),
        ) {
            let result = target_size(Dimensions::new(width, height), max_w, max_h);
            let lhs = u64::from(result.width) * u64::from(height);
            let rhs = u64::from(result.height) * u64::from(width);
            let tolerance = u64::from(width) + u64::from(height);
            prop_assert!(lhs.abs_diff(rhs) <= tolerance);
        }
    }
}
