//! tinypix-pipeline: pure resize and WebP encode pipeline (sans-IO).
//!
//! Takes raw image bytes and [`ProcessOptions`], produces a resized,
//! WebP-encoded [`EncodedImage`]. This crate has **no I/O
//! dependencies** -- it operates on in-memory byte slices and reports
//! progress through a caller-supplied callback. All browser and
//! network interaction lives in `tinypix-io` and `tinypix-worker`.

pub mod encode;
pub mod meta;
pub mod resize;
pub mod types;

pub use encode::Encoder;
pub use types::{Dimensions, EncodedImage, PipelineError, ProcessOptions, RgbaImage};

/// Run the local processing pipeline on one image.
///
/// A fixed linear chain, each stage reported through `progress` with
/// the milestones 20, 40, 50, 70, 90, 100:
///
/// 1. Receive the input bytes
/// 2. Decode into an RGBA surface
/// 3. Compute the shrink-to-fit target size (never upscaling)
/// 4. Resize, high-quality with a bilinear fallback
/// 5. Encode to WebP with the encoder selected once for this run
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty,
/// [`PipelineError::ImageDecode`] if the input cannot be decoded, and
/// [`PipelineError::Resize`] / [`PipelineError::Encode`] when the
/// respective stage fails. Any failure is terminal; the pipeline never
/// retries.
pub fn process(
    bytes: &[u8],
    options: &ProcessOptions,
    mut progress: impl FnMut(u8),
) -> Result<EncodedImage, PipelineError> {
    // Input received.
    progress(20);
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    // Decode into an RGBA surface.
    progress(40);
    let decoded = image::load_from_memory(bytes)?.to_rgba8();
    let original = Dimensions::new(decoded.width(), decoded.height());

    // Shrink-to-fit target, preserving aspect ratio.
    let target = resize::target_size(original, options.max_width, options.max_height);
    progress(50);

    let resized = resize::resize_to_target(&decoded, target)?;
    progress(70);

    // The encoder choice is made once per run; a failure past this
    // point is terminal rather than triggering a second strategy.
    let encoder = Encoder::select(options);
    progress(90);
    let encoded = encoder.encode(&resized, options)?;

    progress(100);
    Ok(EncodedImage {
        bytes: encoded,
        dimensions: target,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Encode a flat-color RGBA image as an in-memory PNG.
    fn test_png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, image::Rgba([200, 100, 50, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn reports_milestones_in_order() {
        let png = test_png(30, 20);
        let mut milestones = Vec::new();
        let result = process(&png, &ProcessOptions::default(), |p| milestones.push(p));
        assert!(result.is_ok());
        assert_eq!(milestones, vec![20, 40, 50, 70, 90, 100]);
    }

    #[test]
    fn small_image_keeps_its_dimensions() {
        let png = test_png(30, 20);
        let result = process(&png, &ProcessOptions::default(), |_| {}).unwrap();
        assert_eq!(result.dimensions, Dimensions::new(30, 20));
        assert!(result.size() > 0);
    }

    #[test]
    fn oversized_image_is_shrunk_within_bounds() {
        let png = test_png(300, 200);
        let options = ProcessOptions {
            max_width: 100,
            max_height: 100,
            ..ProcessOptions::default()
        };
        let result = process(&png, &options, |_| {}).unwrap();
        assert_eq!(result.dimensions, Dimensions::new(100, 66));
    }

    #[test]
    fn output_is_a_webp_container() {
        let png = test_png(16, 16);
        let result = process(&png, &ProcessOptions::default(), |_| {}).unwrap();
        assert_eq!(&result.bytes[0..4], b"RIFF");
        assert_eq!(&result.bytes[8..12], b"WEBP");
    }

    #[test]
    fn empty_input_fails_after_first_milestone() {
        let mut milestones = Vec::new();
        let result = process(&[], &ProcessOptions::default(), |p| milestones.push(p));
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
        assert_eq!(milestones, vec![20]);
    }

    #[test]
    fn corrupt_input_fails_to_decode() {
        let result = process(&[0xFF, 0xFE, 0x00, 0x01], &ProcessOptions::default(), |_| {});
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn out_of_range_knobs_still_produce_output() {
        // Knobs outside libwebp's ranges select the lossless encoder
        // instead of failing.
        let png = test_png(16, 16);
        let options = ProcessOptions {
            method: 42,
            ..ProcessOptions::default()
        };
        let result = process(&png, &options, |_| {}).unwrap();
        assert_eq!(&result.bytes[0..4], b"RIFF");
    }
}
