//! Shared types for the tinypix processing pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can reference decoded
/// pixel data without depending on `image` directly.
pub use image::RgbaImage;

/// Options controlling the resize bounds and the WebP encoder tuning.
///
/// Deserialization fills every missing field with its default, so a
/// partial options object merges with the defaults at call time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
    /// Encoding quality, 0-100.
    pub quality: f32,

    /// Maximum output width in pixels.
    pub max_width: u32,

    /// Maximum output height in pixels.
    pub max_height: u32,

    /// libwebp compression method, 0 (fastest) to 6 (slowest, smallest).
    pub method: i32,

    /// Number of entropy-analysis passes, 1-10.
    pub pass: i32,

    /// Use the sharp (and slower) RGB-to-YUV conversion.
    pub use_sharp_yuv: bool,

    /// Spatial noise shaping strength, 0-100.
    pub sns_strength: i32,

    /// Deblocking filter strength, 0-100.
    pub filter_strength: i32,

    /// Deblocking filter sharpness, 0-7.
    pub filter_sharpness: i32,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            quality: 92.0,
            max_width: 1920,
            max_height: 1080,
            method: 6,
            pass: 8,
            use_sharp_yuv: true,
            sns_strength: 75,
            filter_strength: 30,
            filter_sharpness: 3,
        }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A resized, WebP-encoded image: the local pipeline's terminal payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Encoded WebP bytes.
    pub bytes: Vec<u8>,
    /// Output dimensions after the shrink-to-fit resize.
    pub dimensions: Dimensions,
}

impl EncodedImage {
    /// Encoded size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Errors from the local processing pipeline.
///
/// Every failure is terminal for the request that hit it; the pipeline
/// never retries.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input byte buffer was empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The input could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// Resizing onto the target surface failed.
    #[error("resize failed: {0}")]
    Resize(String),

    /// WebP encoding failed.
    #[error("WebP encoding failed: {0}")]
    Encode(String),
}
