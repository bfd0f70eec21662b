//! WebP encoding with capability-checked strategy selection.
//!
//! The tunable lossy libwebp encoder is preferred. When the caller's
//! tuning knobs fall outside libwebp's accepted ranges the selection
//! drops to the `image` crate's built-in lossless WebP encoder, which
//! ignores the quality knobs entirely. The choice is made once per
//! operation so each stage keeps an explicit success/failure contract
//! instead of scattering fallback handling through the pipeline.

use image::RgbaImage;
use webp::WebPConfig;

use crate::types::{PipelineError, ProcessOptions};

/// Encoder selected for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoder {
    /// Tunable lossy libwebp encoder.
    Lossy,
    /// The built-in lossless encoder; chosen when the tuning knobs are
    /// outside libwebp's accepted ranges.
    Lossless,
}

impl Encoder {
    /// Choose the encoder for this run.
    #[must_use]
    pub fn select(options: &ProcessOptions) -> Self {
        if knobs_in_range(options) {
            Self::Lossy
        } else {
            Self::Lossless
        }
    }

    /// Encode an RGBA surface to WebP bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Encode`] when the underlying encoder
    /// fails; the failure is terminal, no second strategy is tried
    /// mid-encode.
    pub fn encode(
        self,
        image: &RgbaImage,
        options: &ProcessOptions,
    ) -> Result<Vec<u8>, PipelineError> {
        match self {
            Self::Lossy => encode_lossy(image, options),
            Self::Lossless => encode_lossless(image),
        }
    }
}

/// libwebp's accepted ranges for the knobs exposed in [`ProcessOptions`].
fn knobs_in_range(options: &ProcessOptions) -> bool {
    (0.0..=100.0).contains(&options.quality)
        && (0..=6).contains(&options.method)
        && (1..=10).contains(&options.pass)
        && (0..=100).contains(&options.sns_strength)
        && (0..=100).contains(&options.filter_strength)
        && (0..=7).contains(&options.filter_sharpness)
}

fn encode_lossy(image: &RgbaImage, options: &ProcessOptions) -> Result<Vec<u8>, PipelineError> {
    let mut config = WebPConfig::new()
        .map_err(|()| PipelineError::Encode("libwebp config initialization failed".into()))?;
    config.quality = options.quality;
    config.method = options.method;
    config.pass = options.pass;
    config.use_sharp_yuv = i32::from(options.use_sharp_yuv);
    config.sns_strength = options.sns_strength;
    config.filter_strength = options.filter_strength;
    config.filter_sharpness = options.filter_sharpness;

    let encoder = webp::Encoder::from_rgba(image.as_raw(), image.width(), image.height());
    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| PipelineError::Encode(format!("{e:?}")))?;
    Ok(memory.to_vec())
}

fn encode_lossless(image: &RgbaImage) -> Result<Vec<u8>, PipelineError> {
    let mut bytes = Vec::new();
    let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut bytes);
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| PipelineError::Encode(e.to_string()))?;
    Ok(bytes)
}
