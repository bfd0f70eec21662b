//! Remote compression orchestrator.
//!
//! Drives one file through the `/api/v1/image/compress` endpoint:
//! multipart upload, response validation, retrying artifact download,
//! and assembly of the caller-facing result descriptor. Progress is
//! surfaced through a shared [`ProcessState`], with a simulated ramp
//! while the backend works.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tinypix_pipeline::meta::{compression_ratio, parse_dimensions, webp_file_name};
use tinypix_pipeline::{Dimensions, ProcessOptions};
use wasm_bindgen::JsValue;
use web_sys::FormData;

use crate::config::{api_base_url, resolve_download_url};
use crate::download::{FetchTransport, TimerBackoff, download_with_retry};
use crate::files::bytes_to_blob_url;
use crate::http::{self, FetchError};
use crate::state::{ProcessState, ProgressTicker};

/// Ceiling for the simulated ramp while the backend processes.
const RESPONSE_RAMP_CEILING: u8 = 75;

/// Errors from the remote compression flow.
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    /// The endpoint answered with a non-success HTTP status.
    #[error("image compression failed ({status}): {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Detail extracted from the error response body.
        detail: String,
    },

    /// The backend reported `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// The response body did not match the expected shape.
    #[error("unexpected compression response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Transport failure during upload or download.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    Js(String),

    /// Blob or object-URL creation failed.
    #[error(transparent)]
    Files(#[from] crate::files::FilesError),
}

impl From<JsValue> for CompressError {
    fn from(value: JsValue) -> Self {
        Self::Js(format!("{value:?}"))
    }
}

/// Wire shape of a compression response.
#[derive(Debug, Deserialize)]
pub struct CompressResponse {
    /// Whether the backend considers the run successful.
    pub success: bool,
    /// Server-supplied message, populated on logical failure.
    #[serde(default)]
    pub message: String,
    /// Name the upload was stored under.
    #[serde(default)]
    pub filename: String,
    /// Name of the produced artifact, when the server supplies one.
    #[serde(default)]
    pub output_filename: Option<String>,
    /// Where to fetch the artifact; may be relative to the API base.
    pub download_url: String,
    /// Size and dimension metadata.
    pub metadata: CompressMetadata,
}

/// Server-reported compression metadata.
#[derive(Debug, Deserialize)]
pub struct CompressMetadata {
    /// Input size in bytes; 0 when the server could not determine it.
    #[serde(default)]
    pub original_size: u64,
    /// Output size in bytes.
    pub output_size: u64,
    /// Percentage reduction; `None` when absent or non-numeric.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub compression_ratio: Option<f64>,
    /// Input dimensions as a `"WxH"` string.
    pub original_dimensions: String,
    /// Output dimensions as a `"WxH"` string.
    pub output_dimensions: String,
    /// Quality the server actually used.
    #[serde(default)]
    pub quality: f32,
}

/// Accept numbers, and quietly drop anything else, for fields the
/// backend does not always report as numeric.
fn lenient_f64<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

/// Options forwarded to the backend: resize bounds and quality only.
#[derive(Debug, Serialize)]
struct UploadOptions {
    quality: f32,
    max_width: u32,
    max_height: u32,
}

impl From<&ProcessOptions> for UploadOptions {
    fn from(options: &ProcessOptions) -> Self {
        Self {
            quality: options.quality,
            max_width: options.max_width,
            max_height: options.max_height,
        }
    }
}

/// Result descriptor for one compressed image.
///
/// `url` is a Blob object URL for previewing the payload. Its lifetime
/// is owned by the caller, who must release it with
/// [`crate::files::revoke_blob_url`] once it is no longer displayed.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// Compressed artifact bytes.
    pub bytes: Vec<u8>,
    /// Preview object URL (caller-released).
    pub url: String,
    /// The file that was uploaded.
    pub original: web_sys::File,
    /// Input size in bytes.
    pub original_size: u64,
    /// Input dimensions.
    pub original_dimensions: Dimensions,
    /// Output size in bytes.
    pub output_size: u64,
    /// Output dimensions.
    pub output_dimensions: Dimensions,
    /// Percentage byte-size reduction.
    pub compression_ratio: i32,
    /// Output file name, defaulted from the input name when the
    /// server does not supply one.
    pub file_name: String,
}

/// Compress `file` through the remote endpoint.
///
/// Progress milestones: 5 (payload assembled), 10 (request ready), a
/// simulated ramp toward 75 while the backend works, 76 on response,
/// 76+5x(attempt-1) after each failed download attempt, 85 and 95
/// around the artifact download, 100 once the descriptor is built.
///
/// On failure the error message lands in `state`, progress resets to
/// 0, and the processing flag clears; no partial descriptor escapes.
///
/// One invocation at a time per `state`: the cells are not guarded
/// against overlapping calls.
///
/// # Errors
///
/// Returns a [`CompressError`] describing the first failing step.
#[allow(clippy::future_not_send)]
pub async fn compress_image(
    file: &web_sys::File,
    options: &ProcessOptions,
    state: &Rc<ProcessState>,
) -> Result<ProcessedImage, CompressError> {
    state.begin();
    match run(file, options, state).await {
        Ok(image) => {
            state.complete();
            Ok(image)
        }
        Err(e) => {
            state.fail(&e.to_string());
            Err(e)
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(
    file: &web_sys::File,
    options: &ProcessOptions,
    state: &Rc<ProcessState>,
) -> Result<ProcessedImage, CompressError> {
    let base = api_base_url();

    state.set_progress(5);
    let form = FormData::new()?;
    form.append_with_blob("file", file)?;
    form.append_with_str(
        "options",
        &serde_json::to_string(&UploadOptions::from(options))?,
    )?;
    state.set_progress(10);

    // Ramp while the upload and backend processing run. The ticker is
    // cancelled explicitly once the response lands, and by Drop on
    // every early return below.
    let ticker = ProgressTicker::start(Rc::clone(state), RESPONSE_RAMP_CEILING);

    let response = http::post_form(&format!("{base}/api/v1/image/compress"), &form).await?;
    if !response.ok() {
        let body = http::response_text(&response).await.unwrap_or_default();
        return Err(CompressError::Status {
            status: response.status(),
            detail: http::error_detail(&body, &response.status_text()),
        });
    }

    let body = http::response_text(&response).await?;
    let parsed: CompressResponse = serde_json::from_str(&body)?;
    if !parsed.success {
        return Err(CompressError::Rejected(reject_message(parsed.message)));
    }

    ticker.cancel();
    state.set_progress(76);

    let download_url = resolve_download_url(base, &parsed.download_url);
    let bytes = download_with_retry(&FetchTransport, &TimerBackoff, &download_url, |attempt| {
        web_sys::console::warn_1(
            &format!("download attempt {attempt} failed, retrying").into(),
        );
        state.set_progress(retry_progress(attempt));
    })
    .await?;
    state.set_progress(85);

    let url = bytes_to_blob_url(&bytes, "image/webp")?;
    state.set_progress(95);

    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let file_size = file.size() as u64;
    let original_name = file.name();
    Ok(build_descriptor(
        &parsed,
        bytes,
        url,
        file.clone(),
        file_size,
        &original_name,
    ))
}

/// Displayed progress after failed download attempt `attempt`.
#[expect(clippy::cast_possible_truncation)]
const fn retry_progress(attempt: u32) -> u8 {
    76 + 5 * (attempt as u8).saturating_sub(1)
}

/// Server message for a logical failure, with a generic fallback.
fn reject_message(message: String) -> String {
    if message.is_empty() {
        "image compression failed".to_owned()
    } else {
        message
    }
}

/// Compression ratio for the descriptor: the server's value when it
/// reported one, otherwise derived from the byte sizes.
#[expect(clippy::cast_possible_truncation)]
fn ratio_for(metadata: &CompressMetadata, original_size: u64) -> i32 {
    metadata.compression_ratio.map_or_else(
        || compression_ratio(original_size, metadata.output_size),
        |ratio| ratio.round() as i32,
    )
}

/// Output file name: the server's when supplied, otherwise the input
/// name with its extension replaced by `.webp`.
fn output_name(server_name: Option<&String>, original_name: &str) -> String {
    server_name
        .filter(|name| !name.is_empty())
        .cloned()
        .unwrap_or_else(|| webp_file_name(original_name))
}

fn build_descriptor(
    response: &CompressResponse,
    bytes: Vec<u8>,
    url: String,
    original: web_sys::File,
    original_file_size: u64,
    original_name: &str,
) -> ProcessedImage {
    let metadata = &response.metadata;
    // The upload's own size backs up a missing server-side value.
    let original_size = if metadata.original_size == 0 {
        original_file_size
    } else {
        metadata.original_size
    };

    ProcessedImage {
        bytes,
        url,
        original,
        original_size,
        original_dimensions: parse_dimensions(&metadata.original_dimensions),
        output_size: metadata.output_size,
        output_dimensions: parse_dimensions(&metadata.output_dimensions),
        compression_ratio: ratio_for(metadata, original_size),
        file_name: output_name(response.output_filename.as_ref(), original_name),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_metadata() -> CompressMetadata {
        CompressMetadata {
            original_size: 100,
            output_size: 50,
            compression_ratio: None,
            original_dimensions: "3840x2160".into(),
            output_dimensions: "1920x1080".into(),
            quality: 92.0,
        }
    }

    #[test]
    fn response_deserializes_from_api_shape() {
        let body = r#"{
            "success": true,
            "message": "ok",
            "filename": "photo.jpg",
            "output_filename": "photo.webp",
            "download_url": "/api/v1/download/photo.webp",
            "metadata": {
                "original_size": 1048576,
                "output_size": 262144,
                "compression_ratio": 75,
                "original_dimensions": "3840x2160",
                "output_dimensions": "1920x1080",
                "quality": 92
            }
        }"#;
        let parsed: CompressResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.output_filename.as_deref(), Some("photo.webp"));
        assert_eq!(parsed.metadata.original_size, 1_048_576);
        assert_eq!(parsed.metadata.compression_ratio, Some(75.0));
    }

    #[test]
    fn non_numeric_ratio_deserializes_as_none() {
        let body = r#"{
            "success": true,
            "download_url": "/d",
            "metadata": {
                "original_size": 10,
                "output_size": 5,
                "compression_ratio": "n/a",
                "original_dimensions": "1x1",
                "output_dimensions": "1x1"
            }
        }"#;
        let parsed: CompressResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.metadata.compression_ratio, None);
    }

    #[test]
    fn server_ratio_wins_when_present() {
        let metadata = CompressMetadata {
            compression_ratio: Some(74.6),
            ..sample_metadata()
        };
        assert_eq!(ratio_for(&metadata, 100), 75);
    }

    #[test]
    fn missing_ratio_is_derived_from_sizes() {
        assert_eq!(ratio_for(&sample_metadata(), 100), 50);
    }

    #[test]
    fn derived_ratio_handles_zero_original() {
        let metadata = CompressMetadata {
            output_size: 10,
            ..sample_metadata()
        };
        assert_eq!(ratio_for(&metadata, 0), 0);
    }

    #[test]
    fn output_name_prefers_the_server() {
        let name = "served.webp".to_owned();
        assert_eq!(output_name(Some(&name), "photo.jpg"), "served.webp");
    }

    #[test]
    fn output_name_falls_back_to_webp_rename() {
        assert_eq!(output_name(None, "photo.JPEG"), "photo.webp");
        assert_eq!(output_name(Some(&String::new()), "photo.png"), "photo.webp");
    }

    #[test]
    fn retry_progress_steps_by_five() {
        assert_eq!(retry_progress(1), 76);
        assert_eq!(retry_progress(2), 81);
        assert_eq!(retry_progress(3), 86);
    }

    #[test]
    fn reject_message_falls_back_when_empty() {
        assert_eq!(reject_message(String::new()), "image compression failed");
        assert_eq!(reject_message("disk full".into()), "disk full");
    }
}
