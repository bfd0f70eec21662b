//! Multi-image-to-PDF orchestrator.
//!
//! Uploads an ordered list of images plus page-layout options to the
//! conversion endpoint. Unlike the compression flow there is no local
//! download step: the resolved remote URL and the server-reported
//! metadata are returned unmodified, and there is no progress ramp or
//! retry loop, a single request/response round-trip only.

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;
use web_sys::FormData;

use crate::config::{api_base_url, resolve_download_url};
use crate::http::{self, FetchError};
use crate::state::ProcessState;

/// Page-layout options for the conversion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfOptions {
    /// Target page size, e.g. `"A4"`.
    pub page_size: String,
    /// How images are placed on the page.
    pub fit_mode: String,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            page_size: "A4".to_owned(),
            fit_mode: "fit".to_owned(),
        }
    }
}

/// Errors from the conversion flow.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// No files were supplied; rejected before any request is made.
    #[error("select at least one image")]
    NoFiles,

    /// The endpoint answered with a non-success HTTP status.
    #[error("images-to-PDF conversion failed ({status}): {detail}")]
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
    #[error("unexpected conversion response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Transport failure during upload.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    Js(String),
}

impl From<JsValue> for ConvertError {
    fn from(value: JsValue) -> Self {
        Self::Js(format!("{value:?}"))
    }
}

/// Wire shape of a conversion response.
#[derive(Debug, Deserialize)]
pub struct ConvertResponse {
    /// Whether the backend considers the run successful.
    pub success: bool,
    /// Identifier of the conversion task.
    #[serde(default)]
    pub task_id: String,
    /// Server-supplied message, populated on logical failure.
    #[serde(default)]
    pub message: String,
    /// Name of the produced document.
    #[serde(default)]
    pub filename: String,
    /// Declared type of the produced file.
    #[serde(default)]
    pub file_type: String,
    /// Where to fetch the document; may be relative to the API base.
    pub download_url: String,
    /// Conversion metadata, passed through unmodified.
    pub metadata: PdfMetadata,
}

/// Server-reported conversion metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct PdfMetadata {
    /// Number of images received.
    pub image_count: u32,
    /// Number of pages written.
    pub pages_processed: u32,
    /// Server-side processing time in seconds.
    pub processing_time: f64,
    /// Document size in bytes.
    pub file_size: u64,
    /// Declared output type.
    #[serde(default)]
    pub output_type: String,
}

/// Reference to the produced document.
#[derive(Debug, Clone)]
pub struct PdfConversion {
    /// Identifier of the conversion task.
    pub task_id: String,
    /// Name of the produced document.
    pub filename: String,
    /// Download URL resolved against the API base.
    pub download_url: String,
    /// Server-reported metadata, unmodified.
    pub metadata: PdfMetadata,
}

/// Convert `files` into a single PDF via the remote endpoint.
///
/// An empty `files` list fails immediately without touching the
/// network. Progress milestones: 5, 20, 100.
///
/// One invocation at a time per `state`: the cells are not guarded
/// against overlapping calls.
///
/// # Errors
///
/// Returns a [`ConvertError`] describing the first failing step.
#[allow(clippy::future_not_send)]
pub async fn convert_images_to_pdf(
    files: &[web_sys::File],
    options: &PdfOptions,
    state: &ProcessState,
) -> Result<PdfConversion, ConvertError> {
    state.begin();
    state.set_progress(5);
    match run(files, options, state).await {
        Ok(conversion) => {
            state.complete();
            Ok(conversion)
        }
        Err(e) => {
            state.fail(&e.to_string());
            Err(e)
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(
    files: &[web_sys::File],
    options: &PdfOptions,
    state: &ProcessState,
) -> Result<PdfConversion, ConvertError> {
    if files.is_empty() {
        return Err(ConvertError::NoFiles);
    }

    let base = api_base_url();
    let form = FormData::new()?;
    for file in files {
        form.append_with_blob("files", file)?;
    }
    form.append_with_str("options", &serde_json::to_string(options)?)?;
    state.set_progress(20);

    let response = http::post_form(&format!("{base}/api/v1/convert/images"), &form).await?;
    if !response.ok() {
        let body = http::response_text(&response).await.unwrap_or_default();
        return Err(ConvertError::Status {
            status: response.status(),
            detail: http::error_detail(&body, &response.status_text()),
        });
    }

    let body = http::response_text(&response).await?;
    let parsed: ConvertResponse = serde_json::from_str(&body)?;
    if !parsed.success {
        return Err(ConvertError::Rejected(reject_message(parsed.message)));
    }

    Ok(PdfConversion {
        task_id: parsed.task_id,
        filename: parsed.filename,
        download_url: resolve_download_url(base, &parsed.download_url),
        metadata: parsed.metadata,
    })
}

/// Server message for a logical failure, with a generic fallback.
fn reject_message(message: String) -> String {
    if message.is_empty() {
        "images-to-PDF conversion failed".to_owned()
    } else {
        message
    }
}
