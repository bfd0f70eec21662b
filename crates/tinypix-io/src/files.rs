//! File utilities: Blob URLs, programmatic downloads, and upload
//! validation.
//!
//! Browser downloads are triggered by creating a `Blob`, generating an
//! object URL, and programmatically clicking a temporary `<a>`
//! element. The validation helpers mirror what the upload surface
//! accepts.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::BlobPropertyBag;

/// Default upload size cap (50 MB).
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// MIME types accepted for upload. `image/jpg` is non-standard but
/// some platforms still report it.
const ACCEPTED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/bmp",
    "image/gif",
    "image/tiff",
    "image/webp",
];

/// Errors from Blob and download plumbing.
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for FilesError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// Whether `mime` is an accepted image type for upload.
#[must_use]
pub fn is_accepted_image_mime(mime: &str) -> bool {
    ACCEPTED_MIME_TYPES.contains(&mime)
}

/// Whether an upload of `size` bytes is within the cap.
#[must_use]
pub const fn is_accepted_file_size(size: u64) -> bool {
    size <= MAX_UPLOAD_BYTES
}

/// Wrap bytes in a `Blob` and return an object URL for it.
///
/// The returned URL must be revoked via [`revoke_blob_url`] when no
/// longer needed to avoid leaking the allocation.
///
/// # Errors
///
/// Returns [`FilesError::JsError`] if Blob or URL creation fails.
pub fn bytes_to_blob_url(bytes: &[u8], mime_type: &str) -> Result<String, FilesError> {
    let array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&array);

    let opts = BlobPropertyBag::new();
    opts.set_type(mime_type);

    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &opts)?;
    Ok(web_sys::Url::create_object_url_with_blob(&blob)?)
}

/// Revoke an object URL created by [`bytes_to_blob_url`].
///
/// Best-effort: failures are silently ignored since the URL may have
/// already been revoked or garbage collected.
pub fn revoke_blob_url(url: &str) {
    let _ = web_sys::Url::revoke_object_url(url);
}

/// Save bytes to the user's machine as `filename`.
///
/// Creates a `Blob`, generates an object URL, and programmatically
/// clicks a temporary `<a download="filename">` element. The object
/// URL is revoked after the click.
///
/// # Errors
///
/// Returns [`FilesError::JsError`] if any browser API call fails
/// (e.g., `Blob` creation, `URL.createObjectURL`, element creation).
pub fn trigger_download(bytes: &[u8], filename: &str, mime_type: &str) -> Result<(), FilesError> {
    let url = bytes_to_blob_url(bytes, mime_type)?;

    let window =
        web_sys::window().ok_or_else(|| FilesError::JsError("no global window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| FilesError::JsError("no document".into()))?;

    let anchor: web_sys::HtmlAnchorElement = document
        .create_element("a")?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|e| FilesError::JsError(format!("failed to cast element: {e:?}")))?;

    anchor.set_href(&url);
    anchor.set_download(filename);

    let body = document
        .body()
        .ok_or_else(|| FilesError::JsError("no document body".into()))?;
    body.append_child(&anchor)?;
    anchor.click();

    // The download is already initiated; cleanup failures should not
    // be reported as "download failed".
    let _ = body.remove_child(&anchor);
    revoke_blob_url(&url);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_image_mimes_are_accepted() {
        assert!(is_accepted_image_mime("image/jpeg"));
        assert!(is_accepted_image_mime("image/jpg"));
        assert!(is_accepted_image_mime("image/png"));
        assert!(is_accepted_image_mime("image/webp"));
    }

    #[test]
    fn non_image_mimes_are_rejected() {
        assert!(!is_accepted_image_mime("application/pdf"));
        assert!(!is_accepted_image_mime("image/svg+xml"));
        assert!(!is_accepted_image_mime(""));
    }

    #[test]
    fn size_cap_boundary() {
        assert!(is_accepted_file_size(MAX_UPLOAD_BYTES));
        assert!(!is_accepted_file_size(MAX_UPLOAD_BYTES + 1));
        assert!(is_accepted_file_size(0));
    }
}
