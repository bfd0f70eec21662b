//! API base-URL resolution.
//!
//! The backend address is baked in at compile time: an image-specific
//! override first, then the PDF service address, then the local
//! development default.

/// Fallback base URL for local development.
const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Base URL of the compression/conversion API.
#[must_use]
pub fn api_base_url() -> &'static str {
    option_env!("TINYPIX_IMAGE_API_BASE_URL")
        .or(option_env!("TINYPIX_PDF_API_BASE_URL"))
        .unwrap_or(DEFAULT_API_BASE)
}

/// Resolve a server-reported download URL against the API base.
///
/// Absolute URLs pass through untouched; relative paths are joined to
/// the base.
#[must_use]
pub fn resolve_download_url(base: &str, url: &str) -> String {
    if url.starts_with("http") {
        url.to_owned()
    } else {
        format!("{base}{url}")
    }
}
