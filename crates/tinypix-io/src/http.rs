//! Fetch helpers over the browser `fetch` API.
//!
//! Thin wrappers that issue a request and read its body, plus the
//! error-detail extraction applied to failure response bodies. All
//! functions here require a browser environment
//! (`wasm32-unknown-unknown` target) except [`error_detail`], which is
//! pure.

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Request, RequestInit, Response};

/// Errors from issuing a request or reading its body.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network or browser API failure before a response was produced.
    #[error("network error: {0}")]
    Network(String),

    /// Response carried a non-success HTTP status.
    #[error("request failed ({status}): {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Human-readable failure detail.
        detail: String,
    },

    /// Response body was zero-length where content was required.
    #[error("downloaded file is empty")]
    EmptyBody,
}

impl From<JsValue> for FetchError {
    fn from(value: JsValue) -> Self {
        Self::Network(format!("{value:?}"))
    }
}

/// POST a multipart form and return the raw response.
///
/// # Errors
///
/// Returns [`FetchError::Network`] when the request cannot be built or
/// the fetch itself fails. A non-success status is not an error here;
/// callers inspect the response.
#[allow(clippy::future_not_send)]
pub async fn post_form(url: &str, form: &FormData) -> Result<Response, FetchError> {
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(form.as_ref());
    let request = Request::new_with_str_and_init(url, &init)?;
    fetch(&request).await
}

/// GET `url` and return the raw response.
///
/// # Errors
///
/// Returns [`FetchError::Network`] when the request cannot be built or
/// the fetch itself fails.
#[allow(clippy::future_not_send)]
pub async fn get(url: &str) -> Result<Response, FetchError> {
    let request = Request::new_with_str(url)?;
    fetch(&request).await
}

#[allow(clippy::future_not_send)]
async fn fetch(request: &Request) -> Result<Response, FetchError> {
    let window =
        web_sys::window().ok_or_else(|| FetchError::Network("no global window".into()))?;
    let response = JsFuture::from(window.fetch_with_request(request)).await?;
    response
        .dyn_into::<Response>()
        .map_err(|_| FetchError::Network("fetch did not produce a Response".into()))
}

/// Read the response body as text.
///
/// # Errors
///
/// Returns [`FetchError::Network`] when the body cannot be read.
#[allow(clippy::future_not_send)]
pub async fn response_text(response: &Response) -> Result<String, FetchError> {
    let text = JsFuture::from(response.text()?).await?;
    Ok(text.as_string().unwrap_or_default())
}

/// Read the response body as raw bytes.
///
/// # Errors
///
/// Returns [`FetchError::Network`] when the body cannot be read.
#[allow(clippy::future_not_send)]
pub async fn response_bytes(response: &Response) -> Result<Vec<u8>, FetchError> {
    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// Extract a human-readable message from an error response body.
///
/// The backend wraps failures in a `detail` field that may be an
/// object carrying `message` or `details`, or a plain string. JSON
/// bodies without a usable detail are echoed whole; bodies that are
/// not JSON fall back to the HTTP status text.
#[must_use]
pub fn error_detail(body: &str, status_text: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return status_text.to_owned();
    };
    match value.get("detail") {
        Some(detail) if !detail.is_null() => detail
            .get("message")
            .or_else(|| detail.get("details"))
            .and_then(serde_json::Value::as_str)
            .map_or_else(
                || {
                    detail
                        .as_str()
                        .map_or_else(|| detail.to_string(), ToOwned::to_owned)
                },
                ToOwned::to_owned,
            ),
        _ => value.to_string(),
    }
}
