//! Main-thread client for the local processing worker.
//!
//! [`LocalWorker`] wraps a `web_sys::Worker` running the
//! `tinypix-worker` WASM module. It posts file bytes + options via
//! `postMessage`, forwards the worker's progress notifications to a
//! callback, and resolves on the single terminal success or error
//! message. Messages arriving after the terminal one are ignored.
//!
//! The worker is created from embedded JS + WASM blobs, so no extra
//! static files need to be served by the dev server.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tinypix_pipeline::{Dimensions, EncodedImage, ProcessOptions};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Errors from running the local worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The worker reported a processing failure.
    #[error("{0}")]
    Processing(String),

    /// The exchange itself broke down (worker creation, postMessage,
    /// malformed reply).
    #[error("worker error: {0}")]
    Channel(String),
}

impl From<JsValue> for WorkerError {
    fn from(value: JsValue) -> Self {
        Self::Channel(format!("{value:?}"))
    }
}

/// A client for the dedicated processing worker.
///
/// Create one at app startup and reuse it for all local runs. Requests
/// are one-at-a-time: once issued, a run cannot be aborted, a caller
/// that no longer needs the result simply discards it.
pub struct LocalWorker {
    inner: web_sys::Worker,
}

/// A reply classified from a raw worker message.
enum Reply {
    Progress(u8),
    Terminal(Result<EncodedImage, WorkerError>),
}

impl LocalWorker {
    /// Create a worker from embedded JS glue and WASM blobs.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Channel`] if the worker cannot be
    /// created (e.g. in a non-browser environment).
    pub fn new(worker_js: &str, worker_wasm: &[u8]) -> Result<Self, WorkerError> {
        Ok(Self {
            inner: create_worker(worker_js, worker_wasm)?,
        })
    }

    /// Run the local pipeline in the worker.
    ///
    /// Sends file bytes and options to the worker, returning a future
    /// that resolves on the terminal message. Progress notifications
    /// are forwarded to `on_progress` until then.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Processing`] when the worker reports a
    /// pipeline failure, [`WorkerError::Channel`] when the exchange
    /// itself breaks down.
    #[allow(clippy::future_not_send)]
    pub async fn run(
        &self,
        file_bytes: &[u8],
        options: &ProcessOptions,
        on_progress: impl Fn(u8) + 'static,
    ) -> Result<EncodedImage, WorkerError> {
        let options_json = serde_json::to_string(options)
            .map_err(|e| WorkerError::Channel(format!("failed to serialize options: {e}")))?;

        // Request object: { fileBytes: Uint8Array, optionsJson: string }
        let message = js_sys::Object::new();
        set(&message, "fileBytes", &js_sys::Uint8Array::from(file_bytes))?;
        set(&message, "optionsJson", &JsValue::from_str(&options_json))?;

        let outcome = Rc::new(RefCell::new(None::<Result<EncodedImage, WorkerError>>));
        let outcome_in_handler = Rc::clone(&outcome);
        // Set once the terminal message lands; later messages are
        // dropped without touching the outcome.
        let done = Rc::new(Cell::new(false));
        let done_in_handler = Rc::clone(&done);

        let (promise, resolve, reject) = new_promise()?;

        let onmessage = Closure::<dyn FnMut(web_sys::MessageEvent)>::new(
            move |event: web_sys::MessageEvent| {
                if done_in_handler.get() {
                    return;
                }
                match classify(&event.data()) {
                    Some(Reply::Progress(value)) => on_progress(value),
                    Some(Reply::Terminal(result)) => {
                        done_in_handler.set(true);
                        *outcome_in_handler.borrow_mut() = Some(result);
                        resolve.call0(&JsValue::NULL).ok();
                    }
                    // Unrecognized message shape: drop it.
                    None => {}
                }
            },
        );

        let onerror =
            Closure::<dyn FnMut(web_sys::ErrorEvent)>::new(move |event: web_sys::ErrorEvent| {
                let _ = reject.call1(&JsValue::NULL, &JsValue::from_str(&event.message()));
            });

        self.inner
            .set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        self.inner
            .set_onerror(Some(onerror.as_ref().unchecked_ref()));
        self.inner.post_message(&message)?;

        // Keep the closures alive while we await; they are dropped
        // when the future completes.
        let _onmessage_guard = onmessage;
        let _onerror_guard = onerror;

        let await_result = wasm_bindgen_futures::JsFuture::from(promise).await;

        self.inner.set_onmessage(None);
        self.inner.set_onerror(None);

        match await_result {
            Ok(_) => outcome.borrow_mut().take().unwrap_or_else(|| {
                Err(WorkerError::Channel(
                    "worker completed but no result captured".into(),
                ))
            }),
            Err(e) => {
                let message = e
                    .as_string()
                    .unwrap_or_else(|| "unknown worker error".into());
                Err(WorkerError::Channel(message))
            }
        }
    }
}

/// Classify a raw worker message by its `type` tag.
///
/// Returns `None` for shapes that are not part of the protocol.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn classify(data: &JsValue) -> Option<Reply> {
    let kind = get(data, "type")?.as_string()?;
    match kind.as_str() {
        "progress" => {
            let value = get(data, "progress")?.as_f64()?;
            Some(Reply::Progress(value.clamp(0.0, 100.0) as u8))
        }
        "success" => {
            let result = get(data, "result")?;
            let bytes: js_sys::Uint8Array = get(&result, "bytes")?.dyn_into().ok()?;
            let width = get(&result, "width")?.as_f64()?;
            let height = get(&result, "height")?.as_f64()?;
            Some(Reply::Terminal(Ok(EncodedImage {
                bytes: bytes.to_vec(),
                dimensions: Dimensions::new(width as u32, height as u32),
            })))
        }
        "error" => {
            let message = get(data, "error")
                .and_then(|v| v.as_string())
                .unwrap_or_else(|| "unknown worker error".to_owned());
            Some(Reply::Terminal(Err(WorkerError::Processing(message))))
        }
        _ => None,
    }
}

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(target, &JsValue::from_str(key)).ok()
}

fn set(target: &js_sys::Object, key: &str, value: &JsValue) -> Result<(), WorkerError> {
    let _ = js_sys::Reflect::set(target, &JsValue::from_str(key), value)?;
    Ok(())
}

/// Create a web worker from embedded JS glue and WASM binary.
///
/// 1. Creates a Blob URL for the WASM binary
/// 2. Wraps the JS glue in a self-initializing script that loads the
///    WASM from the Blob URL
/// 3. Creates a Blob URL for the wrapper script
/// 4. Creates a Worker from the wrapper Blob URL
fn create_worker(worker_js: &str, worker_wasm: &[u8]) -> Result<web_sys::Worker, WorkerError> {
    // Blob URL for the WASM binary.
    let wasm_array = js_sys::Uint8Array::from(worker_wasm);
    let wasm_blob_parts = js_sys::Array::new();
    wasm_blob_parts.push(&wasm_array.buffer());
    let wasm_blob_opts = web_sys::BlobPropertyBag::new();
    wasm_blob_opts.set_type("application/wasm");
    let wasm_blob = web_sys::Blob::new_with_buffer_source_sequence_and_options(
        &wasm_blob_parts,
        &wasm_blob_opts,
    )?;
    let wasm_url = web_sys::Url::create_object_url_with_blob(&wasm_blob)?;

    // Wrapper script that defines the wasm_bindgen glue and then
    // initializes it from the embedded blob URL.
    let wrapper_js = format!(
        r#"// Worker wrapper -- loads embedded wasm_bindgen glue and WASM blob.
{worker_js}

wasm_bindgen("{wasm_url}")
    .catch(function(e) {{ console.error("Worker WASM init failed:", e); }});
"#
    );

    let js_blob_parts = js_sys::Array::new();
    js_blob_parts.push(&JsValue::from_str(&wrapper_js));
    let js_blob_opts = web_sys::BlobPropertyBag::new();
    js_blob_opts.set_type("application/javascript");
    let js_blob =
        web_sys::Blob::new_with_str_sequence_and_options(&js_blob_parts, &js_blob_opts)?;
    let js_url = web_sys::Url::create_object_url_with_blob(&js_blob)?;

    let worker = web_sys::Worker::new(&js_url)?;

    // The worker has already fetched the wrapper, so its URL can go.
    // The WASM URL stays alive because the async init inside the
    // worker may still be fetching it; the blob: reference is small.
    web_sys::Url::revoke_object_url(&js_url).ok();

    Ok(worker)
}

/// Create a JS Promise along with its resolve and reject functions.
fn new_promise() -> Result<(js_sys::Promise, js_sys::Function, js_sys::Function), WorkerError> {
    let resolve = Rc::new(RefCell::new(None::<js_sys::Function>));
    let reject = Rc::new(RefCell::new(None::<js_sys::Function>));
    let resolve_clone = Rc::clone(&resolve);
    let reject_clone = Rc::clone(&reject);

    let promise = js_sys::Promise::new(&mut move |res, rej| {
        *resolve_clone.borrow_mut() = Some(res);
        *reject_clone.borrow_mut() = Some(rej);
    });

    let resolve_fn = resolve
        .borrow_mut()
        .take()
        .ok_or_else(|| WorkerError::Channel("resolve not captured".into()))?;
    let reject_fn = reject
        .borrow_mut()
        .take()
        .ok_or_else(|| WorkerError::Channel("reject not captured".into()))?;

    Ok((promise, resolve_fn, reject_fn))
}
