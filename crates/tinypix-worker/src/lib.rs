//! Web worker entry point for tinypix local image processing.
//!
//! This crate compiles to a standalone WASM module that runs inside a
//! `Worker`. It receives file bytes and JSON-encoded `ProcessOptions`
//! via `postMessage`, runs `tinypix_pipeline::process`, and posts
//! progress plus a single terminal message back.
//!
//! File and result bytes cross the boundary as raw `Uint8Array`
//! buffers to avoid JSON-encoding megabytes of binary data. Running
//! the pipeline here keeps the main thread free for UI updates while
//! a file is processed.

pub mod protocol;

use crate::protocol::{Exchange, Outbound};
use tinypix_pipeline::ProcessOptions;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Message protocol: the main thread sends a JS object with:
/// - `fileBytes`: `Uint8Array` containing the raw image file bytes
/// - `optionsJson`: `String` containing JSON-serialized `ProcessOptions`
///
/// The worker responds with objects tagged by a `type` field:
/// - `{type: "progress", progress}` zero or more times, then exactly
///   one of
/// - `{type: "success", result}` where `result` carries `bytes`
///   (`Uint8Array`), `width`, `height`, and `size`, or
/// - `{type: "error", error}` with a descriptive message.
///
/// # Worker entry point
///
/// Called automatically when the WASM module is instantiated in the
/// worker context.
#[wasm_bindgen(start)]
#[allow(clippy::expect_used)]
pub fn worker_main() {
    console_error_panic_hook::set_once();

    // Get the worker global scope.
    let global: web_sys::DedicatedWorkerGlobalScope = js_sys::global()
        .dyn_into()
        .expect_throw("not running in a DedicatedWorkerGlobalScope");

    // Set up the message handler.
    let onmessage =
        Closure::<dyn FnMut(web_sys::MessageEvent)>::new(move |event: web_sys::MessageEvent| {
            handle_message(&event);
        });
    global.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget(); // leak -- lives for the worker lifetime
}

/// Handle one request from the main thread.
///
/// Malformed requests and pipeline failures both end the exchange with
/// a single error message; the pipeline itself never retries.
fn handle_message(event: &web_sys::MessageEvent) {
    let mut exchange = Exchange::new(|message| post_outbound(&message));

    match parse_request(&event.data()) {
        Ok((bytes, options)) => {
            let outcome = tinypix_pipeline::process(&bytes, &options, |p| exchange.progress(p));
            match outcome {
                Ok(result) => exchange.succeed(result),
                Err(e) => exchange.fail(e.to_string()),
            }
        }
        Err(message) => exchange.fail(message),
    }
}

/// Extract the file bytes and options from a request message.
fn parse_request(data: &JsValue) -> Result<(Vec<u8>, ProcessOptions), String> {
    let bytes: js_sys::Uint8Array = js_sys::Reflect::get(data, &JsValue::from_str("fileBytes"))
        .map_err(|_| "request is missing fileBytes".to_owned())?
        .dyn_into()
        .map_err(|_| "fileBytes is not a Uint8Array".to_owned())?;

    let options_json = js_sys::Reflect::get(data, &JsValue::from_str("optionsJson"))
        .map_err(|_| "request is missing optionsJson".to_owned())?
        .as_string()
        .ok_or_else(|| "optionsJson is not a string".to_owned())?;

    let options: ProcessOptions = serde_json::from_str(&options_json)
        .map_err(|e| format!("failed to parse options: {e}"))?;

    Ok((bytes.to_vec(), options))
}

/// Serialize one outbound message and post it to the main thread.
#[expect(clippy::cast_precision_loss)]
fn post_outbound(message: &Outbound) {
    let response = js_sys::Object::new();
    let ok = match message {
        Outbound::Progress(value) => {
            set(&response, "type", &JsValue::from_str("progress"))
                && set(&response, "progress", &JsValue::from_f64(f64::from(*value)))
        }
        Outbound::Success(result) => {
            let payload = js_sys::Object::new();
            let bytes: JsValue = js_sys::Uint8Array::from(result.bytes.as_slice()).into();
            set(&payload, "bytes", &bytes)
                && set(
                    &payload,
                    "width",
                    &JsValue::from_f64(f64::from(result.dimensions.width)),
                )
                && set(
                    &payload,
                    "height",
                    &JsValue::from_f64(f64::from(result.dimensions.height)),
                )
                && set(&payload, "size", &JsValue::from_f64(result.size() as f64))
                && set(&response, "type", &JsValue::from_str("success"))
                && set(&response, "result", payload.as_ref())
        }
        Outbound::Error(message) => {
            set(&response, "type", &JsValue::from_str("error"))
                && set(&response, "error", &JsValue::from_str(message))
        }
    };
    if !ok {
        return;
    }
    if let Ok(global) = js_sys::global().dyn_into::<web_sys::DedicatedWorkerGlobalScope>() {
        let _ = global.post_message(&response);
    }
}

fn set(target: &js_sys::Object, key: &str, value: &JsValue) -> bool {
    js_sys::Reflect::set(target, &JsValue::from_str(key), value).unwrap_or(false)
}
