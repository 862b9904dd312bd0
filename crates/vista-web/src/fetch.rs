// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Asset bytes over `window.fetch`, plus the `spawn_local` task spawner.

use futures::future::{FutureExt, LocalBoxFuture};
use js_sys::{Reflect, Uint8Array};
use vista_viewport::{AssetSource, LoadError, Progress, Spawner};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{ReadableStreamDefaultReader, Response};

/// Mid-stream progress stays below completion; compressed transfers can
/// deliver more bytes than `Content-Length` announces.
const STREAM_CEILING: f32 = 0.99;

/// Fetches assets relative to the page.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchSource;

impl AssetSource for FetchSource {
    fn fetch(&self, url: &str, progress: Progress) -> LocalBoxFuture<'static, Result<Vec<u8>, LoadError>> {
        fetch_bytes(url.to_owned(), progress).boxed_local()
    }
}

async fn fetch_bytes(url: String, mut progress: Progress) -> Result<Vec<u8>, LoadError> {
    let window = web_sys::window().ok_or_else(|| network(&url, "no window"))?;
    let response: Response = JsFuture::from(window.fetch_with_str(&url))
        .await
        .map_err(|e| network(&url, &describe(&e)))?
        .dyn_into()
        .map_err(|e| network(&url, &describe(&e)))?;

    if !response.ok() {
        return Err(LoadError::Http {
            url,
            status: response.status(),
        });
    }

    let total = response
        .headers()
        .get("content-length")
        .ok()
        .flatten()
        .as_deref()
        .and_then(parse_content_length);
    progress.report(0.0);

    let bytes = match response.body() {
        Some(body) => {
            let reader: ReadableStreamDefaultReader = body
                .get_reader()
                .dyn_into()
                .map_err(|e| network(&url, &describe(&e)))?;
            read_stream(&url, &reader, total, &mut progress).await?
        }
        None => {
            let buffer = response
                .array_buffer()
                .map_err(|e| network(&url, &describe(&e)))?;
            let buffer = JsFuture::from(buffer)
                .await
                .map_err(|e| network(&url, &describe(&e)))?;
            Uint8Array::new(&buffer).to_vec()
        }
    };

    progress.report(1.0);
    Ok(bytes)
}

async fn read_stream(
    url: &str,
    reader: &ReadableStreamDefaultReader,
    total: Option<u64>,
    progress: &mut Progress,
) -> Result<Vec<u8>, LoadError> {
    let capacity = total.and_then(|t| usize::try_from(t).ok()).unwrap_or(0);
    let mut bytes = Vec::with_capacity(capacity);
    let done_key = JsValue::from_str("done");
    let value_key = JsValue::from_str("value");
    loop {
        let step = JsFuture::from(reader.read())
            .await
            .map_err(|e| network(url, &describe(&e)))?;
        let done = Reflect::get(&step, &done_key)
            .map_err(|e| network(url, &describe(&e)))?
            .as_bool()
            .unwrap_or(true);
        if done {
            break;
        }
        let chunk: Uint8Array = Reflect::get(&step, &value_key)
            .map_err(|e| network(url, &describe(&e)))?
            .dyn_into()
            .map_err(|e| network(url, &describe(&e)))?;
        let start = bytes.len();
        bytes.resize(start + chunk.length() as usize, 0);
        chunk.copy_to(&mut bytes[start..]);
        if let Some(fraction) = stream_fraction(bytes.len() as u64, total) {
            progress.report(fraction);
        }
    }
    reader.release_lock();
    Ok(bytes)
}

fn network(url: &str, reason: &str) -> LoadError {
    LoadError::Network {
        url: url.to_owned(),
        reason: reason.to_owned(),
    }
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Parse a `Content-Length` header value. Zero or malformed yields `None`.
pub(crate) fn parse_content_length(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

/// Fraction of `total` received so far, held below completion. `None` when
/// the size is unknown.
pub(crate) fn stream_fraction(loaded: u64, total: Option<u64>) -> Option<f32> {
    let total = total.filter(|t| *t > 0)?;
    Some((loaded as f32 / total as f32).min(STREAM_CEILING))
}

/// Runs completion tasks on the browser microtask queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct WasmSpawner;

impl Spawner for WasmSpawner {
    fn spawn_task(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
