// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Asset loader: non-blocking fetch + decode with liveness-guarded completion.
//!
//! Two layers:
//!
//! - [`AssetLoader::fetch_model`] / [`AssetLoader::fetch_environment`] return
//!   a future resolving to the decoded payload or a typed [`LoadError`].
//! - [`AssetLoader::load_model`] / [`AssetLoader::load_environment`] spawn
//!   that future and dispatch to [`LoadHandlers`] exactly once, unless the
//!   owning session was torn down first. Network work is not cancelled; its
//!   result is discarded.

mod environment;
mod model;

use std::future::Future;
use std::rc::Rc;

use futures::executor::LocalSpawner;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use thiserror::Error;
use vista_scene_port::{DecodedModel, EnvironmentMap};

use crate::diagnostics::{DiagnosticsSink, Field};
use crate::liveness::Liveness;

pub use self::environment::decode_environment;
pub use self::model::{decode_model, DRACO_EXTENSION};

/// Failure fetching or decoding an asset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Transport-level failure.
    #[error("network error fetching {url}: {reason}")]
    Network {
        /// Requested URL.
        url: String,
        /// Transport message.
        reason: String,
    },
    /// Non-success HTTP status.
    #[error("HTTP {status} fetching {url}")]
    Http {
        /// Requested URL.
        url: String,
        /// Response status.
        status: u16,
    },
    /// The bytes are not a valid asset of the expected format.
    #[error("failed to decode {url}: {reason}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder message.
        reason: String,
    },
    /// The asset needs a codec whose decoder path was never configured.
    #[error("{url} requires the {codec} decoder but no decoder path is configured")]
    MissingDecoder {
        /// Requested URL.
        url: String,
        /// Missing codec.
        codec: &'static str,
    },
}

impl LoadError {
    /// URL the failure relates to.
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. }
            | Self::Http { url, .. }
            | Self::Decode { url, .. }
            | Self::MissingDecoder { url, .. } => url,
        }
    }
}

/// Decoder dependencies. Must be configured before a load that needs them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Location of the Draco mesh decoder.
    pub draco_decoder_path: Option<String>,
}

/// Monotonic progress reporter handed to an [`AssetSource`].
///
/// Fractions are clamped to `[0, 1]`; non-finite and regressing values are
/// dropped. Reports after session teardown are dropped as well.
pub struct Progress {
    last: f32,
    callback: Option<Box<dyn FnMut(f32)>>,
    liveness: Liveness,
}

impl Progress {
    /// Reporter forwarding to `callback` while `liveness` holds.
    pub fn new(callback: Option<Box<dyn FnMut(f32)>>, liveness: Liveness) -> Self {
        Self {
            last: 0.0,
            callback,
            liveness,
        }
    }

    /// Reporter that only tracks the high-water mark.
    pub fn silent() -> Self {
        Self::new(None, Liveness::new())
    }

    /// Report a completion fraction.
    pub fn report(&mut self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction < self.last {
            return;
        }
        self.last = fraction;
        if !self.liveness.is_alive() {
            return;
        }
        if let Some(callback) = self.callback.as_mut() {
            callback(fraction);
        }
    }

    /// Report `loaded` of `total` bytes. Unknown or zero totals report nothing.
    pub fn report_bytes(&mut self, loaded: u64, total: Option<u64>) {
        if let Some(total) = total.filter(|t| *t > 0) {
            self.report(loaded as f32 / total as f32);
        }
    }

    /// Highest fraction reported so far.
    pub fn last(&self) -> f32 {
        self.last
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

/// Fetches raw asset bytes.
pub trait AssetSource {
    /// Start fetching `url`. Must not block; progress is informational.
    fn fetch(&self, url: &str, progress: Progress) -> LocalBoxFuture<'static, Result<Vec<u8>, LoadError>>;
}

/// Runs completion tasks on the UI thread.
pub trait Spawner {
    /// Spawn a local (non-`Send`) task.
    fn spawn_task(&self, task: LocalBoxFuture<'static, ()>);
}

impl Spawner for LocalSpawner {
    fn spawn_task(&self, task: LocalBoxFuture<'static, ()>) {
        if let Err(err) = LocalSpawnExt::spawn_local(self, task) {
            tracing::error!(target: "vista", %err, "asset task could not be spawned");
        }
    }
}

/// Completion contract of one load request.
pub struct LoadHandlers<T> {
    on_success: Box<dyn FnOnce(T)>,
    on_error: Box<dyn FnOnce(LoadError)>,
    on_progress: Option<Box<dyn FnMut(f32)>>,
}

impl<T> LoadHandlers<T> {
    /// Handlers with success and error callbacks.
    pub fn new<S, E>(on_success: S, on_error: E) -> Self
    where
        S: FnOnce(T) + 'static,
        E: FnOnce(LoadError) + 'static,
    {
        Self {
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
            on_progress: None,
        }
    }

    /// Attach a progress callback.
    pub fn on_progress<P>(mut self, on_progress: P) -> Self
    where
        P: FnMut(f32) + 'static,
    {
        self.on_progress = Some(Box::new(on_progress));
        self
    }
}

/// Issues asset loads on behalf of one session.
pub struct AssetLoader {
    source: Rc<dyn AssetSource>,
    spawner: Rc<dyn Spawner>,
    sink: Rc<dyn DiagnosticsSink>,
    liveness: Liveness,
    decoders: DecoderConfig,
}

impl AssetLoader {
    /// Loader whose completions are gated on `liveness`.
    pub fn new(
        source: Rc<dyn AssetSource>,
        spawner: Rc<dyn Spawner>,
        sink: Rc<dyn DiagnosticsSink>,
        liveness: Liveness,
    ) -> Self {
        Self {
            source,
            spawner,
            sink,
            liveness,
            decoders: DecoderConfig::default(),
        }
    }

    /// Builder-style decoder path.
    pub fn with_decoder_path(mut self, path: Option<String>) -> Self {
        self.decoders.draco_decoder_path = path;
        self
    }

    /// Configure the Draco decoder path for subsequent loads.
    pub fn set_decoder_path(&mut self, path: impl Into<String>) {
        self.decoders.draco_decoder_path = Some(path.into());
    }

    /// Current decoder configuration.
    pub fn decoders(&self) -> &DecoderConfig {
        &self.decoders
    }

    /// Fetch and decode a glTF/GLB model.
    pub fn fetch_model(
        &self,
        url: &str,
        progress: Progress,
    ) -> LocalBoxFuture<'static, Result<DecodedModel, LoadError>> {
        let fetch = self.source.fetch(url, progress);
        let decoders = self.decoders.clone();
        let url = url.to_owned();
        Box::pin(async move {
            let bytes = fetch.await?;
            decode_model(&url, &bytes, &decoders)
        })
    }

    /// Fetch and decode a Radiance HDR panorama.
    pub fn fetch_environment(
        &self,
        url: &str,
        progress: Progress,
    ) -> LocalBoxFuture<'static, Result<EnvironmentMap, LoadError>> {
        let fetch = self.source.fetch(url, progress);
        let url = url.to_owned();
        Box::pin(async move {
            let bytes = fetch.await?;
            decode_environment(&url, &bytes)
        })
    }

    /// Spawn a model load; `handlers` fire at most once, and never after teardown.
    pub fn load_model(&self, url: &str, handlers: LoadHandlers<DecodedModel>) {
        let LoadHandlers {
            on_success,
            on_error,
            on_progress,
        } = handlers;
        let progress = Progress::new(on_progress, self.liveness.clone());
        let task = self.fetch_model(url, progress);
        self.dispatch(url, "model", task, on_success, on_error);
    }

    /// Spawn an environment load; `handlers` fire at most once, and never after teardown.
    pub fn load_environment(&self, url: &str, handlers: LoadHandlers<EnvironmentMap>) {
        let LoadHandlers {
            on_success,
            on_error,
            on_progress,
        } = handlers;
        let progress = Progress::new(on_progress, self.liveness.clone());
        let task = self.fetch_environment(url, progress);
        self.dispatch(url, "environment", task, on_success, on_error);
    }

    fn dispatch<T, F>(
        &self,
        url: &str,
        kind: &'static str,
        task: F,
        on_success: Box<dyn FnOnce(T)>,
        on_error: Box<dyn FnOnce(LoadError)>,
    ) where
        T: 'static,
        F: Future<Output = Result<T, LoadError>> + 'static,
    {
        let liveness = self.liveness.clone();
        let sink = Rc::clone(&self.sink);
        let url = url.to_owned();
        sink.trace("asset load issued", &[Field::new("kind", &kind), Field::new("url", &url)]);
        self.spawner.spawn_task(Box::pin(async move {
            let result = task.await;
            if !liveness.is_alive() {
                let outcome = match &result {
                    Ok(_) => "success".to_owned(),
                    Err(err) => err.to_string(),
                };
                sink.trace(
                    "discarding asset result for torn-down viewport",
                    &[
                        Field::new("kind", &kind),
                        Field::new("url", &url),
                        Field::new("outcome", &outcome),
                    ],
                );
                return;
            }
            match result {
                Ok(payload) => on_success(payload),
                Err(err) => on_error(err),
            }
        }));
    }
}

impl std::fmt::Debug for AssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLoader")
            .field("alive", &self.liveness.is_alive())
            .field("decoders", &self.decoders)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn progress_is_clamped_and_monotonic() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut progress = Progress::new(
            Some(Box::new(move |f| sink.borrow_mut().push(f))),
            Liveness::new(),
        );
        progress.report(0.25);
        progress.report(0.1);
        progress.report(f32::NAN);
        progress.report_bytes(5, Some(0));
        progress.report_bytes(5, None);
        progress.report(3.0);
        assert_eq!(*seen.borrow(), vec![0.25, 1.0]);
        assert!((progress.last() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn progress_after_revocation_is_dropped() {
        let seen = Rc::new(RefCell::new(0_u32));
        let counter = Rc::clone(&seen);
        let liveness = Liveness::new();
        let mut progress = Progress::new(
            Some(Box::new(move |_| *counter.borrow_mut() += 1)),
            liveness.clone(),
        );
        progress.report_bytes(1, Some(4));
        liveness.revoke();
        progress.report_bytes(4, Some(4));
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn load_error_exposes_url() {
        let err = LoadError::Http {
            url: "models/a.glb".into(),
            status: 404,
        };
        assert_eq!(err.url(), "models/a.glb");
        assert_eq!(err.to_string(), "HTTP 404 fetching models/a.glb");
    }
}
