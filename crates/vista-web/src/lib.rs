// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! wasm-bindgen host for Vista viewports.
//!
//! Wires the viewport core to the browser: a container element as the
//! drawing surface, `requestAnimationFrame` pacing, `window` resize events,
//! `performance.now()`, `fetch` for assets and the console for diagnostics.
//! Drawing itself is delegated to the page's 3D library through the adapter
//! described in [`bridge`].
//!
//! # Usage (from JavaScript)
//!
//! ```js
//! import init, { WebViewport } from 'vista-web';
//!
//! await init();
//! globalThis.vista = makeThreeAdapter();
//! const viewport = new WebViewport('skinning-morphing', '{"log_enable":false}');
//! viewport.mount_by_id('container');
//! // on route change
//! viewport.unmount();
//! ```
#![deny(missing_docs)]

pub mod bridge;
pub mod console;
pub mod dom;
pub mod fetch;

use std::rc::Rc;

use vista_app_core::prefs::ViewportPrefs;
use vista_viewport::{LoopState, Platform, SceneController, SceneProfile};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

pub use bridge::JsBackend;
pub use console::ConsoleSink;
pub use dom::{DomSurface, PerformanceTime, RafScheduler, WindowResizeSource};
pub use fetch::{FetchSource, WasmSpawner};

#[cfg(feature = "console-panic")]
#[wasm_bindgen(start)]
/// Initialize console panic hook for better error messages in browser.
pub fn init_console_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Resolve a profile name and optional JSON preferences.
pub fn resolve_profile(
    name: &str,
    prefs_json: Option<&str>,
) -> Result<(SceneProfile, ViewportPrefs), String> {
    let mut profile = SceneProfile::by_name(name).ok_or_else(|| {
        format!(
            "unknown profile {name:?}; expected one of {}",
            SceneProfile::NAMES.join(", ")
        )
    })?;
    let prefs = match prefs_json.map(str::trim).filter(|s| !s.is_empty()) {
        Some(json) => serde_json::from_str::<ViewportPrefs>(json)
            .map_err(|e| format!("invalid viewport prefs: {e}"))?,
        None => ViewportPrefs::default(),
    };
    profile.apply_prefs(&prefs);
    Ok((profile, prefs))
}

fn loop_state_name(state: LoopState) -> &'static str {
    match state {
        LoopState::Idle => "idle",
        LoopState::Starting => "starting",
        LoopState::Running => "running",
        LoopState::Stopped => "stopped",
    }
}

/// One viewport bound to a page container.
///
/// Dropping (or `free()` from JavaScript) unmounts.
#[wasm_bindgen]
pub struct WebViewport {
    controller: SceneController<JsBackend>,
}

#[wasm_bindgen]
impl WebViewport {
    /// Viewport for the named profile (`keyframes` or `skinning-morphing`).
    #[wasm_bindgen(constructor)]
    pub fn new(profile: &str, prefs_json: Option<String>) -> Result<WebViewport, JsError> {
        let (profile, prefs) =
            resolve_profile(profile, prefs_json.as_deref()).map_err(|e| JsError::new(&e))?;
        let platform = Platform {
            backend: Rc::new(JsBackend::new()),
            scheduler: Rc::new(RafScheduler::new()),
            resize: Rc::new(WindowResizeSource::new()),
            time: Rc::new(PerformanceTime::new()),
            source: Rc::new(FetchSource),
            spawner: Rc::new(WasmSpawner),
            sink: Rc::new(ConsoleSink::new(prefs.log_enable)),
        };
        Ok(Self {
            controller: SceneController::new(profile, platform),
        })
    }

    /// Mount into `container`. Returns whether the viewport is now running.
    ///
    /// A missing container is reported to the console and can be retried.
    pub fn mount(&mut self, container: Option<HtmlElement>) -> bool {
        self.controller
            .mount(container.map(DomSurface::new))
            .is_ok()
    }

    /// Mount into the element with id `id`.
    pub fn mount_by_id(&mut self, id: &str) -> bool {
        self.controller.mount(DomSurface::by_id(id)).is_ok()
    }

    /// Re-measure the container (for layout changes that do not resize the window).
    pub fn resize(&self) {
        if let Some(host) = self.controller.host() {
            host.handle_resize();
        }
    }

    /// Stop rendering and release the container. Idempotent.
    pub fn unmount(&mut self) {
        self.controller.unmount();
    }

    /// Whether a viewport is mounted.
    pub fn is_mounted(&self) -> bool {
        self.controller.is_mounted()
    }

    /// `idle`, `starting`, `running` or `stopped`.
    pub fn loop_state(&self) -> String {
        loop_state_name(self.controller.loop_state()).to_owned()
    }

    /// Frames rendered since mount.
    pub fn frames(&self) -> f64 {
        self.controller.host().map_or(0.0, |h| h.frames() as f64)
    }
}
