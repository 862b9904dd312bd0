// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backend over the page's 3D library.
//!
//! The page installs an adapter at `globalThis.vista` exposing
//! `createRenderer`, `createControls`, `createOverlay` and `createMixer`.
//! Scenes cross the boundary as JSON, re-sent only when the scene revision
//! changes; model and environment bytes are uploaded once per node.
//! Mixers are created by node id, after that node's bytes were uploaded.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use js_sys::Float32Array;
use serde_json::json;
use vista_scene_port::{
    AnimationClip, Backend, CameraState, Controls, ControlsSettings, Environment, Mixer,
    ModelRoot, NodeId, PerfOverlay, PortError, Renderer, RendererSettings, Scene, SceneNode,
};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::dom::DomSurface;

#[wasm_bindgen]
extern "C" {
    /// Renderer owned by the page adapter.
    pub type JsRenderer;
    /// Orbit controls owned by the page adapter.
    pub type JsControls;
    /// Frame statistics panel.
    pub type JsOverlay;
    /// Animation mixer bound to one uploaded model.
    pub type JsMixer;

    #[wasm_bindgen(catch, js_namespace = vista, js_name = createRenderer)]
    fn js_create_renderer(container: &HtmlElement, settings: &str) -> Result<JsRenderer, JsValue>;
    #[wasm_bindgen(method, js_name = setPixelRatio)]
    fn set_pixel_ratio(this: &JsRenderer, ratio: f32);
    #[wasm_bindgen(method, js_name = setSize)]
    fn set_size(this: &JsRenderer, width: u32, height: u32);
    #[wasm_bindgen(method, js_name = syncScene)]
    fn sync_scene(this: &JsRenderer, scene: &str);
    #[wasm_bindgen(method, js_name = uploadModel)]
    fn upload_model(this: &JsRenderer, node: f64, bytes: &[u8]);
    #[wasm_bindgen(method, js_name = uploadEnvironment)]
    fn upload_environment(this: &JsRenderer, bytes: &[u8]);
    #[wasm_bindgen(method)]
    fn render(this: &JsRenderer, camera: &str);
    #[wasm_bindgen(method)]
    fn dispose(this: &JsRenderer);

    #[wasm_bindgen(catch, js_namespace = vista, js_name = createControls)]
    fn js_create_controls(container: &HtmlElement, settings: &str) -> Result<JsControls, JsValue>;
    #[wasm_bindgen(method)]
    fn update(this: &JsControls, pose: &Float32Array) -> bool;
    #[wasm_bindgen(method)]
    fn dispose(this: &JsControls);

    #[wasm_bindgen(catch, js_namespace = vista, js_name = createOverlay)]
    fn js_create_overlay(container: &HtmlElement) -> Result<JsOverlay, JsValue>;
    #[wasm_bindgen(method)]
    fn update(this: &JsOverlay, delta: f32);

    #[wasm_bindgen(js_namespace = vista, js_name = createMixer)]
    fn js_create_mixer(node: f64, root: &str) -> JsMixer;
    #[wasm_bindgen(method)]
    fn play(this: &JsMixer, clip: &str);
    #[wasm_bindgen(method)]
    fn update(this: &JsMixer, delta: f32);
}

fn backend_error(what: &str, err: &JsValue) -> PortError {
    let detail = err.as_string().unwrap_or_else(|| format!("{err:?}"));
    PortError::Backend(format!("{what}: {detail}"))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, PortError> {
    serde_json::to_string(value).map_err(|e| PortError::Invariant(e.to_string()))
}

/// Camera state as the adapter expects it.
pub(crate) fn camera_json(camera: &CameraState) -> String {
    json!({
        "position": camera.position,
        "target": camera.target,
        "up": camera.up,
        "fov": camera.fov_y_degrees,
        "aspect": camera.aspect(),
        "near": camera.near,
        "far": camera.far,
    })
    .to_string()
}

/// Model nodes and the environment not yet handed to the adapter.
///
/// Marks returned model ids as uploaded. The environment flag flips the
/// first time a loaded map is seen.
pub(crate) fn pending_uploads(
    scene: &Scene,
    uploaded: &mut BTreeSet<NodeId>,
    environment_uploaded: &mut bool,
) -> (Vec<NodeId>, bool) {
    let models: Vec<NodeId> = scene
        .nodes()
        .filter(|(_, node)| matches!(node, SceneNode::Model(_)))
        .map(|(id, _)| id)
        .filter(|id| uploaded.insert(*id))
        .collect();
    let environment = matches!(scene.environment(), Some(Environment::Map(_))) && !*environment_uploaded;
    if environment {
        *environment_uploaded = true;
    }
    (models, environment)
}

/// Whether the adapter already holds the scene graph for `node`.
pub(crate) fn can_bind(node: NodeId, uploaded: &BTreeSet<NodeId>) -> bool {
    uploaded.contains(&node)
}

type Uploaded = Rc<RefCell<BTreeSet<NodeId>>>;

/// [`Backend`] delegating to `globalThis.vista`.
///
/// Renderers and mixers share the set of uploaded model nodes.
#[derive(Clone, Debug, Default)]
pub struct JsBackend {
    uploaded: Uploaded,
}

impl JsBackend {
    /// Backend bound to the global adapter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for JsBackend {
    type Surface = DomSurface;

    fn create_renderer(
        &self,
        surface: &mut DomSurface,
        settings: &RendererSettings,
    ) -> Result<Box<dyn Renderer>, PortError> {
        let renderer = js_create_renderer(surface.element(), &to_json(settings)?)
            .map_err(|e| backend_error("createRenderer", &e))?;
        Ok(Box::new(WebRenderer {
            inner: renderer,
            size: (0, 0),
            revision: None,
            uploaded: Rc::clone(&self.uploaded),
            environment_uploaded: false,
            disposed: false,
        }))
    }

    fn create_controls(
        &self,
        surface: &mut DomSurface,
        _camera: &CameraState,
        settings: &ControlsSettings,
    ) -> Result<Box<dyn Controls>, PortError> {
        let controls = js_create_controls(surface.element(), &to_json(settings)?)
            .map_err(|e| backend_error("createControls", &e))?;
        Ok(Box::new(WebControls {
            inner: controls,
            disposed: false,
        }))
    }

    fn create_overlay(&self, surface: &mut DomSurface) -> Result<Box<dyn PerfOverlay>, PortError> {
        let overlay =
            js_create_overlay(surface.element()).map_err(|e| backend_error("createOverlay", &e))?;
        Ok(Box::new(WebOverlay(overlay)))
    }

    fn create_mixer(&self, node: NodeId, root: &ModelRoot) -> Box<dyn Mixer> {
        let root = serde_json::to_string(root).unwrap_or_default();
        Box::new(WebMixer {
            node,
            root,
            uploaded: Rc::clone(&self.uploaded),
            inner: None,
            clip: None,
            time: 0.0,
        })
    }
}

struct WebRenderer {
    inner: JsRenderer,
    size: (u32, u32),
    revision: Option<u64>,
    uploaded: Uploaded,
    environment_uploaded: bool,
    disposed: bool,
}

impl WebRenderer {
    fn sync(&mut self, scene: &Scene) {
        if self.revision == Some(scene.revision()) {
            return;
        }
        self.revision = Some(scene.revision());
        let (models, environment) = pending_uploads(
            scene,
            &mut self.uploaded.borrow_mut(),
            &mut self.environment_uploaded,
        );
        for id in models {
            if let Some(SceneNode::Model(root)) = scene.node(id) {
                self.inner.upload_model(id.0 as f64, &root.source);
            }
        }
        if environment {
            if let Some(Environment::Map(map)) = scene.environment() {
                self.inner.upload_environment(&map.source);
            }
        }
        match serde_json::to_string(scene) {
            Ok(json) => self.inner.sync_scene(&json),
            Err(err) => tracing::error!(target: "vista", %err, "scene not serializable"),
        }
    }
}

impl Renderer for WebRenderer {
    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.inner.set_pixel_ratio(ratio);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.inner.set_size(width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &CameraState) {
        if self.disposed {
            return;
        }
        self.sync(scene);
        self.inner.render(&camera_json(camera));
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.inner.dispose();
        }
    }
}

struct WebControls {
    inner: JsControls,
    disposed: bool,
}

impl Controls for WebControls {
    fn update(&mut self, camera: &mut CameraState) -> bool {
        if self.disposed {
            return false;
        }
        let mut pose = [0.0_f32; 6];
        pose[..3].copy_from_slice(&camera.position);
        pose[3..].copy_from_slice(&camera.target);
        let shared = Float32Array::from(&pose[..]);
        let moved = self.inner.update(&shared);
        shared.copy_to(&mut pose);
        camera.position.copy_from_slice(&pose[..3]);
        camera.target.copy_from_slice(&pose[3..]);
        moved
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.inner.dispose();
        }
    }
}

struct WebOverlay(JsOverlay);

impl PerfOverlay for WebOverlay {
    fn update(&mut self, frame_delta: f32) {
        self.0.update(frame_delta);
    }
}

/// Mixer bound lazily: the adapter mixer is created on the first advance
/// after the renderer uploaded `node`, then starts the requested clip.
struct WebMixer {
    node: NodeId,
    root: String,
    uploaded: Uploaded,
    inner: Option<JsMixer>,
    clip: Option<AnimationClip>,
    time: f32,
}

impl WebMixer {
    fn bound(&mut self) -> Option<&JsMixer> {
        if self.inner.is_none() && can_bind(self.node, &self.uploaded.borrow()) {
            let mixer = js_create_mixer(self.node.0 as f64, &self.root);
            if let Some(clip) = &self.clip {
                mixer.play(&clip.name);
            }
            self.inner = Some(mixer);
        }
        self.inner.as_ref()
    }
}

impl Mixer for WebMixer {
    fn play(&mut self, clip: &AnimationClip) {
        self.clip = Some(clip.clone());
        self.time = 0.0;
        if let Some(mixer) = &self.inner {
            mixer.play(&clip.name);
        }
    }

    fn advance(&mut self, delta: f32) {
        let Some(mixer) = self.bound() else {
            return;
        };
        mixer.update(delta);
        if let Some(clip) = &self.clip {
            self.time += delta;
            if clip.duration_secs > 0.0 {
                self.time %= clip.duration_secs;
            }
        }
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn active_clip(&self) -> Option<&AnimationClip> {
        self.clip.as_ref()
    }
}
