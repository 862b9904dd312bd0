// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewport session: every resource of one mount-to-unmount lifecycle.
//!
//! Fields are constructed in a fixed order (surface, renderer, camera,
//! controls, overlay, scene, clock) and never exist half-built: a session
//! either holds all of them or was never created. Frames stop being ready
//! once the session is released.

use std::rc::Rc;

use vista_scene_port::{
    aspect_of, Backend, Background, CameraState, Color, Controls, ControlsSettings, DecodedModel,
    Environment, EnvironmentMap, NodeId, PerfOverlay, PortError, RenderSurface, Renderer,
    RendererSettings, Scene, SceneNode,
};

use crate::clock::{Clock, TimeSource};
use crate::mixer::AnimationSlot;
use crate::render_loop::FramePass;

/// Perspective camera parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSetup {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near plane.
    pub near: f32,
    /// Far plane.
    pub far: f32,
    /// Initial position.
    pub position: [f32; 3],
}

impl CameraSetup {
    /// Camera with the given aspect ratio.
    pub fn build(&self, aspect: f32) -> CameraState {
        CameraState::perspective(self.fov_y_degrees, aspect, self.near, self.far)
            .with_position(self.position)
    }
}

impl Default for CameraSetup {
    fn default() -> Self {
        Self {
            fov_y_degrees: 50.0,
            near: 0.1,
            far: 2000.0,
            position: [0.0, 0.0, 5.0],
        }
    }
}

/// Everything needed to construct a session's resources.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportSetup {
    /// Camera parameters.
    pub camera: CameraSetup,
    /// Renderer settings.
    pub renderer: RendererSettings,
    /// Orbit controls settings.
    pub controls: ControlsSettings,
}

/// Live resources of one mounted viewport.
pub struct Session<B: Backend> {
    surface: B::Surface,
    renderer: Box<dyn Renderer>,
    camera: CameraState,
    controls: Box<dyn Controls>,
    overlay: Box<dyn PerfOverlay>,
    scene: Scene,
    clock: Clock,
    animation: AnimationSlot,
    placeholder: Option<NodeId>,
    model: Option<NodeId>,
    released: bool,
}

impl<B: Backend> Session<B> {
    /// Construct every resource against `surface`.
    ///
    /// The surface is cleared first. On failure, anything already built is
    /// disposed and the surface is cleared again.
    pub fn build(
        backend: &B,
        mut surface: B::Surface,
        time: Rc<dyn TimeSource>,
        setup: &ViewportSetup,
    ) -> Result<Self, PortError> {
        surface.clear();
        let (width, height) = surface.content_box();

        let mut renderer = match backend.create_renderer(&mut surface, &setup.renderer) {
            Ok(renderer) => renderer,
            Err(err) => {
                surface.clear();
                return Err(err);
            }
        };
        renderer.set_pixel_ratio(surface.device_pixel_ratio());
        renderer.set_size(width, height);

        let mut camera = setup.camera.build(aspect_of(width, height));

        let mut controls = match backend.create_controls(&mut surface, &camera, &setup.controls) {
            Ok(controls) => controls,
            Err(err) => {
                renderer.dispose();
                surface.clear();
                return Err(err);
            }
        };
        controls.update(&mut camera);

        let overlay = match backend.create_overlay(&mut surface) {
            Ok(overlay) => overlay,
            Err(err) => {
                controls.dispose();
                renderer.dispose();
                surface.clear();
                return Err(err);
            }
        };

        Ok(Self {
            surface,
            renderer,
            camera,
            controls,
            overlay,
            scene: Scene::new(),
            clock: Clock::new(time),
            animation: AnimationSlot::empty(),
            placeholder: None,
            model: None,
            released: false,
        })
    }

    /// Re-measure the surface and apply it to camera and renderer.
    ///
    /// Returns the new size, or `None` once released.
    pub fn resize_to_surface(&mut self) -> Option<(u32, u32)> {
        if self.released {
            return None;
        }
        let (width, height) = self.surface.content_box();
        self.camera.set_aspect(aspect_of(width, height));
        self.renderer.set_size(width, height);
        Some((width, height))
    }

    /// Mark `id` as the placeholder removed when a model attaches.
    pub fn set_placeholder(&mut self, id: Option<NodeId>) {
        self.placeholder = id;
    }

    /// Attach a decoded model, bind its animation, and drop the placeholder.
    ///
    /// The root joins the scene before the mixer is created, so the mixer
    /// binds to the node the renderer will upload. A previously attached
    /// model is replaced.
    pub fn attach_model(&mut self, backend: &B, model: DecodedModel) -> NodeId {
        let DecodedModel { root, clips } = model;
        if let Some(previous) = self.model.take() {
            self.scene.remove(previous);
        }
        let id = self.scene.add(SceneNode::Model(root));
        self.animation = match self.scene.node(id) {
            Some(SceneNode::Model(root)) => AnimationSlot::bind(backend, id, root, &clips),
            _ => AnimationSlot::empty(),
        };
        if let Some(placeholder) = self.placeholder.take() {
            self.scene.remove(placeholder);
        }
        self.model = Some(id);
        id
    }

    /// Use `map` for lighting and as the background.
    pub fn apply_environment(&mut self, map: EnvironmentMap) {
        self.scene.set_environment(Environment::Map(map));
        self.scene.set_background(Background::Environment);
    }

    /// Solid background color.
    pub fn apply_background(&mut self, color: Color) {
        self.scene.set_background(Background::Color(color));
    }

    /// Dispose controls and renderer and clear the surface. Idempotent; also
    /// runs on drop.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.controls.dispose();
        self.renderer.dispose();
        self.surface.clear();
    }

    /// Whether [`Session::release`] ran.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// The drawing surface.
    pub fn surface(&self) -> &B::Surface {
        &self.surface
    }

    /// Current camera.
    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    /// Current scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Renderer output size.
    pub fn renderer_size(&self) -> (u32, u32) {
        self.renderer.size()
    }

    /// Animation slot.
    pub fn animation(&self) -> &AnimationSlot {
        &self.animation
    }

    /// Session clock.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Placeholder node still in the scene, if any.
    pub fn placeholder(&self) -> Option<NodeId> {
        self.placeholder
    }

    /// Attached model node, if any.
    pub fn model(&self) -> Option<NodeId> {
        self.model
    }
}

impl<B: Backend> FramePass for Session<B> {
    fn is_ready(&self) -> bool {
        !self.released
    }

    fn run_frame(&mut self) {
        let delta = self.clock.tick();
        self.animation.advance(delta);
        self.controls.update(&mut self.camera);
        self.overlay.update(delta);
        self.renderer.render(&self.scene, &self.camera);
    }
}

impl<B: Backend> Drop for Session<B> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<B: Backend> std::fmt::Debug for Session<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("camera", &self.camera)
            .field("nodes", &self.scene.len())
            .field("animation", &self.animation)
            .field("placeholder", &self.placeholder)
            .field("model", &self.model)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
