// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backend port traits defining the rendering capability contract.

use crate::{
    AnimationClip, CameraState, ControlsSettings, ModelRoot, NodeId, PortError, RendererSettings,
    Scene,
};

/// A drawing surface owned by one viewport session (a DOM container, a
/// window, an offscreen buffer).
pub trait RenderSurface {
    /// Current content box in CSS/logical pixels.
    fn content_box(&self) -> (u32, u32);

    /// Physical pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f32 {
        1.0
    }

    /// Remove everything previously attached to the surface.
    fn clear(&mut self);
}

/// Draws a [`Scene`] through a [`CameraState`].
///
/// Takes no timing parameters; frame deltas belong to the session clock.
pub trait Renderer {
    /// Physical pixels per logical pixel of the output buffer.
    fn set_pixel_ratio(&mut self, ratio: f32);

    /// Resize the output buffer (logical pixels).
    fn set_size(&mut self, width: u32, height: u32);

    /// Current output buffer size (logical pixels).
    fn size(&self) -> (u32, u32);

    /// Render the current scene.
    fn render(&mut self, scene: &Scene, camera: &CameraState);

    /// Release GPU resources. Further calls are no-ops.
    fn dispose(&mut self);
}

/// Input-driven camera manipulation (orbit/pan/zoom).
pub trait Controls {
    /// Integrate pending input (and damping) into `camera`.
    ///
    /// Returns `true` when the camera moved.
    fn update(&mut self, camera: &mut CameraState) -> bool;

    /// Detach input listeners.
    fn dispose(&mut self);
}

/// On-screen frame statistics.
pub trait PerfOverlay {
    /// Record one rendered frame.
    fn update(&mut self, frame_delta: f32);
}

/// Skeletal/morph animation playback bound to one model root.
pub trait Mixer {
    /// Start looping `clip`. Replaces the current action.
    fn play(&mut self, clip: &AnimationClip);

    /// Advance animation time by `delta` seconds.
    fn advance(&mut self, delta: f32);

    /// Local time of the active action in seconds.
    fn time(&self) -> f32;

    /// Active clip, if any.
    fn active_clip(&self) -> Option<&AnimationClip>;
}

/// Factory for the rendering capability.
///
/// The associated surface type lets a backend reach its concrete drawing
/// surface (e.g. a DOM element) when attaching the canvas and the overlay.
pub trait Backend {
    /// Surface this backend draws into.
    type Surface: RenderSurface + 'static;

    /// Construct a renderer and attach its output to `surface`.
    fn create_renderer(
        &self,
        surface: &mut Self::Surface,
        settings: &RendererSettings,
    ) -> Result<Box<dyn Renderer>, PortError>;

    /// Construct controls bound to `camera` and listening on `surface`.
    fn create_controls(
        &self,
        surface: &mut Self::Surface,
        camera: &CameraState,
        settings: &ControlsSettings,
    ) -> Result<Box<dyn Controls>, PortError>;

    /// Construct a performance overlay and attach it to `surface`.
    fn create_overlay(&self, surface: &mut Self::Surface) -> Result<Box<dyn PerfOverlay>, PortError>;

    /// Construct a mixer scoped to `root`, which is already in the scene as `node`.
    fn create_mixer(&self, node: NodeId, root: &ModelRoot) -> Box<dyn Mixer>;
}
