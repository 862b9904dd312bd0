// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless backend: records what a GPU backend would have done.
//!
//! Every resource writes to a shared [`Journal`] so tests can assert on call
//! order (the per-frame pipeline) and on disposal.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vista_scene_port::{
    AnimationClip, Backend, Background, CameraState, Controls, ControlsSettings, Mixer, ModelRoot,
    NodeId, PerfOverlay, PortError, RenderSurface, Renderer, RendererSettings, Scene,
};

/// One recorded backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Renderer constructed.
    RendererCreated(RendererSettings),
    /// Controls constructed.
    ControlsCreated(ControlsSettings),
    /// Overlay constructed.
    OverlayCreated,
    /// Mixer constructed for the model root at a scene node.
    MixerCreated(NodeId),
    /// Mixer started a clip.
    MixerPlay(String),
    /// Mixer advanced by a delta.
    MixerAdvance(f32),
    /// Controls integrated input.
    ControlsUpdate,
    /// Overlay recorded a frame.
    OverlayUpdate(f32),
    /// A frame was rendered.
    Render(RenderProbe),
    /// Renderer disposed.
    RendererDisposed,
    /// Controls disposed.
    ControlsDisposed,
}

/// What the renderer saw when drawing a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderProbe {
    /// Output buffer size.
    pub size: (u32, u32),
    /// Device pixel ratio applied to the buffer.
    pub pixel_ratio: f32,
    /// Camera aspect.
    pub aspect: f32,
    /// Node count.
    pub nodes: usize,
    /// Background.
    pub background: Option<Background>,
    /// Scene revision.
    pub revision: u64,
}

/// Shared, cloneable event log.
#[derive(Clone, Debug, Default)]
pub struct Journal(Rc<RefCell<Vec<Event>>>);

impl Journal {
    /// Empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    /// Snapshot of every event.
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    /// Number of events matching `pred`.
    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| pred(e)).count()
    }

    /// Every render probe, oldest first.
    pub fn renders(&self) -> Vec<RenderProbe> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Render(probe) => Some(*probe),
                _ => None,
            })
            .collect()
    }

    /// Most recent render probe.
    pub fn last_render(&self) -> Option<RenderProbe> {
        self.renders().last().copied()
    }

    /// Drop all events.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[derive(Debug)]
struct SurfaceState {
    content_box: (u32, u32),
    pixel_ratio: f32,
    children: Vec<&'static str>,
    clears: u32,
}

/// In-memory drawing surface standing in for a DOM container.
///
/// Clones share state, so a test can keep a handle after handing the surface
/// to a host and then resize it.
#[derive(Clone, Debug)]
pub struct HeadlessSurface(Rc<RefCell<SurfaceState>>);

impl HeadlessSurface {
    /// Surface with a `width × height` content box and one stale child.
    pub fn new(width: u32, height: u32) -> Self {
        Self(Rc::new(RefCell::new(SurfaceState {
            content_box: (width, height),
            pixel_ratio: 1.0,
            children: vec!["stale"],
            clears: 0,
        })))
    }

    /// Builder-style device pixel ratio.
    pub fn with_pixel_ratio(self, ratio: f32) -> Self {
        self.0.borrow_mut().pixel_ratio = ratio;
        self
    }

    /// Change the content box (the resize notification is separate).
    pub fn set_content_box(&self, width: u32, height: u32) {
        self.0.borrow_mut().content_box = (width, height);
    }

    /// Attached children, in attach order.
    pub fn children(&self) -> Vec<&'static str> {
        self.0.borrow().children.clone()
    }

    /// Number of `clear` calls.
    pub fn clears(&self) -> u32 {
        self.0.borrow().clears
    }

    fn attach(&self, child: &'static str) {
        self.0.borrow_mut().children.push(child);
    }
}

impl RenderSurface for HeadlessSurface {
    fn content_box(&self) -> (u32, u32) {
        self.0.borrow().content_box
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.0.borrow().pixel_ratio
    }

    fn clear(&mut self) {
        let mut state = self.0.borrow_mut();
        state.children.clear();
        state.clears += 1;
    }
}

/// Construction step a [`HeadlessBackend`] can be told to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailAt {
    /// `create_renderer`.
    Renderer,
    /// `create_controls`.
    Controls,
    /// `create_overlay`.
    Overlay,
}

/// Backend whose resources only record calls.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    journal: Journal,
    fail_at: Cell<Option<FailAt>>,
}

impl HeadlessBackend {
    /// Backend writing to a fresh journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend writing to `journal`.
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            fail_at: Cell::new(None),
        }
    }

    /// Make one construction step fail with [`PortError::Backend`].
    pub fn fail_at(&self, step: Option<FailAt>) {
        self.fail_at.set(step);
    }

    /// The shared journal.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    fn check(&self, step: FailAt) -> Result<(), PortError> {
        if self.fail_at.get() == Some(step) {
            return Err(PortError::Backend(format!("{step:?} unavailable")));
        }
        Ok(())
    }
}

impl Backend for HeadlessBackend {
    type Surface = HeadlessSurface;

    fn create_renderer(
        &self,
        surface: &mut HeadlessSurface,
        settings: &RendererSettings,
    ) -> Result<Box<dyn Renderer>, PortError> {
        self.check(FailAt::Renderer)?;
        surface.attach("canvas");
        self.journal.push(Event::RendererCreated(*settings));
        Ok(Box::new(HeadlessRenderer {
            journal: self.journal.clone(),
            size: (0, 0),
            pixel_ratio: 1.0,
            disposed: false,
        }))
    }

    fn create_controls(
        &self,
        _surface: &mut HeadlessSurface,
        _camera: &CameraState,
        settings: &ControlsSettings,
    ) -> Result<Box<dyn Controls>, PortError> {
        self.check(FailAt::Controls)?;
        self.journal.push(Event::ControlsCreated(*settings));
        Ok(Box::new(HeadlessControls {
            journal: self.journal.clone(),
            settings: *settings,
            disposed: false,
        }))
    }

    fn create_overlay(&self, surface: &mut HeadlessSurface) -> Result<Box<dyn PerfOverlay>, PortError> {
        self.check(FailAt::Overlay)?;
        surface.attach("stats");
        self.journal.push(Event::OverlayCreated);
        Ok(Box::new(HeadlessOverlay {
            journal: self.journal.clone(),
        }))
    }

    fn create_mixer(&self, node: NodeId, _root: &ModelRoot) -> Box<dyn Mixer> {
        self.journal.push(Event::MixerCreated(node));
        Box::new(HeadlessMixer {
            journal: self.journal.clone(),
            clip: None,
            time: 0.0,
        })
    }
}

struct HeadlessRenderer {
    journal: Journal,
    size: (u32, u32),
    pixel_ratio: f32,
    disposed: bool,
}

impl Renderer for HeadlessRenderer {
    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &CameraState) {
        if self.disposed {
            return;
        }
        self.journal.push(Event::Render(RenderProbe {
            size: self.size,
            pixel_ratio: self.pixel_ratio,
            aspect: camera.aspect(),
            nodes: scene.len(),
            background: scene.background(),
            revision: scene.revision(),
        }));
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.journal.push(Event::RendererDisposed);
        }
    }
}

/// Orbit controls without input: moves the camera target to the pivot.
struct HeadlessControls {
    journal: Journal,
    settings: ControlsSettings,
    disposed: bool,
}

impl Controls for HeadlessControls {
    fn update(&mut self, camera: &mut CameraState) -> bool {
        if self.disposed {
            return false;
        }
        self.journal.push(Event::ControlsUpdate);
        let moved = camera.target != self.settings.target;
        camera.target = self.settings.target;
        moved
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.journal.push(Event::ControlsDisposed);
        }
    }
}

struct HeadlessOverlay {
    journal: Journal,
}

impl PerfOverlay for HeadlessOverlay {
    fn update(&mut self, frame_delta: f32) {
        self.journal.push(Event::OverlayUpdate(frame_delta));
    }
}

/// Loops the active clip over its duration.
struct HeadlessMixer {
    journal: Journal,
    clip: Option<AnimationClip>,
    time: f32,
}

impl Mixer for HeadlessMixer {
    fn play(&mut self, clip: &AnimationClip) {
        self.journal.push(Event::MixerPlay(clip.name.clone()));
        self.clip = Some(clip.clone());
        self.time = 0.0;
    }

    fn advance(&mut self, delta: f32) {
        self.journal.push(Event::MixerAdvance(delta));
        let Some(clip) = &self.clip else {
            return;
        };
        self.time += delta;
        if clip.duration_secs > 0.0 {
            self.time %= clip.duration_secs;
        }
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn active_clip(&self) -> Option<&AnimationClip> {
        self.clip.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_clear_drops_children() {
        let mut surface = HeadlessSurface::new(10, 10);
        let handle = surface.clone();
        assert_eq!(handle.children(), vec!["stale"]);
        surface.clear();
        assert!(handle.children().is_empty());
        assert_eq!(handle.clears(), 1);
    }

    #[test]
    fn mixer_loops_over_clip_duration() {
        let backend = HeadlessBackend::new();
        let mut mixer = backend.create_mixer(NodeId(0), &ModelRoot {
            name: None,
            node_names: Vec::new(),
            mesh_count: 0,
            skinned: false,
            morph_targets: false,
            draco_compressed: false,
            transform: vista_scene_port::Transform::default(),
            cast_shadow: false,
            source: std::sync::Arc::from(Vec::new()),
        });
        mixer.play(&AnimationClip {
            name: "Idle".into(),
            duration_secs: 1.0,
        });
        mixer.advance(0.75);
        mixer.advance(0.5);
        assert!((mixer.time() - 0.25).abs() < 1e-6);
        assert_eq!(
            backend.journal().count(|e| matches!(e, Event::MixerAdvance(_))),
            2
        );
    }

    #[test]
    fn failing_step_reports_backend_error() {
        let backend = HeadlessBackend::new();
        backend.fail_at(Some(FailAt::Overlay));
        let mut surface = HeadlessSurface::new(1, 1);
        assert!(matches!(
            backend.create_overlay(&mut surface),
            Err(PortError::Backend(_))
        ));
        assert!(backend.create_renderer(&mut surface, &RendererSettings::default()).is_ok());
    }
}
