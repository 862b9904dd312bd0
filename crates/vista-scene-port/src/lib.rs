// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rendering capability contract for Vista viewports.
//!
//! This crate defines the boundary between the viewport core and whatever 3D
//! library actually draws pixels. The core owns the camera, the scene
//! container and the lifecycle; backends only construct renderers, controls,
//! overlays and mixers and draw what they are given.
//!
//! # Design Principles
//!
//! - **Backends are dumb**: They receive a scene and a camera and render. No
//!   lifecycle logic.
//! - **No time ownership**: Frame deltas come from the session clock, never
//!   from the backend.
//! - **Scene is data**: [`Scene`] is a plain container the core mutates when
//!   assets arrive; backends mirror it.

use thiserror::Error;

/// Error type for backend construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    /// A backend-specific error occurred (context creation, DOM access, ...).
    #[error("backend error: {0}")]
    Backend(String),
    /// An invariant was violated (e.g., a zero-sized surface where one is required).
    #[error("invariant violation: {0}")]
    Invariant(String),
}

mod asset;
mod camera;
mod port;
mod scene;
mod settings;

pub use asset::{AnimationClip, DecodedModel, EnvironmentMap, ModelRoot, TextureMapping};
pub use camera::{aspect_of, CameraState};
pub use port::{Backend, Controls, Mixer, PerfOverlay, RenderSurface, Renderer};
pub use scene::{
    Background, Color, Environment, LightNode, Material, MeshNode, NodeId, Primitive, Scene,
    SceneNode, ShadowFrustum, Transform,
};
pub use settings::{ControlsSettings, RendererSettings, ToneMapping};
