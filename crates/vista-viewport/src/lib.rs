// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewport lifecycle core.
//!
//! A [`SceneController`] mounts a [`SceneProfile`] into a [`ViewportHost`]:
//! the host builds a [`Session`] (renderer, camera, controls, overlay, scene,
//! clock) on a drawing surface, a [`RenderLoop`] drives frames off a
//! [`FrameScheduler`], and an [`AssetLoader`] fetches the model and
//! environment without blocking frames. Teardown revokes a [`Liveness`] flag
//! so late asset completions never touch a released session.
//!
//! Everything runs on one thread. Platform capabilities (frame pacing,
//! resize notifications, time, asset bytes, task spawning, diagnostics) are
//! injected through [`Platform`], so the same core runs in the browser and
//! under deterministic tests.

pub mod clock;
pub mod controller;
pub mod diagnostics;
pub mod error;
pub mod host;
pub mod liveness;
pub mod loader;
pub mod mixer;
pub mod profile;
pub mod render_loop;
pub mod session;

pub use clock::{Clock, MonotonicTime, TimeSource};
pub use controller::SceneController;
pub use diagnostics::{DiagnosticsSink, Field, FieldList, Severity, TracingSink};
pub use error::ViewportError;
pub use host::{Platform, ResizeSource, ResizeSubscription, SessionHandle, ViewportHost};
pub use liveness::Liveness;
pub use loader::{
    decode_environment, decode_model, AssetLoader, AssetSource, DecoderConfig, LoadError,
    LoadHandlers, Progress, Spawner,
};
pub use mixer::AnimationSlot;
pub use profile::{EnvironmentSetup, ModelPlacement, SceneProfile};
pub use render_loop::{FrameCallback, FramePass, FrameScheduler, LoopError, LoopState, RenderLoop};
pub use session::{CameraSetup, Session, ViewportSetup};
