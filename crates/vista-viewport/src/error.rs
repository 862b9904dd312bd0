// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewport host errors.

use thiserror::Error;
use vista_scene_port::PortError;

use crate::render_loop::LoopError;

/// Failures surfaced by [`crate::ViewportHost`] and [`crate::SceneController`].
///
/// None of these are fatal to the hosting page; callers log and carry on.
#[derive(Debug, Error)]
pub enum ViewportError {
    /// `initialize` was called before the container element existed.
    #[error("container element not found")]
    MissingSurface,
    /// `initialize` was called on a host that already owns a session.
    #[error("viewport already initialized")]
    AlreadyInitialized,
    /// The host was torn down; mount a fresh host instead.
    #[error("viewport torn down")]
    TornDown,
    /// No session exists yet.
    #[error("viewport not initialized")]
    NotInitialized,
    /// The backend failed to construct a resource.
    #[error(transparent)]
    Backend(#[from] PortError),
    /// The render loop refused to start.
    #[error(transparent)]
    Loop(#[from] LoopError),
}
