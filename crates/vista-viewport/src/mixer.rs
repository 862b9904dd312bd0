// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Animation slot: zero or one mixer bound to a loaded model.

use vista_scene_port::{AnimationClip, Backend, Mixer, ModelRoot, NodeId};

/// Holds the session's mixer once a model with clips has loaded.
///
/// The slot is empty until then; advancing an empty slot is a no-op.
#[derive(Default)]
pub struct AnimationSlot {
    mixer: Option<Box<dyn Mixer>>,
}

impl AnimationSlot {
    /// Slot without a mixer.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bind a mixer to the scene node `node` holding `root` and loop the first clip.
    ///
    /// No mixer is constructed when `clips` is empty.
    pub fn bind<B: Backend>(
        backend: &B,
        node: NodeId,
        root: &ModelRoot,
        clips: &[AnimationClip],
    ) -> Self {
        let Some(first) = clips.first() else {
            return Self::empty();
        };
        let mut mixer = backend.create_mixer(node, root);
        mixer.play(first);
        Self { mixer: Some(mixer) }
    }

    /// Advance the mixer by `delta` seconds. Returns whether a mixer ran.
    pub fn advance(&mut self, delta: f32) -> bool {
        match self.mixer.as_mut() {
            Some(mixer) => {
                mixer.advance(delta);
                true
            }
            None => false,
        }
    }

    /// Whether a mixer exists.
    pub fn is_bound(&self) -> bool {
        self.mixer.is_some()
    }

    /// The bound mixer.
    pub fn mixer(&self) -> Option<&dyn Mixer> {
        self.mixer.as_deref()
    }
}

impl std::fmt::Debug for AnimationSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationSlot")
            .field("bound", &self.is_bound())
            .field(
                "clip",
                &self
                    .mixer
                    .as_ref()
                    .and_then(|m| m.active_clip())
                    .map(|c| c.name.as_str()),
            )
            .finish()
    }
}
