// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decoded asset payloads handed from the loader to the scene.

use std::sync::Arc;

use serde::Serialize;

use crate::scene::Transform;

/// Root of a decoded scene-graph fragment (one loaded model).
///
/// The core only needs the structural summary; the original bytes travel
/// along so a backend can build GPU resources from them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelRoot {
    /// Name of the default scene, when the asset provides one.
    pub name: Option<String>,
    /// Names of every node reachable from the default scene (unnamed nodes skipped).
    pub node_names: Vec<String>,
    /// Number of mesh-bearing nodes.
    pub mesh_count: usize,
    /// Whether any node is skinned.
    pub skinned: bool,
    /// Whether any mesh primitive carries morph targets.
    pub morph_targets: bool,
    /// Whether meshes are Draco-compressed.
    pub draco_compressed: bool,
    /// Placement in the scene.
    pub transform: Transform,
    /// Whether the model's meshes cast shadows.
    pub cast_shadow: bool,
    /// Encoded asset bytes.
    #[serde(skip)]
    pub source: Arc<[u8]>,
}

/// A named animation clip.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnimationClip {
    /// Clip name (may be empty when the asset leaves it unnamed).
    pub name: String,
    /// Clip length in seconds.
    pub duration_secs: f32,
}

/// Result of decoding a model asset: root plus animation clips (possibly empty).
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedModel {
    /// Scene-graph root.
    pub root: ModelRoot,
    /// Animation clips in asset order.
    pub clips: Vec<AnimationClip>,
}

/// How a texture maps onto the environment sphere.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TextureMapping {
    /// Equirectangular panorama used for reflections.
    EquirectangularReflection,
}

/// A decoded high-dynamic-range panorama.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnvironmentMap {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Texture mapping.
    pub mapping: TextureMapping,
    /// Encoded image bytes.
    #[serde(skip)]
    pub source: Arc<[u8]>,
}
