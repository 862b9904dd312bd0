// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene container and node types.
//!
//! These are plain domain objects. The viewport core mutates a [`Scene`] when
//! assets load; backends read it once per frame.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::asset::{EnvironmentMap, ModelRoot};

/// Identifier of a node inside one [`Scene`]. Never reused within a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub u64);

/// 24-bit RGB color (`0xRRGGBB`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Color(u32);

impl Color {
    /// White.
    pub const WHITE: Self = Self(0xFFFFFF);

    /// Build a color from a `0xRRGGBB` literal. Bits above 24 are dropped.
    pub const fn from_hex(hex: u32) -> Self {
        Self(hex & 0x00FF_FFFF)
    }

    /// The `0xRRGGBB` value.
    pub const fn hex(self) -> u32 {
        self.0
    }

    /// Components as `[r, g, b]` in `0.0..=1.0` (sRGB, not linearized).
    pub fn to_rgb_f32(self) -> [f32; 3] {
        let r = (self.0 >> 16) & 0xFF;
        let g = (self.0 >> 8) & 0xFF;
        let b = self.0 & 0xFF;
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }
}

/// Position / Euler rotation (radians, XYZ) / scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Transform {
    /// Translation.
    pub position: [f32; 3],
    /// Euler rotation in radians.
    pub rotation: [f32; 3],
    /// Per-axis scale.
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl Transform {
    /// Identity transform translated to `position`.
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Replace the scale with a uniform factor.
    pub fn with_uniform_scale(mut self, factor: f32) -> Self {
        self.scale = [factor; 3];
        self
    }

    /// Replace the Euler rotation.
    pub fn with_rotation(mut self, rotation: [f32; 3]) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Built-in primitive geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Primitive {
    /// Axis-aligned box.
    Box {
        /// Extent along X.
        width: f32,
        /// Extent along Y.
        height: f32,
        /// Extent along Z.
        depth: f32,
    },
    /// Flat plane in the XY plane.
    Plane {
        /// Extent along X.
        width: f32,
        /// Extent along Y.
        height: f32,
    },
}

/// Surface material for primitive meshes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Material {
    /// Physically based standard material.
    Standard {
        /// Base color.
        color: Color,
    },
    /// Blinn-Phong material.
    Phong {
        /// Diffuse color.
        color: Color,
        /// Whether the mesh writes depth.
        depth_write: bool,
    },
}

/// A primitive mesh placed in the scene.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MeshNode {
    /// Geometry.
    pub primitive: Primitive,
    /// Material.
    pub material: Material,
    /// Placement.
    pub transform: Transform,
    /// Whether the mesh casts shadows.
    pub cast_shadow: bool,
    /// Whether the mesh receives shadows.
    pub receive_shadow: bool,
}

/// Orthographic shadow camera bounds for a directional light.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ShadowFrustum {
    /// Top plane.
    pub top: f32,
    /// Bottom plane.
    pub bottom: f32,
    /// Left plane.
    pub left: f32,
    /// Right plane.
    pub right: f32,
    /// Near plane.
    pub near: f32,
    /// Far plane.
    pub far: f32,
}

/// Light sources.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum LightNode {
    /// Sky/ground gradient light.
    Hemisphere {
        /// Sky color.
        sky: Color,
        /// Ground color.
        ground: Color,
        /// Intensity.
        intensity: f32,
        /// Position.
        position: [f32; 3],
    },
    /// Parallel light, optionally casting shadows.
    Directional {
        /// Light color.
        color: Color,
        /// Intensity.
        intensity: f32,
        /// Position (direction is towards the origin).
        position: [f32; 3],
        /// Shadow camera bounds when the light casts shadows.
        shadow: Option<ShadowFrustum>,
    },
}

/// One entry of the scene graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum SceneNode {
    /// Primitive mesh (ground, placeholder, ...).
    Mesh(MeshNode),
    /// Light source.
    Light(LightNode),
    /// Root of a loaded model.
    Model(ModelRoot),
}

/// Scene background.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Background {
    /// Solid color.
    Color(Color),
    /// The current environment map doubles as background.
    Environment,
}

/// Image-based lighting source.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Environment {
    /// Procedural room environment prefiltered with the given blur sigma.
    Room {
        /// Prefilter blur.
        sigma: f32,
    },
    /// A loaded panoramic map.
    Map(EnvironmentMap),
}

/// Renderable world: nodes plus background and environment.
///
/// Every mutation bumps [`Scene::revision`] so mirroring backends can skip
/// unchanged frames.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Scene {
    nodes: BTreeMap<NodeId, SceneNode>,
    background: Option<Background>,
    environment: Option<Environment>,
    #[serde(skip)]
    next_id: u64,
    #[serde(skip)]
    revision: u64,
}

impl Scene {
    /// Empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id.
    pub fn add(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        self.revision += 1;
        id
    }

    /// Remove a node. Returns the node if it was present.
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let removed = self.nodes.remove(&id);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    /// Whether `id` is present.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Iterate nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current background.
    pub fn background(&self) -> Option<Background> {
        self.background
    }

    /// Replace the background.
    pub fn set_background(&mut self, background: Background) {
        self.background = Some(background);
        self.revision += 1;
    }

    /// Current environment.
    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    /// Replace the environment.
    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = Some(environment);
        self.revision += 1;
    }

    /// Mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drop every node, the background and the environment. Ids are not reused.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.background = None;
        self.environment = None;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> SceneNode {
        SceneNode::Mesh(MeshNode {
            primitive: Primitive::Box {
                width: 1.0,
                height: 1.0,
                depth: 1.0,
            },
            material: Material::Standard {
                color: Color::from_hex(0x00FF00),
            },
            transform: Transform::at([0.0, 0.5, 0.0]),
            cast_shadow: false,
            receive_shadow: false,
        })
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut scene = Scene::new();
        let a = scene.add(cube());
        assert!(scene.remove(a).is_some());
        let b = scene.add(cube());
        assert_ne!(a, b);
        assert!(!scene.contains(a));
        assert!(scene.contains(b));
    }

    #[test]
    fn revision_tracks_mutations() {
        let mut scene = Scene::new();
        let r0 = scene.revision();
        let id = scene.add(cube());
        scene.set_background(Background::Color(Color::from_hex(0x333333)));
        assert_eq!(scene.revision(), r0 + 2);
        // Removing a missing node is not a mutation.
        scene.remove(NodeId(99));
        assert_eq!(scene.revision(), r0 + 2);
        scene.remove(id);
        assert_eq!(scene.revision(), r0 + 3);
    }

    #[test]
    fn color_components() {
        let c = Color::from_hex(0xFF_BFE3DD);
        assert_eq!(c.hex(), 0xBFE3DD);
        let [r, g, b] = Color::from_hex(0xFF0080).to_rgb_f32();
        assert!((r - 1.0).abs() < f32::EPSILON);
        assert!(g.abs() < f32::EPSILON);
        assert!((b - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn scene_serializes_without_counters() {
        let mut scene = Scene::new();
        scene.add(cube());
        let json = serde_json::to_value(&scene).unwrap_or_default();
        assert!(json.get("nodes").is_some());
        assert!(json.get("revision").is_none());
    }
}
