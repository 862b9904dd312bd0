// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene profiles: the static content and assets each controller composes.

use std::f32::consts::FRAC_PI_2;

use vista_app_core::prefs::ViewportPrefs;
use vista_scene_port::{
    Background, Color, ControlsSettings, Environment, LightNode, Material, MeshNode, NodeId,
    Primitive, RendererSettings, Scene, SceneNode, ShadowFrustum, ToneMapping, Transform,
};

use crate::session::{CameraSetup, ViewportSetup};

/// Where and how the primary model is placed once it loads.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelPlacement {
    /// Model asset path.
    pub url: String,
    /// Root transform.
    pub transform: Transform,
    /// Whether the model's meshes cast shadows.
    pub cast_shadow: bool,
}

/// Image-based lighting for a profile.
#[derive(Clone, Debug, PartialEq)]
pub enum EnvironmentSetup {
    /// Procedural room environment, available immediately.
    Room {
        /// Prefilter blur.
        sigma: f32,
    },
    /// Panorama loaded alongside the model.
    Hdr {
        /// Environment asset path.
        url: String,
        /// Solid background used if the panorama fails to load.
        fallback: Color,
    },
}

/// Static description of one scene controller.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneProfile {
    /// Profile identifier.
    pub name: &'static str,
    /// Camera, renderer and controls construction.
    pub setup: ViewportSetup,
    /// Initial background.
    pub background: Option<Color>,
    /// Environment lighting.
    pub environment: EnvironmentSetup,
    /// Lights added at mount.
    pub lights: Vec<LightNode>,
    /// Meshes that stay for the whole session (ground plane, ...).
    pub fixtures: Vec<MeshNode>,
    /// Mesh shown until the model attaches.
    pub placeholder: Option<MeshNode>,
    /// Primary model.
    pub model: ModelPlacement,
    /// Draco decoder location, when the model needs it.
    pub draco_decoder_path: Option<String>,
}

impl SceneProfile {
    /// Names accepted by [`SceneProfile::by_name`].
    pub const NAMES: [&'static str; 2] = ["keyframes", "skinning-morphing"];

    /// Look a profile up by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "keyframes" => Some(Self::keyframes()),
            "skinning-morphing" => Some(Self::skinning_morphing()),
            _ => None,
        }
    }

    /// Draco-compressed keyframe animation in a room environment.
    pub fn keyframes() -> Self {
        Self {
            name: "keyframes",
            setup: ViewportSetup {
                camera: CameraSetup {
                    fov_y_degrees: 40.0,
                    near: 1.0,
                    far: 100.0,
                    position: [5.0, 2.0, 8.0],
                },
                renderer: RendererSettings {
                    antialias: true,
                    ..RendererSettings::default()
                },
                controls: ControlsSettings {
                    target: [0.0, 0.5, 0.0],
                    enable_pan: false,
                    enable_zoom: true,
                    enable_damping: true,
                    ..ControlsSettings::default()
                },
            },
            background: Some(Color::from_hex(0xBFE3DD)),
            environment: EnvironmentSetup::Room { sigma: 0.04 },
            lights: Vec::new(),
            fixtures: Vec::new(),
            placeholder: None,
            model: ModelPlacement {
                url: "models/gltf/LittlestTokyo.glb".to_owned(),
                transform: Transform::at([1.0, 1.0, 0.0]).with_uniform_scale(0.01),
                cast_shadow: false,
            },
            draco_decoder_path: Some("jsm/libs/draco/gltf/".to_owned()),
        }
    }

    /// Skinned, morphing character on a shadowed ground plane under an HDR sky.
    pub fn skinning_morphing() -> Self {
        Self {
            name: "skinning-morphing",
            setup: ViewportSetup {
                camera: CameraSetup {
                    fov_y_degrees: 45.0,
                    near: 1.0,
                    far: 100.0,
                    position: [2.0, 3.0, -6.0],
                },
                renderer: RendererSettings {
                    antialias: true,
                    shadows: true,
                    tone_mapping: ToneMapping::AcesFilmic,
                    exposure: 1.0,
                },
                controls: ControlsSettings {
                    target: [0.0, 1.0, 0.0],
                    enable_pan: false,
                    enable_zoom: true,
                    ..ControlsSettings::default()
                },
            },
            background: None,
            environment: EnvironmentSetup::Hdr {
                url: "/textures/equirectangular/venice_sunset_1k.hdr".to_owned(),
                fallback: Color::from_hex(0x333333),
            },
            lights: vec![
                LightNode::Hemisphere {
                    sky: Color::WHITE,
                    ground: Color::from_hex(0x8D8D8D),
                    intensity: 3.0,
                    position: [0.0, 20.0, 0.0],
                },
                LightNode::Directional {
                    color: Color::WHITE,
                    intensity: 3.0,
                    position: [-3.0, 10.0, -10.0],
                    shadow: Some(ShadowFrustum {
                        top: 4.0,
                        bottom: -4.0,
                        left: -4.0,
                        right: 4.0,
                        near: 0.1,
                        far: 40.0,
                    }),
                },
            ],
            fixtures: vec![MeshNode {
                primitive: Primitive::Plane {
                    width: 200.0,
                    height: 200.0,
                },
                material: Material::Phong {
                    color: Color::from_hex(0x999999),
                    depth_write: false,
                },
                transform: Transform::default().with_rotation([-FRAC_PI_2, 0.0, 0.0]),
                cast_shadow: false,
                receive_shadow: true,
            }],
            placeholder: Some(MeshNode {
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
            }),
            model: ModelPlacement {
                url: "/models/gltf/RobotExpressive/RobotExpressive.glb".to_owned(),
                transform: Transform::default(),
                cast_shadow: true,
            },
            draco_decoder_path: None,
        }
    }

    /// Apply host preferences: decoder path, asset base and camera overrides.
    pub fn apply_prefs(&mut self, prefs: &ViewportPrefs) {
        if let Some(path) = &prefs.draco_decoder_path {
            self.draco_decoder_path = Some(path.clone());
        }
        self.model.url = prefs.resolve_asset(&self.model.url);
        if let EnvironmentSetup::Hdr { url, .. } = &mut self.environment {
            *url = prefs.resolve_asset(url);
        }
        if let Some(fov) = prefs.camera.fov_y_degrees.filter(|f| f.is_finite() && *f > 0.0) {
            self.setup.camera.fov_y_degrees = fov;
        }
        if let Some(position) = prefs.camera.position {
            self.setup.camera.position = position;
        }
    }

    /// Add the mount-time content to `scene`. Returns the placeholder id.
    pub fn populate(&self, scene: &mut Scene) -> Option<NodeId> {
        if let Some(color) = self.background {
            scene.set_background(Background::Color(color));
        }
        if let EnvironmentSetup::Room { sigma } = self.environment {
            scene.set_environment(Environment::Room { sigma });
        }
        for light in &self.lights {
            scene.add(SceneNode::Light(*light));
        }
        for mesh in &self.fixtures {
            scene.add(SceneNode::Mesh(*mesh));
        }
        self.placeholder
            .map(|mesh| scene.add(SceneNode::Mesh(mesh)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_app_core::prefs::CameraPrefs;

    #[test]
    fn lookup_by_name() {
        for name in SceneProfile::NAMES {
            assert_eq!(SceneProfile::by_name(name).map(|p| p.name), Some(name));
        }
        assert!(SceneProfile::by_name("orbit").is_none());
    }

    #[test]
    fn keyframes_populates_background_and_room() {
        let profile = SceneProfile::keyframes();
        let mut scene = Scene::new();
        assert_eq!(profile.populate(&mut scene), None);
        assert_eq!(
            scene.background(),
            Some(Background::Color(Color::from_hex(0xBFE3DD)))
        );
        assert_eq!(scene.environment(), Some(&Environment::Room { sigma: 0.04 }));
        assert!(scene.is_empty());
    }

    #[test]
    fn skinning_populates_lights_ground_and_placeholder() {
        let profile = SceneProfile::skinning_morphing();
        let mut scene = Scene::new();
        let placeholder = profile.populate(&mut scene);
        assert_eq!(scene.len(), 4);
        assert!(placeholder.is_some_and(|id| scene.contains(id)));
        assert!(scene.background().is_none());
    }

    #[test]
    fn prefs_resolve_assets_and_override_camera() {
        let mut profile = SceneProfile::skinning_morphing();
        profile.apply_prefs(&ViewportPrefs {
            asset_base: Some("https://cdn.example/three/".into()),
            draco_decoder_path: Some("/draco/".into()),
            camera: CameraPrefs {
                fov_y_degrees: Some(60.0),
                position: None,
            },
            ..ViewportPrefs::default()
        });
        assert_eq!(
            profile.model.url,
            "https://cdn.example/three/models/gltf/RobotExpressive/RobotExpressive.glb"
        );
        assert!(matches!(
            &profile.environment,
            EnvironmentSetup::Hdr { url, .. } if url.starts_with("https://cdn.example/three/textures/")
        ));
        assert_eq!(profile.draco_decoder_path.as_deref(), Some("/draco/"));
        assert!((profile.setup.camera.fov_y_degrees - 60.0).abs() < f32::EPSILON);
        assert_eq!(profile.setup.camera.position, [2.0, 3.0, -6.0]);
    }
}
