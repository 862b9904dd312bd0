// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! glTF / GLB model decoding.

use std::sync::Arc;

use gltf::{Document, Gltf, Node};
use vista_scene_port::{AnimationClip, DecodedModel, ModelRoot, Transform};

use super::{DecoderConfig, LoadError};

/// glTF extension name for Draco-compressed meshes.
pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Decode a glTF or GLB payload into a model root plus its animation clips.
///
/// The structure is summarised from the default scene (or the first scene
/// when none is marked default). Draco-compressed assets fail with
/// [`LoadError::MissingDecoder`] unless a decoder path is configured.
pub fn decode_model(url: &str, bytes: &[u8], decoders: &DecoderConfig) -> Result<DecodedModel, LoadError> {
    let gltf = match Gltf::from_slice(bytes) {
        Ok(gltf) => gltf,
        Err(err) => {
            let decode = || LoadError::Decode {
                url: url.to_owned(),
                reason: err.to_string(),
            };
            // Validation rejects required extensions this crate cannot decode itself.
            let unvalidated = Gltf::from_slice_without_validation(bytes).map_err(|_| decode())?;
            if !uses_draco(&unvalidated) {
                return Err(decode());
            }
            unvalidated
        }
    };
    let doc: &Document = &gltf;

    let draco_compressed = uses_draco(doc);
    if draco_compressed && decoders.draco_decoder_path.is_none() {
        return Err(LoadError::MissingDecoder {
            url: url.to_owned(),
            codec: "draco",
        });
    }

    let scene = doc.default_scene().or_else(|| doc.scenes().next());
    let mut summary = Summary::default();
    if let Some(scene) = &scene {
        for node in scene.nodes() {
            summary.visit(&node);
        }
    }

    let clips = doc
        .animations()
        .map(|anim| AnimationClip {
            name: anim.name().unwrap_or_default().to_owned(),
            duration_secs: clip_duration(&anim),
        })
        .collect();

    Ok(DecodedModel {
        root: ModelRoot {
            name: scene.and_then(|s| s.name().map(str::to_owned)),
            node_names: summary.names,
            mesh_count: summary.meshes,
            skinned: summary.skinned,
            morph_targets: summary.morph_targets,
            draco_compressed,
            transform: Transform::default(),
            cast_shadow: false,
            source: Arc::from(bytes),
        },
        clips,
    })
}

fn uses_draco(doc: &Document) -> bool {
    doc.extensions_used().any(|e| e == DRACO_EXTENSION)
        || doc.extensions_required().any(|e| e == DRACO_EXTENSION)
}

#[derive(Default)]
struct Summary {
    names: Vec<String>,
    meshes: usize,
    skinned: bool,
    morph_targets: bool,
}

impl Summary {
    fn visit(&mut self, node: &Node<'_>) {
        if let Some(name) = node.name() {
            self.names.push(name.to_owned());
        }
        if node.skin().is_some() {
            self.skinned = true;
        }
        if let Some(mesh) = node.mesh() {
            self.meshes += 1;
            if mesh
                .primitives()
                .any(|prim| prim.morph_targets().next().is_some())
            {
                self.morph_targets = true;
            }
        }
        for child in node.children() {
            self.visit(&child);
        }
    }
}

/// Longest keyframe time across a clip's channels, from the input accessors' `max`.
fn clip_duration(anim: &gltf::Animation<'_>) -> f32 {
    anim.channels()
        .filter_map(|channel| {
            let max = channel.sampler().input().max()?;
            max.as_array()?.first()?.as_f64()
        })
        .fold(0.0_f64, f64::max) as f32
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    const ANIMATED: &str = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"name": "Stage", "nodes": [0]}],
        "nodes": [
            {"name": "Body", "mesh": 0, "children": [1]},
            {"name": "Head"}
        ],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "targets": [{"POSITION": 0}]}]}],
        "buffers": [{"byteLength": 64}],
        "bufferViews": [{"buffer": 0, "byteLength": 64}],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 1, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 1.0]},
            {"bufferView": 0, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0.0], "max": [2.5]},
            {"bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC3"}
        ],
        "animations": [{
            "name": "Dance",
            "channels": [{"sampler": 0, "target": {"node": 0, "path": "translation"}}],
            "samplers": [{"input": 1, "output": 2}]
        }]
    }"#;

    const DRACO: &str = r#"{
        "asset": {"version": "2.0"},
        "extensionsUsed": ["KHR_draco_mesh_compression"],
        "extensionsRequired": ["KHR_draco_mesh_compression"],
        "scenes": [{"nodes": []}]
    }"#;

    #[test]
    fn summarises_default_scene_and_clips() {
        let model = decode_model("a.gltf", ANIMATED.as_bytes(), &DecoderConfig::default())
            .expect("animated fixture decodes");
        assert_eq!(model.root.name.as_deref(), Some("Stage"));
        assert_eq!(model.root.node_names, vec!["Body", "Head"]);
        assert_eq!(model.root.mesh_count, 1);
        assert!(model.root.morph_targets);
        assert!(!model.root.skinned);
        assert_eq!(model.clips.len(), 1);
        assert_eq!(model.clips[0].name, "Dance");
        assert!((model.clips[0].duration_secs - 2.5).abs() < 1e-6);
        assert_eq!(&*model.root.source, ANIMATED.as_bytes());
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_model("x.glb", b"not a model", &DecoderConfig::default());
        assert!(matches!(err, Err(LoadError::Decode { ref url, .. }) if url == "x.glb"));
    }

    #[test]
    fn draco_requires_configured_decoder() {
        let err = decode_model("tokyo.glb", DRACO.as_bytes(), &DecoderConfig::default());
        assert_eq!(
            err,
            Err(LoadError::MissingDecoder {
                url: "tokyo.glb".into(),
                codec: "draco",
            })
        );
        let config = DecoderConfig {
            draco_decoder_path: Some("libs/draco/gltf/".into()),
        };
        let model = decode_model("tokyo.glb", DRACO.as_bytes(), &config);
        assert!(model.is_ok_and(|m| m.root.draco_compressed && m.clips.is_empty()));
    }
}
