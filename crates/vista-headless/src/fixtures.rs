// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Minimal binary assets for exercising the decoders.

use serde_json::{json, Value};

const GLB_MAGIC: u32 = 0x4654_6C67;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;
const BIN_LEN: usize = 256;

/// Wrap a glTF JSON document and a zeroed binary chunk into a GLB container.
pub fn glb(document: &Value) -> Vec<u8> {
    let mut json = document.to_string().into_bytes();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let total = 12 + 8 + json.len() + 8 + BIN_LEN;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&2_u32.to_le_bytes());
    out.extend_from_slice(&len_u32(total).to_le_bytes());
    out.extend_from_slice(&len_u32(json.len()).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json);
    out.extend_from_slice(&len_u32(BIN_LEN).to_le_bytes());
    out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    out.resize(total, 0);
    out
}

fn len_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// glTF document with one (optionally skinned) mesh and one animation per
/// `(name, duration)` clip.
pub fn model_document(clips: &[(&str, f32)], skinned: bool) -> Value {
    let mut accessors = vec![json!({
        "bufferView": 0,
        "componentType": 5126,
        "count": 3,
        "type": "VEC3",
        "min": [0.0, 0.0, 0.0],
        "max": [1.0, 1.0, 1.0]
    })];
    let mut animations = Vec::new();
    for (name, duration) in clips {
        let input = accessors.len();
        accessors.push(json!({
            "bufferView": 0,
            "componentType": 5126,
            "count": 2,
            "type": "SCALAR",
            "min": [0.0],
            "max": [duration]
        }));
        accessors.push(json!({
            "bufferView": 0,
            "componentType": 5126,
            "count": 2,
            "type": "VEC3"
        }));
        animations.push(json!({
            "name": name,
            "channels": [{"sampler": 0, "target": {"node": 1, "path": "translation"}}],
            "samplers": [{"input": input, "output": input + 1}]
        }));
    }

    let mut body = json!({"name": "Body", "mesh": 0});
    if skinned {
        body["skin"] = json!(0);
    }
    let mut document = json!({
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"name": "Scene", "nodes": [0]}],
        "nodes": [
            {"name": "Armature", "children": [1]},
            body
        ],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
        "buffers": [{"byteLength": BIN_LEN}],
        "bufferViews": [{"buffer": 0, "byteLength": BIN_LEN}],
        "accessors": accessors
    });
    if skinned {
        document["skins"] = json!([{"joints": [0]}]);
    }
    if !animations.is_empty() {
        document["animations"] = Value::Array(animations);
    }
    document
}

/// Skinned GLB with the given clips.
pub fn animated_model(clips: &[(&str, f32)]) -> Vec<u8> {
    glb(&model_document(clips, true))
}

/// GLB without animations.
pub fn static_model() -> Vec<u8> {
    glb(&model_document(&[], false))
}

/// GLB declaring Draco mesh compression.
pub fn draco_model() -> Vec<u8> {
    let mut document = model_document(&[("Take", 1.0)], false);
    document["extensionsUsed"] = json!(["KHR_draco_mesh_compression"]);
    document["extensionsRequired"] = json!(["KHR_draco_mesh_compression"]);
    glb(&document)
}

/// A 2×1 Radiance HDR image.
pub fn tiny_hdr() -> Vec<u8> {
    let mut bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 1 +X 2\n".to_vec();
    bytes.extend_from_slice(&[128, 128, 128, 129, 64, 64, 64, 129]);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glb_header_and_chunks_are_aligned() {
        let bytes = static_model();
        assert_eq!(&bytes[0..4], b"glTF");
        let total = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        assert_eq!(total, bytes.len());
        let json_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) as usize;
        assert_eq!(json_len % 4, 0);
        assert_eq!(&bytes[16..20], b"JSON");
        assert_eq!(&bytes[20 + json_len + 4..20 + json_len + 8], b"BIN\0");
    }

    #[test]
    fn clips_become_animations() {
        let doc = model_document(&[("Dance", 2.0), ("Wave", 1.0)], true);
        assert_eq!(doc["animations"].as_array().map(Vec::len), Some(2));
        assert_eq!(doc["accessors"].as_array().map(Vec::len), Some(5));
        assert_eq!(doc["nodes"][1]["skin"], json!(0));
    }
}
