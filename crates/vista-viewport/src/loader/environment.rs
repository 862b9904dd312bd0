// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Radiance HDR panorama decoding.

use std::io::Cursor;
use std::sync::Arc;

use image::codecs::hdr::HdrDecoder;
use image::ImageDecoder;
use vista_scene_port::{EnvironmentMap, TextureMapping};

use super::LoadError;

/// Decode a Radiance `.hdr` payload into an equirectangular environment map.
///
/// Only the header is parsed; the backend uploads the raw bytes and decodes
/// the pixels itself.
pub fn decode_environment(url: &str, bytes: &[u8]) -> Result<EnvironmentMap, LoadError> {
    let decoder = HdrDecoder::new(Cursor::new(bytes)).map_err(|err| LoadError::Decode {
        url: url.to_owned(),
        reason: err.to_string(),
    })?;
    let (width, height) = decoder.dimensions();
    Ok(EnvironmentMap {
        width,
        height,
        mapping: TextureMapping::EquirectangularReflection,
        source: Arc::from(bytes),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tiny_hdr() -> Vec<u8> {
        let mut bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 1 +X 2\n".to_vec();
        bytes.extend_from_slice(&[128, 128, 128, 129, 64, 64, 64, 129]);
        bytes
    }

    #[test]
    fn decodes_dimensions_and_mapping() {
        let map = decode_environment("sunset.hdr", &tiny_hdr()).expect("tiny hdr decodes");
        assert_eq!((map.width, map.height), (2, 1));
        assert_eq!(map.mapping, TextureMapping::EquirectangularReflection);
    }

    #[test]
    fn reads_dimensions_from_header_without_pixels() {
        let header = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 2048 +X 4096\n";
        let map = decode_environment("studio.hdr", header).expect("header is enough");
        assert_eq!((map.width, map.height), (4096, 2048));
        assert_eq!(map.source.len(), header.len());
    }

    #[test]
    fn non_hdr_bytes_fail() {
        let err = decode_environment("sunset.hdr", b"\x89PNG");
        assert!(matches!(err, Err(LoadError::Decode { .. })));
    }
}
