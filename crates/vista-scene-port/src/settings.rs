// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Construction settings passed to backends.

use serde::{Deserialize, Serialize};

/// Tone mapping operator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneMapping {
    /// Linear output.
    #[default]
    None,
    /// ACES filmic curve.
    AcesFilmic,
}

/// Renderer construction settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RendererSettings {
    /// Multisample antialiasing.
    pub antialias: bool,
    /// Shadow maps enabled.
    pub shadows: bool,
    /// Tone mapping operator.
    pub tone_mapping: ToneMapping,
    /// Tone mapping exposure.
    pub exposure: f32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            antialias: true,
            shadows: false,
            tone_mapping: ToneMapping::None,
            exposure: 1.0,
        }
    }
}

/// Orbit controls settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlsSettings {
    /// Orbit pivot.
    pub target: [f32; 3],
    /// Allow panning.
    pub enable_pan: bool,
    /// Allow zooming.
    pub enable_zoom: bool,
    /// Integrate inertia every update.
    pub enable_damping: bool,
    /// Fraction of velocity removed per update when damping is on.
    pub damping_factor: f32,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            target: [0.0; 3],
            enable_pan: true,
            enable_zoom: true,
            enable_damping: false,
            damping_factor: 0.05,
        }
    }
}
