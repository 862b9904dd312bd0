// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared viewport preferences used by Vista hosts (diagnostics, decoders, assets).

use serde::{Deserialize, Serialize};

/// Environment variable gating trace/info diagnostics (`"true"` enables).
pub const LOG_ENABLE_VAR: &str = "VISTA_LOG_ENABLE";
/// Environment variable overriding the Draco decoder path.
pub const DECODER_PATH_VAR: &str = "VISTA_DRACO_DECODER_PATH";
/// Environment variable overriding the asset base URL/path.
pub const ASSET_BASE_VAR: &str = "VISTA_ASSET_BASE";

/// Saved preferences for a viewport host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportPrefs {
    /// Emit trace/info diagnostics. Warnings and errors are always emitted.
    pub log_enable: bool,
    /// Overrides the profile's Draco decoder path.
    pub draco_decoder_path: Option<String>,
    /// Prefix joined onto relative asset paths.
    pub asset_base: Option<String>,
    /// Camera overrides.
    pub camera: CameraPrefs,
}

impl Default for ViewportPrefs {
    fn default() -> Self {
        Self {
            log_enable: true,
            draco_decoder_path: None,
            asset_base: None,
            camera: CameraPrefs::default(),
        }
    }
}

/// Optional camera overrides applied on top of a scene profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraPrefs {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: Option<f32>,
    /// World-space camera position.
    pub position: Option<[f32; 3]>,
}

impl ViewportPrefs {
    /// Apply overrides from an environment lookup (e.g. `std::env::var(..).ok()`).
    ///
    /// `VISTA_LOG_ENABLE` follows the `"true"`-only convention: any other value
    /// disables trace/info output.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(flag) = lookup(LOG_ENABLE_VAR) {
            self.log_enable = flag.trim() == "true";
        }
        if let Some(path) = lookup(DECODER_PATH_VAR).filter(|p| !p.trim().is_empty()) {
            self.draco_decoder_path = Some(path);
        }
        if let Some(base) = lookup(ASSET_BASE_VAR).filter(|b| !b.trim().is_empty()) {
            self.asset_base = Some(base);
        }
    }

    /// Resolve `path` against `asset_base`. Absolute URLs pass through untouched.
    pub fn resolve_asset(&self, path: &str) -> String {
        let is_absolute_url = path.contains("://") || path.starts_with("data:");
        match &self.asset_base {
            Some(base) if !is_absolute_url => {
                format!(
                    "{}/{}",
                    base.trim_end_matches('/'),
                    path.trim_start_matches('/')
                )
            }
            _ => path.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_enable_logging() {
        let prefs = ViewportPrefs::default();
        assert!(prefs.log_enable);
        assert!(prefs.draco_decoder_path.is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let prefs: ViewportPrefs =
            serde_json::from_str(r#"{"asset_base":"https://cdn.example"}"#).unwrap_or_default();
        assert!(prefs.log_enable);
        assert_eq!(prefs.asset_base.as_deref(), Some("https://cdn.example"));
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            (LOG_ENABLE_VAR, "false"),
            (DECODER_PATH_VAR, "draco/"),
            (ASSET_BASE_VAR, " "),
        ]
        .into_iter()
        .collect();
        let mut prefs = ViewportPrefs::default();
        prefs.apply_env(|k| env.get(k).map(|v| (*v).to_owned()));
        assert!(!prefs.log_enable);
        assert_eq!(prefs.draco_decoder_path.as_deref(), Some("draco/"));
        assert!(prefs.asset_base.is_none());
    }

    #[test]
    fn resolve_asset_joins_relative_paths() {
        let mut prefs = ViewportPrefs::default();
        assert_eq!(prefs.resolve_asset("/models/a.glb"), "/models/a.glb");
        prefs.asset_base = Some("public/".into());
        assert_eq!(prefs.resolve_asset("/models/a.glb"), "public/models/a.glb");
        assert_eq!(
            prefs.resolve_asset("https://x.test/a.glb"),
            "https://x.test/a.glb"
        );
    }
}
