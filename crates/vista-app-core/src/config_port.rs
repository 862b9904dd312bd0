// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config port shared across Vista hosts (browser bridge, CLI).

use crate::config::{ConfigService, ConfigStore};
use crate::prefs::ViewportPrefs;

/// Key under which viewport prefs are stored.
pub const PREFS_KEY: &str = "viewport_prefs";

/// Config-facing port for loading/saving viewport preferences.
pub trait ConfigPort {
    /// Load viewport preferences (returns None if missing or unreadable).
    fn load_prefs(&self) -> Option<ViewportPrefs>;
    /// Persist viewport preferences (best-effort; errors are logged).
    fn save_prefs(&self, prefs: &ViewportPrefs);
}

impl<S: ConfigStore> ConfigPort for ConfigService<S> {
    fn load_prefs(&self) -> Option<ViewportPrefs> {
        match self.load(PREFS_KEY) {
            Ok(prefs) => prefs,
            Err(err) => {
                tracing::warn!(%err, "viewport prefs unreadable; using defaults");
                None
            }
        }
    }

    fn save_prefs(&self, prefs: &ViewportPrefs) {
        if let Err(err) = self.save(PREFS_KEY, prefs) {
            tracing::warn!(%err, "failed to persist viewport prefs");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigStore;

    #[test]
    fn prefs_round_trip_through_service() {
        let svc = ConfigService::new(MemoryConfigStore::new());
        assert!(svc.load_prefs().is_none());
        let prefs = ViewportPrefs {
            log_enable: false,
            ..ViewportPrefs::default()
        };
        svc.save_prefs(&prefs);
        assert_eq!(svc.load_prefs(), Some(prefs));
    }

    #[test]
    fn unreadable_prefs_are_none() {
        let svc = ConfigService::new(MemoryConfigStore::with_blob(PREFS_KEY, b"[1,2".to_vec()));
        assert!(svc.load_prefs().is_none());
    }
}
