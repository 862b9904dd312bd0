// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Session liveness flag shared with in-flight asset callbacks.

use std::cell::Cell;
use std::rc::Rc;

/// Shared "session still alive" flag.
///
/// Clones observe the same flag. Once revoked it never becomes live again;
/// a remount gets a fresh `Liveness`.
#[derive(Clone, Debug)]
pub struct Liveness(Rc<Cell<bool>>);

impl Liveness {
    /// Live flag.
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    /// Whether the owning session is still alive.
    pub fn is_alive(&self) -> bool {
        self.0.get()
    }

    /// Mark the session dead. Idempotent.
    pub fn revoke(&self) {
        self.0.set(false);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_revocation() {
        let a = Liveness::new();
        let b = a.clone();
        assert!(b.is_alive());
        a.revoke();
        assert!(!b.is_alive());
        a.revoke();
        assert!(!a.is_alive());
    }
}
