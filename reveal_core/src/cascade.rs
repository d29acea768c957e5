// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cascade staggering bookkeeping.
//!
//! A cascade container's direct children receive increasing transition
//! delays (`index × step`) so they animate in one after another. The core
//! only tracks whether the delays are currently applied; the host writes and
//! clears the actual inline styles when it receives
//! [`Command::Stagger`](crate::registry::Command::Stagger) and
//! [`Command::ClearStagger`](crate::registry::Command::ClearStagger).
//!
//! Delays exist on the children if and only if the container is
//! [initialized](Cascade::is_initialized).

use crate::time::Duration;

/// Stagger state for one reveal candidate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cascade {
    container: bool,
    initialized: bool,
}

impl Cascade {
    /// Creates the stagger state for a candidate; `container` says whether it
    /// carries the cascade marker.
    #[must_use]
    pub const fn new(container: bool) -> Self {
        Self {
            container,
            initialized: false,
        }
    }

    /// Whether the candidate staggers its children at all.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        self.container
    }

    /// Whether child delays are currently applied.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Marks the delays as applied.
    ///
    /// Returns `true` only on the call that actually arms the container; the
    /// host writes child delays exactly then. Non-containers and already
    /// armed containers return `false`.
    pub fn arm(&mut self) -> bool {
        if !self.container || self.initialized {
            return false;
        }
        self.initialized = true;
        true
    }

    /// Marks the delays as cleared.
    ///
    /// Returns `true` only if delays were applied before the call.
    pub fn disarm(&mut self) -> bool {
        if !self.initialized {
            return false;
        }
        self.initialized = false;
        true
    }
}

/// Transition delay for the child at `index` of a cascade container.
#[must_use]
pub fn stagger_delay(index: usize, step: Duration) -> Duration {
    step * u32::try_from(index).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_is_idempotent() {
        let mut c = Cascade::new(true);
        assert!(c.arm(), "first arm takes effect");
        assert!(!c.arm(), "second arm is a no-op");
        assert!(c.is_initialized(), "still armed");
    }

    #[test]
    fn disarm_requires_arm() {
        let mut c = Cascade::new(true);
        assert!(!c.disarm(), "disarm on fresh container is a no-op");
        c.arm();
        assert!(c.disarm(), "disarm after arm takes effect");
        assert!(!c.disarm(), "second disarm is a no-op");
        assert!(c.arm(), "can be re-armed after a full reset");
    }

    #[test]
    fn plain_candidates_never_arm() {
        let mut c = Cascade::new(false);
        assert!(!c.arm(), "not a container");
        assert!(!c.is_initialized(), "never initialized");
        assert!(!c.disarm(), "nothing to clear");
    }

    #[test]
    fn delays_scale_with_index() {
        let step = Duration::from_millis(80);
        assert_eq!(stagger_delay(0, step), Duration::ZERO, "first child");
        assert_eq!(stagger_delay(2, step), Duration::from_millis(160), "third child");
    }
}
