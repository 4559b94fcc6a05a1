//! Structural modification counter.
//!
//! The table bumps its counter on every change to the entry count or the
//! bucket layout (insert of a new key, removal, clear, resize). Value-only
//! updates leave it alone. Traversals that do not hold a borrow of the map
//! take an `Expected` snapshot and compare it before each step.
//!
//! This is a bug detector, not a synchronization primitive: the map is
//! single-threaded and the counter is a plain integer.

use crate::error::{Error, Result};

/// Per-table counter. Embed in the table and call `bump()` on every
/// structural change.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ModCount(u64);

impl ModCount {
    pub(crate) const fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub(crate) fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    #[inline]
    pub(crate) fn get(self) -> u64 {
        self.0
    }

    /// Capture the current value for a later `Expected::check`.
    #[inline]
    pub(crate) fn snapshot(self) -> Expected {
        Expected(self.0)
    }
}

/// Snapshot of a `ModCount` taken at the start of a traversal.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Expected(u64);

impl Expected {
    /// Fails with `ConcurrentModification` if `current` moved since the
    /// snapshot.
    #[inline]
    pub(crate) fn check(self, current: ModCount) -> Result<()> {
        if self.0 == current.0 {
            Ok(())
        } else {
            Err(Error::ConcurrentModification)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_counter_passes() {
        let c = ModCount::new();
        let snap = c.snapshot();
        assert_eq!(snap.check(c), Ok(()));
    }

    #[test]
    fn bump_trips_snapshot() {
        let mut c = ModCount::new();
        let snap = c.snapshot();
        c.bump();
        assert_eq!(snap.check(c), Err(Error::ConcurrentModification));
        // Re-snapshotting accepts the new value.
        assert_eq!(c.snapshot().check(c), Ok(()));
        assert_eq!(c.get(), 1);
    }

    #[test]
    fn counter_wraps_instead_of_overflowing() {
        let mut c = ModCount(u64::MAX);
        c.bump();
        assert_eq!(c.get(), 0);
    }
}
