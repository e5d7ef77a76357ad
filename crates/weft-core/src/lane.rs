// SPDX-License-Identifier: Apache-2.0
//! Priority lanes.
//!
//! A lane is a bit position in a `u32` bitset; a lower set bit means a
//! higher priority. `Lanes::NONE` (zero) means "no work". Lanes batch
//! pending updates per root, select the next render, and decide during
//! queue processing whether an individual update participates in the
//! current render.
//!
//! Each host scheduler priority level maps bijectively onto one lane; this
//! mapping is the single seam between update urgency and host time-slicing
//! priority.

use crate::host::SchedulerPriority;

/// A set of priority lanes (possibly empty, possibly a single lane).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Lanes(pub u32);

impl Lanes {
    /// No pending work.
    pub const NONE: Self = Self(0);
    /// Synchronous lane: resolves within the current microtask turn.
    pub const SYNC: Self = Self(0b0001);
    /// Continuous-input lane (user-blocking host priority).
    pub const INPUT_CONTINUOUS: Self = Self(0b0010);
    /// Default lane for ordinary updates.
    pub const DEFAULT: Self = Self(0b0100);
    /// Idle lane: runs only when the host has nothing better to do.
    pub const IDLE: Self = Self(0b1000);

    /// Returns true when no lane is set.
    #[must_use]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Accumulates pending work: the bitwise union of both sets.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Isolates the highest-priority (lowest set bit) lane in the set.
    #[must_use]
    pub fn highest_priority(self) -> Self {
        Self(self.0 & self.0.wrapping_neg())
    }

    /// Subset test: true when every lane in `self` is present in `other`.
    ///
    /// Used to decide whether an update record must be included in a render
    /// executing at `other`.
    #[must_use]
    pub fn is_subset_of(self, other: Self) -> bool {
        self.0 & other.0 == self.0
    }

    /// Removes `other` from the set.
    #[must_use]
    pub fn remove(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Returns true when the sets intersect.
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

/// Returns the lane for a new update requested at `priority`.
#[must_use]
pub fn lane_from_priority(priority: SchedulerPriority) -> Lanes {
    match priority {
        SchedulerPriority::Immediate => Lanes::SYNC,
        SchedulerPriority::UserBlocking => Lanes::INPUT_CONTINUOUS,
        SchedulerPriority::Normal => Lanes::DEFAULT,
        SchedulerPriority::Idle => Lanes::IDLE,
    }
}

/// Returns the host scheduler priority for rendering `lanes`.
///
/// Only the highest-priority lane in the set is considered.
#[must_use]
pub fn priority_of_lanes(lanes: Lanes) -> SchedulerPriority {
    match lanes.highest_priority() {
        Lanes::SYNC => SchedulerPriority::Immediate,
        Lanes::INPUT_CONTINUOUS => SchedulerPriority::UserBlocking,
        Lanes::DEFAULT => SchedulerPriority::Normal,
        _ => SchedulerPriority::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_priority_isolates_lowest_bit() {
        let pending = Lanes::DEFAULT.merge(Lanes::SYNC).merge(Lanes::IDLE);
        assert_eq!(pending.highest_priority(), Lanes::SYNC);

        let pending = Lanes::DEFAULT.merge(Lanes::IDLE);
        assert_eq!(pending.highest_priority(), Lanes::DEFAULT);

        assert_eq!(Lanes::NONE.highest_priority(), Lanes::NONE);
    }

    #[test]
    fn subset_test_drives_inclusion() {
        assert!(Lanes::SYNC.is_subset_of(Lanes::SYNC));
        assert!(!Lanes::DEFAULT.is_subset_of(Lanes::SYNC));
        assert!(Lanes::NONE.is_subset_of(Lanes::SYNC));
    }

    #[test]
    fn merge_and_remove_round_trip() {
        let merged = Lanes::SYNC.merge(Lanes::DEFAULT);
        assert!(merged.intersects(Lanes::SYNC));
        assert_eq!(merged.remove(Lanes::SYNC), Lanes::DEFAULT);
    }

    #[test]
    fn priority_mapping_is_bijective() {
        for priority in [
            SchedulerPriority::Immediate,
            SchedulerPriority::UserBlocking,
            SchedulerPriority::Normal,
            SchedulerPriority::Idle,
        ] {
            assert_eq!(priority_of_lanes(lane_from_priority(priority)), priority);
        }
    }
}
