//! Replication policies.
//!
//! A [ReplicationPolicy] is a mask of interest channels. Packing archives write it into their
//! header and unpacking archives read it back, so a [crate::Serialize] implementation can include
//! audience-specific fields (for example, data only the owning player may see) and still decode
//! symmetrically.

use core::{
    fmt,
    ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not},
};

/// A 64-bit mask of interest channels.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplicationPolicy(u64);

impl ReplicationPolicy {
    /// No channels.
    pub const NONE: Self = Self(0);

    /// Everyone in proximity of the object.
    pub const PROXIMITY: Self = Self(1 << 0);

    /// Members of the owner's party.
    pub const PARTY: Self = Self(1 << 1);

    /// The owning player.
    pub const OWNER: Self = Self(1 << 2);

    /// Players in a trade with the owner.
    pub const TRADER: Self = Self(1 << 3);

    /// Players that have discovered the object from a distance.
    pub const DISCOVERY: Self = Self(1 << 4);

    /// Every channel.
    pub const ALL: Self = Self(u64::MAX);

    /// Creates a policy from raw bits.
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns true if no channel is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if every channel in `other` is also set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if `self` and `other` share at least one channel.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Adds the channels in `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Removes the channels in `other`.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl From<u64> for ReplicationPolicy {
    fn from(bits: u64) -> Self {
        Self(bits)
    }
}

impl From<ReplicationPolicy> for u64 {
    fn from(policy: ReplicationPolicy) -> Self {
        policy.0
    }
}

impl BitOr for ReplicationPolicy {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ReplicationPolicy {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ReplicationPolicy {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for ReplicationPolicy {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for ReplicationPolicy {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for ReplicationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReplicationPolicy({:#x})", self.0)
    }
}

impl fmt::Display for ReplicationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composition() {
        let policy = ReplicationPolicy::PROXIMITY | ReplicationPolicy::OWNER;
        assert_eq!(policy.bits(), 0b101);
        assert!(policy.contains(ReplicationPolicy::OWNER));
        assert!(!policy.contains(ReplicationPolicy::OWNER | ReplicationPolicy::PARTY));
        assert!(policy.intersects(ReplicationPolicy::OWNER | ReplicationPolicy::PARTY));
        assert!(!policy.intersects(ReplicationPolicy::TRADER));
    }

    #[test]
    fn test_insert_remove() {
        let mut policy = ReplicationPolicy::NONE;
        assert!(policy.is_empty());
        policy.insert(ReplicationPolicy::PARTY);
        policy |= ReplicationPolicy::DISCOVERY;
        assert_eq!(policy.bits(), 0b10010);
        policy.remove(ReplicationPolicy::PARTY);
        assert_eq!(policy, ReplicationPolicy::DISCOVERY);
        policy &= !ReplicationPolicy::DISCOVERY;
        assert!(policy.is_empty());
    }

    #[test]
    fn test_conversions() {
        let policy = ReplicationPolicy::from(0xEF);
        assert_eq!(u64::from(policy), 0xEF);
        assert_eq!(policy.to_string(), "0xef");
        assert_eq!(format!("{policy:?}"), "ReplicationPolicy(0xef)");
        assert!(ReplicationPolicy::ALL.contains(policy));
    }
}
