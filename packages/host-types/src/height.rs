//! Revision-aware block heights.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A block height scoped to a chain revision.
///
/// Heights order lexicographically on `(revision_number, revision_height)`:
/// a later revision is always newer than any height of an earlier revision.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Height {
    /// The revision (hard-fork epoch) the height belongs to.
    pub revision_number: u64,
    /// The block height within the revision.
    pub revision_height: u64,
}

impl Height {
    /// Create a new height.
    #[must_use]
    pub const fn new(revision_number: u64, revision_height: u64) -> Self {
        Self {
            revision_number,
            revision_height,
        }
    }

    /// Whether both components are zero. A zero height is used as the
    /// "no timeout height" sentinel on packets.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.revision_number == 0 && self.revision_height == 0
    }

    /// The next height within the same revision.
    #[must_use]
    pub const fn increment(&self) -> Self {
        Self {
            revision_number: self.revision_number,
            revision_height: self.revision_height + 1,
        }
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.revision_number, self.revision_height)
    }
}

#[cfg(test)]
mod tests {
    use super::Height;

    #[test]
    fn ordering_is_revision_first() {
        assert!(Height::new(1, 5) > Height::new(1, 4));
        assert!(Height::new(2, 1) > Height::new(1, 1_000_000));
        assert!(Height::new(0, 0) < Height::new(0, 1));
    }

    #[test]
    fn zero_height_is_the_no_timeout_sentinel() {
        assert!(Height::default().is_zero());
        assert!(!Height::new(0, 1).is_zero());
    }

    #[test]
    fn display_is_revision_dash_height() {
        assert_eq!(Height::new(3, 42).to_string(), "3-42");
    }
}
