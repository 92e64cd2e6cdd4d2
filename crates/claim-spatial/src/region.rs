//! Axis-aligned block regions.

use crate::point::BlockPos;

/// An axis-aligned box of blocks with inclusive bounds on every axis.
///
/// The constructor orders the corners, so `min <= max` holds per axis for
/// every `Region` value.
///
/// # Example
///
/// ```
/// use claim_spatial::{BlockPos, Region};
///
/// let region = Region::new(BlockPos::new(10, 10, 10), BlockPos::new(0, 0, 0));
/// assert_eq!(region.min(), BlockPos::new(0, 0, 0));
/// assert_eq!(region.max(), BlockPos::new(10, 10, 10));
///
/// assert!(region.contains(BlockPos::new(10, 0, 5))); // max is inclusive
/// assert!(!region.contains(BlockPos::new(11, 0, 5)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    min: BlockPos,
    max: BlockPos,
}

impl Region {
    /// Creates a region spanning two corner positions, in any order.
    #[must_use]
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a region from raw per-axis bounds.
    ///
    /// Bounds given in the wrong order are swapped.
    #[must_use]
    pub fn from_bounds(min: [i32; 3], max: [i32; 3]) -> Self {
        Self::new(min.into(), max.into())
    }

    /// Creates a region covering a single block.
    #[must_use]
    pub const fn single(pos: BlockPos) -> Self {
        Self { min: pos, max: pos }
    }

    /// Minimum corner (inclusive).
    #[must_use]
    pub const fn min(&self) -> BlockPos {
        self.min
    }

    /// Maximum corner (inclusive).
    #[must_use]
    pub const fn max(&self) -> BlockPos {
        self.max
    }

    /// Returns the size in blocks as (x, y, z). Each axis is at least 1.
    ///
    /// # Example
    ///
    /// ```
    /// use claim_spatial::Region;
    ///
    /// let region = Region::from_bounds([0, 0, 0], [31, 15, 0]);
    /// assert_eq!(region.size(), (32, 16, 1));
    /// ```
    #[must_use]
    pub const fn size(&self) -> (u32, u32, u32) {
        (
            self.max.x.abs_diff(self.min.x).saturating_add(1),
            self.max.y.abs_diff(self.min.y).saturating_add(1),
            self.max.z.abs_diff(self.min.z).saturating_add(1),
        )
    }

    /// Total number of blocks in the region.
    #[must_use]
    pub fn volume(&self) -> u64 {
        let (w, h, d) = self.size();
        u64::from(w)
            .saturating_mul(u64::from(h))
            .saturating_mul(u64::from(d))
    }

    /// Checks if a block lies inside the region. Bounds are inclusive.
    #[must_use]
    pub const fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    /// Checks if two regions share at least one block.
    ///
    /// Touching faces count as intersecting because bounds are inclusive.
    ///
    /// # Example
    ///
    /// ```
    /// use claim_spatial::Region;
    ///
    /// let a = Region::from_bounds([0, 0, 0], [31, 31, 31]);
    /// let b = Region::from_bounds([16, 0, 0], [48, 0, 0]);
    /// let c = Region::from_bounds([32, 0, 0], [63, 0, 0]);
    ///
    /// assert!(a.intersects(&b));
    /// assert!(!a.intersects(&c));
    /// ```
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Returns the shared blocks of two regions, or `None` if they are disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }
}

impl From<BlockPos> for Region {
    fn from(pos: BlockPos) -> Self {
        Self::single(pos)
    }
}
