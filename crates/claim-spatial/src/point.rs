//! Discrete block positions.

/// A discrete 3D position in world block units.
///
/// Uses `i32` coordinates so claims can be placed on either side of the world
/// origin.
///
/// # Example
///
/// ```
/// use claim_spatial::BlockPos;
///
/// let pos = BlockPos::new(1, 2, 3);
/// assert_eq!(pos.x, 1);
/// assert_eq!(pos.y, 2);
/// assert_eq!(pos.z, 3);
///
/// // Supports negative coordinates
/// let below = BlockPos::new(-5, -64, -15);
/// assert_eq!(below.y, -64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (vertical).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Creates a new block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the position as an array.
    ///
    /// # Example
    ///
    /// ```
    /// use claim_spatial::BlockPos;
    ///
    /// assert_eq!(BlockPos::new(1, 2, 3).as_array(), [1, 2, 3]);
    /// ```
    #[must_use]
    pub const fn as_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Per-axis minimum of two positions.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Per-axis maximum of two positions.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<[i32; 3]> for BlockPos {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<BlockPos> for [i32; 3] {
    fn from(pos: BlockPos) -> Self {
        pos.as_array()
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
