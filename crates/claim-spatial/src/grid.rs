//! Block-to-cell bucketing.

use crate::cell::{BucketKey, CellRange, GridCell};
use crate::error::SpatialError;
use crate::point::BlockPos;
use crate::region::Region;

/// Default edge length of a grid cell, in blocks.
pub const DEFAULT_CELL_SIZE: i32 = 32;

/// Maps blocks and regions onto a regular grid of cubic cells.
///
/// This is the only configuration the claim index takes from the host: the
/// edge length of a bucketing cell. Every index built over the same grid must
/// use the same cell size.
///
/// All mapping uses floor division, so negative coordinates land in negative
/// cells (`-1` is in cell `-1`, not cell `0`).
///
/// # Example
///
/// ```
/// use claim_spatial::{BlockPos, GridCell, Region, SpatialGrid};
///
/// let grid = SpatialGrid::default();
/// assert_eq!(grid.cell_size(), 32);
///
/// assert_eq!(grid.cell_of(BlockPos::new(5, 10, 2)), GridCell::new(0, 0, 0));
/// assert_eq!(grid.cell_of(BlockPos::new(-1, 32, 63)), GridCell::new(-1, 1, 1));
///
/// let region = Region::from_bounds([16, 0, 0], [48, 0, 0]);
/// let cells: Vec<_> = grid.touched_cells(&region).into_iter().collect();
/// assert_eq!(cells, vec![GridCell::new(0, 0, 0), GridCell::new(1, 0, 0)]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "i32", into = "i32")
)]
pub struct SpatialGrid {
    cell_size: i32,
}

impl SpatialGrid {
    /// Creates a grid with the given cell size.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not positive. Use [`SpatialGrid::try_new`]
    /// for sizes read from configuration.
    #[must_use]
    pub const fn new(cell_size: i32) -> Self {
        assert!(cell_size > 0, "cell size must be positive");
        Self { cell_size }
    }

    /// Creates a grid, rejecting a non-positive cell size.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidCellSize`] if `cell_size <= 0`.
    ///
    /// # Example
    ///
    /// ```
    /// use claim_spatial::{SpatialError, SpatialGrid};
    ///
    /// assert!(SpatialGrid::try_new(16).is_ok());
    /// assert_eq!(SpatialGrid::try_new(0), Err(SpatialError::InvalidCellSize(0)));
    /// ```
    pub const fn try_new(cell_size: i32) -> Result<Self, SpatialError> {
        if cell_size <= 0 {
            return Err(SpatialError::InvalidCellSize(cell_size));
        }
        Ok(Self { cell_size })
    }

    /// Edge length of a cell, in blocks.
    #[must_use]
    pub const fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// Returns the cell containing a block.
    #[must_use]
    pub const fn cell_of(&self, pos: BlockPos) -> GridCell {
        GridCell::new(
            pos.x.div_euclid(self.cell_size),
            pos.y.div_euclid(self.cell_size),
            pos.z.div_euclid(self.cell_size),
        )
    }

    /// Returns the bucket key of the cell containing a block.
    #[must_use]
    pub const fn bucket_key_of(&self, pos: BlockPos) -> BucketKey {
        self.cell_of(pos).bucket_key()
    }

    /// Packs a cell into its bucket key.
    #[must_use]
    pub const fn bucket_key(cell: GridCell) -> BucketKey {
        cell.bucket_key()
    }

    /// Returns every cell fully or partially covered by a region.
    ///
    /// The range is inclusive on both ends, so a region that ends exactly on a
    /// cell boundary touches only the cells it actually covers.
    #[must_use]
    pub fn touched_cells(&self, region: &Region) -> CellRange {
        CellRange::new(self.cell_of(region.min()), self.cell_of(region.max()))
    }

    /// Returns the block region covered by a cell.
    ///
    /// Coordinates saturate at the `i32` limits for cells at the edge of
    /// the world.
    ///
    /// # Example
    ///
    /// ```
    /// use claim_spatial::{GridCell, Region, SpatialGrid};
    ///
    /// let grid = SpatialGrid::new(32);
    /// assert_eq!(
    ///     grid.cell_region(GridCell::new(-1, 0, 1)),
    ///     Region::from_bounds([-32, 0, 32], [-1, 31, 63]),
    /// );
    /// ```
    #[must_use]
    pub fn cell_region(&self, cell: GridCell) -> Region {
        let lo = |c: i32| c.saturating_mul(self.cell_size);
        let hi = |c: i32| lo(c).saturating_add(self.cell_size - 1);
        Region::from_bounds(
            [lo(cell.x), lo(cell.y), lo(cell.z)],
            [hi(cell.x), hi(cell.y), hi(cell.z)],
        )
    }

    /// Checks if a block lies inside a cell.
    #[must_use]
    pub const fn cell_contains(&self, cell: GridCell, pos: BlockPos) -> bool {
        let of = self.cell_of(pos);
        of.x == cell.x && of.y == cell.y && of.z == cell.z
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl TryFrom<i32> for SpatialGrid {
    type Error = SpatialError;

    fn try_from(cell_size: i32) -> Result<Self, Self::Error> {
        Self::try_new(cell_size)
    }
}

impl From<SpatialGrid> for i32 {
    fn from(grid: SpatialGrid) -> Self {
        grid.cell_size
    }
}
