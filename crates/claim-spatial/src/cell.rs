//! Grid-cell coordinates and bucket keys.

/// A coordinate in the bucketing grid.
///
/// A cell is a cube of `cell_size` blocks per side; see
/// [`SpatialGrid`](crate::SpatialGrid) for the block-to-cell mapping.
///
/// # Example
///
/// ```
/// use claim_spatial::GridCell;
///
/// let cell = GridCell::new(-1, 0, 2);
/// assert_eq!(cell.as_array(), [-1, 0, 2]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridCell {
    /// X index.
    pub x: i32,
    /// Y index.
    pub y: i32,
    /// Z index.
    pub z: i32,
}

impl GridCell {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the coordinate as an array.
    #[must_use]
    pub const fn as_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Packs this cell into a [`BucketKey`].
    #[must_use]
    pub const fn bucket_key(self) -> BucketKey {
        BucketKey::from_cell(self)
    }
}

impl From<[i32; 3]> for GridCell {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl std::fmt::Display for GridCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// A single integer key for a grid cell.
///
/// Each axis keeps its full 32-bit pattern in its own lane of a `u128`, so the
/// packing is a bijection and two distinct cells never share a key.
///
/// # Example
///
/// ```
/// use claim_spatial::{BucketKey, GridCell};
///
/// let cell = GridCell::new(-3, 7, i32::MIN);
/// let key = BucketKey::from_cell(cell);
/// assert_eq!(key.to_cell(), cell);
/// assert_ne!(key, GridCell::new(7, -3, i32::MIN).bucket_key());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BucketKey(u128);

impl BucketKey {
    /// Packs a cell into a key.
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_lossless)]
    pub const fn from_cell(cell: GridCell) -> Self {
        // Reinterpreting the sign bit is intentional; to_cell reverses it
        let x = cell.x as u32 as u128;
        let y = cell.y as u32 as u128;
        let z = cell.z as u32 as u128;
        Self((x << 64) | (y << 32) | z)
    }

    /// Unpacks the key back into its cell.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const fn to_cell(self) -> GridCell {
        GridCell::new(
            (self.0 >> 64) as u32 as i32,
            (self.0 >> 32) as u32 as i32,
            self.0 as u32 as i32,
        )
    }

    /// The raw packed value.
    #[must_use]
    pub const fn raw(self) -> u128 {
        self.0
    }
}

impl From<GridCell> for BucketKey {
    fn from(cell: GridCell) -> Self {
        Self::from_cell(cell)
    }
}

/// Inclusive 3D range of grid cells, as produced by
/// [`SpatialGrid::touched_cells`](crate::SpatialGrid::touched_cells).
///
/// Iterates in Z-Y-X order (X varies fastest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    min: GridCell,
    max: GridCell,
}

impl CellRange {
    /// Creates a range between two cells. Corners are ordered per axis.
    #[must_use]
    pub fn new(a: GridCell, b: GridCell) -> Self {
        Self {
            min: GridCell::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: GridCell::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Lowest cell (inclusive).
    #[must_use]
    pub const fn min(&self) -> GridCell {
        self.min
    }

    /// Highest cell (inclusive).
    #[must_use]
    pub const fn max(&self) -> GridCell {
        self.max
    }

    /// Number of cells in the range.
    #[must_use]
    pub fn cell_count(&self) -> u64 {
        let span = |lo: i32, hi: i32| u64::from(hi.abs_diff(lo)) + 1;
        span(self.min.x, self.max.x)
            .saturating_mul(span(self.min.y, self.max.y))
            .saturating_mul(span(self.min.z, self.max.z))
    }

    /// Checks if a cell lies inside the range.
    #[must_use]
    pub const fn contains(&self, cell: GridCell) -> bool {
        cell.x >= self.min.x
            && cell.x <= self.max.x
            && cell.y >= self.min.y
            && cell.y <= self.max.y
            && cell.z >= self.min.z
            && cell.z <= self.max.z
    }

    /// Returns an iterator over every cell in the range.
    #[must_use]
    pub const fn iter(&self) -> CellRangeIter {
        CellRangeIter {
            range: *self,
            current: Some(self.min),
        }
    }
}

impl IntoIterator for CellRange {
    type Item = GridCell;
    type IntoIter = CellRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &CellRange {
    type Item = GridCell;
    type IntoIter = CellRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the cells of a [`CellRange`].
#[derive(Debug, Clone)]
pub struct CellRangeIter {
    range: CellRange,
    current: Option<GridCell>,
}

impl Iterator for CellRangeIter {
    type Item = GridCell;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        let CellRange { min, max } = self.range;

        // Advance with x fastest; stepping past max on every axis ends the range.
        // Comparing before incrementing keeps cells at i32::MAX from overflowing.
        let mut next = current;
        if next.x < max.x {
            next.x += 1;
        } else if next.y < max.y {
            next.x = min.x;
            next.y += 1;
        } else if next.z < max.z {
            next.x = min.x;
            next.y = min.y;
            next.z += 1;
        } else {
            self.current = None;
            return Some(current);
        }
        self.current = Some(next);

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.current.map_or(0, |current| {
            let CellRange { min, max } = self.range;
            let size_x = u64::from(max.x.abs_diff(min.x)) + 1;
            let size_y = u64::from(max.y.abs_diff(min.y)) + 1;

            let remaining_x = u64::from(max.x.abs_diff(current.x)) + 1;
            let remaining_y = u64::from(max.y.abs_diff(current.y));
            let remaining_z = u64::from(max.z.abs_diff(current.z));

            remaining_x
                .saturating_add(remaining_y.saturating_mul(size_x))
                .saturating_add(remaining_z.saturating_mul(size_x).saturating_mul(size_y))
        });

        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CellRangeIter {}
