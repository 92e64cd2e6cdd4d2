//! Block geometry and grid bucketing for the claim index.
//!
//! This crate provides the pure, stateless spatial layer the claim managers
//! are built on:
//!
//! - [`BlockPos`] - Discrete block position in world units
//! - [`Region`] - Axis-aligned box of blocks with inclusive bounds
//! - [`GridCell`] - Coordinate of a bucketing cell
//! - [`BucketKey`] - Collision-free single-integer key for a cell
//! - [`SpatialGrid`] - Block-to-cell mapping for a configured cell size
//!
//! # Layer 0 Crate
//!
//! No engine, world or persistence dependencies. Everything here is a
//! `Copy` value type, safe to share across threads.
//!
//! # Coordinate Systems
//!
//! Block coordinates are `i32` values with Y as the vertical axis. Cell
//! coordinates are block coordinates floor-divided by the grid's cell size,
//! so the cell of a negative block is negative.
//!
//! # Example
//!
//! ```
//! use claim_spatial::{BlockPos, GridCell, Region, SpatialGrid};
//!
//! let grid = SpatialGrid::new(32);
//! let claim = Region::new(BlockPos::new(0, 0, 0), BlockPos::new(31, 31, 31));
//!
//! // A region is bucketed under every cell it touches
//! let cells: Vec<GridCell> = grid.touched_cells(&claim).into_iter().collect();
//! assert_eq!(cells, vec![GridCell::new(0, 0, 0)]);
//!
//! // A point maps to exactly one cell
//! assert_eq!(grid.cell_of(BlockPos::new(32, 0, 0)), GridCell::new(1, 0, 0));
//!
//! // Exact tests confirm what the buckets only suggest
//! let other = Region::new(BlockPos::new(32, 0, 0), BlockPos::new(63, 0, 0));
//! assert!(!claim.intersects(&other));
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod cell;
mod error;
mod grid;
mod point;
mod region;

pub use cell::{BucketKey, CellRange, CellRangeIter, GridCell};
pub use error::SpatialError;
pub use grid::{DEFAULT_CELL_SIZE, SpatialGrid};
pub use point::BlockPos;
pub use region::Region;
