//! Claim value types.
//!
//! Three shapes share one capability set ([`Claim`]):
//!
//! - [`ChunkClaim`] - exactly one grid cell of one world
//! - [`AreaClaim`] - an arbitrary [`Region`] with a priority
//! - [`PlotClaim`] - a region nested under a parent claim, with a priority
//!
//! Claims are immutable. Transferring ownership or changing permissions
//! produces a new value with the same [`ClaimId`] and geometry.

use claim_spatial::{BlockPos, GridCell, Region, SpatialGrid};

use crate::error::ClaimError;
use crate::flags::FlagId;
use crate::ids::{ActorId, ClaimId, WorldId};
use crate::owner::Owner;
use crate::permissions::PermissionSet;

/// The shape family of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClaimKind {
    /// A single grid cell.
    Chunk,
    /// A free-form region.
    Area,
    /// A region nested under a parent claim.
    Plot,
}

impl std::fmt::Display for ClaimKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Chunk => "chunk",
            Self::Area => "area",
            Self::Plot => "plot",
        })
    }
}

/// Capabilities shared by every claim shape.
pub trait Claim {
    /// Stable id of this claim.
    fn id(&self) -> ClaimId;

    /// The claim's shape family.
    fn kind(&self) -> ClaimKind;

    /// The world this claim lives in.
    fn world(&self) -> WorldId;

    /// The claim's owner.
    fn owner(&self) -> Owner;

    /// The flags granted to non-owners.
    fn permissions(&self) -> &PermissionSet;

    /// Checks if the claim grants `flag` to non-owners.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::UnregisteredFlag`] if the flag is unknown.
    fn allows(&self, flag: &FlagId) -> Result<bool, ClaimError> {
        self.permissions().allows(flag)
    }

    /// Checks if `actor` may perform `flag` inside this claim.
    ///
    /// The owner may do anything; everyone else gets exactly the permission
    /// bit. The flag is validated even for the owner.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::UnregisteredFlag`] if the flag is unknown.
    fn can(&self, actor: ActorId, flag: &FlagId) -> Result<bool, ClaimError> {
        let granted = self.allows(flag)?;
        Ok(self.owner().is_owner(actor) || granted)
    }
}

/// A claim covering an arbitrary region and resolved by priority.
pub trait BoundedClaim: Claim {
    /// The blocks covered by the claim.
    fn region(&self) -> Region;

    /// Priority used when several claims contain the same block.
    fn priority(&self) -> i32;

    /// Checks if a block lies inside the claim.
    fn contains(&self, pos: BlockPos) -> bool {
        self.region().contains(pos)
    }

    /// Checks if two claims share a block in the same world.
    fn intersects<C: BoundedClaim>(&self, other: &C) -> bool
    where
        Self: Sized,
    {
        self.world() == other.world() && self.region().intersects(&other.region())
    }
}

/// A grid cell qualified by its world: the key of a chunk claim.
///
/// # Example
///
/// ```
/// use claim_index::{WorldCell, WorldId};
/// use claim_spatial::{BlockPos, GridCell, SpatialGrid};
///
/// let world = WorldId::new_random();
/// let key = WorldCell::from_block(world, &SpatialGrid::new(32), BlockPos::new(-1, 40, 5));
/// assert_eq!(key.cell, GridCell::new(-1, 1, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldCell {
    /// The world.
    pub world: WorldId,
    /// The cell in that world.
    pub cell: GridCell,
}

impl WorldCell {
    /// Creates a key.
    #[must_use]
    pub const fn new(world: WorldId, cell: GridCell) -> Self {
        Self { world, cell }
    }

    /// The key of the cell containing a block.
    #[must_use]
    pub const fn from_block(world: WorldId, grid: &SpatialGrid, pos: BlockPos) -> Self {
        Self::new(world, grid.cell_of(pos))
    }
}

impl std::fmt::Display for WorldCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.cell, self.world)
    }
}

/// A claim over exactly one grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkClaim {
    id: ClaimId,
    key: WorldCell,
    owner: Owner,
    permissions: PermissionSet,
}

impl ChunkClaim {
    /// Creates a chunk claim with a fresh id.
    #[must_use]
    pub fn new(owner: Owner, key: WorldCell, permissions: PermissionSet) -> Self {
        Self {
            id: ClaimId::new_random(),
            key,
            owner,
            permissions,
        }
    }

    /// Replaces the id, e.g. when restoring a persisted claim.
    #[must_use]
    pub fn with_id(mut self, id: ClaimId) -> Self {
        self.id = id;
        self
    }

    /// The world-qualified cell this claim covers.
    #[must_use]
    pub const fn key(&self) -> WorldCell {
        self.key
    }

    /// The cell this claim covers.
    #[must_use]
    pub const fn cell(&self) -> GridCell {
        self.key.cell
    }

    /// Checks if a block lies in this claim's cell.
    #[must_use]
    pub fn contains(&self, grid: &SpatialGrid, world: WorldId, pos: BlockPos) -> bool {
        self.key.world == world && grid.cell_contains(self.key.cell, pos)
    }

    /// A copy of this claim with a different owner.
    #[must_use]
    pub fn with_owner(&self, owner: Owner) -> Self {
        Self {
            owner,
            ..self.clone()
        }
    }

    /// A copy of this claim with different permissions.
    #[must_use]
    pub fn with_permissions(&self, permissions: PermissionSet) -> Self {
        Self {
            permissions,
            ..self.clone()
        }
    }
}

impl Claim for ChunkClaim {
    fn id(&self) -> ClaimId {
        self.id
    }

    fn kind(&self) -> ClaimKind {
        ClaimKind::Chunk
    }

    fn world(&self) -> WorldId {
        self.key.world
    }

    fn owner(&self) -> Owner {
        self.owner
    }

    fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }
}

/// A claim over a free-form region of one world.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use claim_index::{ActorId, AreaClaim, BoundedClaim, FlagRegistry, Owner, PermissionSet, WorldId};
/// use claim_spatial::{BlockPos, Region};
///
/// let registry = Arc::new(FlagRegistry::with_defaults());
/// let claim = AreaClaim::new(
///     WorldId::new_random(),
///     Owner::Player(ActorId::new_random()),
///     Region::from_bounds([0, 0, 0], [31, 31, 31]),
///     PermissionSet::new(registry),
///     10,
/// );
///
/// assert!(claim.contains(BlockPos::new(5, 10, 2)));
/// assert!(!claim.contains(BlockPos::new(32, 0, 0)));
/// assert_eq!(claim.priority(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaClaim {
    id: ClaimId,
    world: WorldId,
    owner: Owner,
    region: Region,
    permissions: PermissionSet,
    priority: i32,
}

impl AreaClaim {
    /// Creates an area claim with a fresh id.
    #[must_use]
    pub fn new(
        world: WorldId,
        owner: Owner,
        region: Region,
        permissions: PermissionSet,
        priority: i32,
    ) -> Self {
        Self {
            id: ClaimId::new_random(),
            world,
            owner,
            region,
            permissions,
            priority,
        }
    }

    /// Replaces the id, e.g. when restoring a persisted claim.
    #[must_use]
    pub fn with_id(mut self, id: ClaimId) -> Self {
        self.id = id;
        self
    }

    /// A copy of this claim with a different owner.
    #[must_use]
    pub fn with_owner(&self, owner: Owner) -> Self {
        Self {
            owner,
            ..self.clone()
        }
    }

    /// A copy of this claim with different permissions.
    #[must_use]
    pub fn with_permissions(&self, permissions: PermissionSet) -> Self {
        Self {
            permissions,
            ..self.clone()
        }
    }
}

impl Claim for AreaClaim {
    fn id(&self) -> ClaimId {
        self.id
    }

    fn kind(&self) -> ClaimKind {
        ClaimKind::Area
    }

    fn world(&self) -> WorldId {
        self.world
    }

    fn owner(&self) -> Owner {
        self.owner
    }

    fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }
}

impl BoundedClaim for AreaClaim {
    fn region(&self) -> Region {
        self.region
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// Reference from a plot to the claim it is nested in.
///
/// Never dereferenced by the index: the parent may be removed later without
/// affecting the plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParentRef {
    /// Shape of the parent claim.
    pub kind: ClaimKind,
    /// Id of the parent claim.
    pub id: ClaimId,
}

impl ParentRef {
    /// Creates a parent reference.
    #[must_use]
    pub const fn new(kind: ClaimKind, id: ClaimId) -> Self {
        Self { kind, id }
    }

    /// A reference to an existing claim.
    #[must_use]
    pub fn to<C: Claim>(claim: &C) -> Self {
        Self::new(claim.kind(), claim.id())
    }
}

/// A region claimed inside another claim (e.g. a rented shop in a town).
///
/// The plot's region is not checked against its parent's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotClaim {
    id: ClaimId,
    world: WorldId,
    owner: Owner,
    region: Region,
    permissions: PermissionSet,
    priority: i32,
    parent: ParentRef,
}

impl PlotClaim {
    /// Creates a plot claim with a fresh id.
    #[must_use]
    pub fn new(
        world: WorldId,
        owner: Owner,
        region: Region,
        permissions: PermissionSet,
        priority: i32,
        parent: ParentRef,
    ) -> Self {
        Self {
            id: ClaimId::new_random(),
            world,
            owner,
            region,
            permissions,
            priority,
            parent,
        }
    }

    /// Replaces the id, e.g. when restoring a persisted claim.
    #[must_use]
    pub fn with_id(mut self, id: ClaimId) -> Self {
        self.id = id;
        self
    }

    /// The claim this plot is nested in.
    #[must_use]
    pub const fn parent(&self) -> ParentRef {
        self.parent
    }

    /// Returns `true` if the parent is a chunk claim.
    #[must_use]
    pub fn is_chunk_plot(&self) -> bool {
        self.parent.kind == ClaimKind::Chunk
    }

    /// Returns `true` if the parent is an area claim.
    #[must_use]
    pub fn is_area_plot(&self) -> bool {
        self.parent.kind == ClaimKind::Area
    }

    /// A copy of this plot with a different owner.
    #[must_use]
    pub fn with_owner(&self, owner: Owner) -> Self {
        Self {
            owner,
            ..self.clone()
        }
    }

    /// A copy of this plot with different permissions.
    #[must_use]
    pub fn with_permissions(&self, permissions: PermissionSet) -> Self {
        Self {
            permissions,
            ..self.clone()
        }
    }
}

impl Claim for PlotClaim {
    fn id(&self) -> ClaimId {
        self.id
    }

    fn kind(&self) -> ClaimKind {
        ClaimKind::Plot
    }

    fn world(&self) -> WorldId {
        self.world
    }

    fn owner(&self) -> Owner {
        self.owner
    }

    fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }
}

impl BoundedClaim for PlotClaim {
    fn region(&self) -> Region {
        self.region
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
