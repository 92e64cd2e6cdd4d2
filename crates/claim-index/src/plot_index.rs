//! Plots nested inside chunk or area claims, for one world.

use std::sync::Arc;

use claim_spatial::{BlockPos, BucketKey, SpatialGrid};
use tracing::{debug, info};

use crate::bucket::ClaimBuckets;
use crate::claim::{BoundedClaim, Claim, PlotClaim};
use crate::error::ClaimError;
use crate::flags::{FlagId, FlagRegistry};
use crate::ids::{ActorId, WorldId};

/// Index of non-overlapping plots in one world.
///
/// Uses the same protocol as [`AreaClaimManager`](crate::AreaClaimManager):
/// exact overlap test against the claims in every touched bucket before
/// publishing, highest priority wins on lookup. Buckets are keyed by the
/// packed [`BucketKey`] of each cell.
///
/// A plot's parent is carried as data only. Adding a plot does not check that
/// the parent exists or encloses it, and removing the parent elsewhere leaves
/// its plots in place.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use claim_index::{
///     ActorId, ClaimId, ClaimKind, FlagRegistry, Owner, ParentRef, PermissionSet, PlotClaim,
///     PlotClaimIndex, WorldId,
/// };
/// use claim_spatial::{BlockPos, Region};
///
/// let registry = Arc::new(FlagRegistry::with_defaults());
/// let world = WorldId::new_random();
/// let plots = PlotClaimIndex::new(world, Arc::clone(&registry));
///
/// let shop = PlotClaim::new(
///     world,
///     Owner::Player(ActorId::new_random()),
///     Region::from_bounds([0, 60, 0], [7, 70, 7]),
///     PermissionSet::new(Arc::clone(&registry)),
///     1,
///     ParentRef::new(ClaimKind::Area, ClaimId::new_random()),
/// );
///
/// assert_eq!(plots.add(shop), Ok(true));
/// assert!(plots.get_at(BlockPos::new(3, 65, 3)).is_some_and(|plot| plot.is_area_plot()));
/// ```
pub struct PlotClaimIndex {
    world: WorldId,
    registry: Arc<FlagRegistry>,
    grid: SpatialGrid,
    buckets: ClaimBuckets<BucketKey, PlotClaim>,
}

impl PlotClaimIndex {
    /// Creates an empty index for `world` on the default grid.
    #[must_use]
    pub fn new(world: WorldId, registry: Arc<FlagRegistry>) -> Self {
        Self::with_grid(world, registry, SpatialGrid::default())
    }

    /// Creates an empty index for `world` on `grid`.
    #[must_use]
    pub fn with_grid(world: WorldId, registry: Arc<FlagRegistry>, grid: SpatialGrid) -> Self {
        Self {
            world,
            registry,
            grid,
            buckets: ClaimBuckets::default(),
        }
    }

    /// The world this index covers.
    #[must_use]
    pub const fn world(&self) -> WorldId {
        self.world
    }

    /// The flag registry permission sets must be built against.
    #[must_use]
    pub fn registry(&self) -> &Arc<FlagRegistry> {
        &self.registry
    }

    /// The grid used for bucketing.
    #[must_use]
    pub const fn grid(&self) -> SpatialGrid {
        self.grid
    }

    /// Indexes `plot` unless it overlaps a plot already indexed.
    ///
    /// Returns `Ok(false)` without changing anything on overlap.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::WorldMismatch`] if the plot belongs to another
    /// world, [`ClaimError::RegistryMismatch`] if its permissions were
    /// built against another registry, or [`ClaimError::DuplicateClaimId`]
    /// if a plot with the same id is already indexed.
    pub fn add(&self, plot: impl Into<Arc<PlotClaim>>) -> Result<bool, ClaimError> {
        let plot = plot.into();
        self.check_world(&plot)?;
        if !plot.permissions().uses_registry(&self.registry) {
            return Err(ClaimError::RegistryMismatch);
        }
        if self.buckets.contains_id(plot.id()) {
            return Err(ClaimError::DuplicateClaimId(plot.id()));
        }

        if let Some(conflict) = self.buckets.find_overlap(self.keys(&plot), &plot) {
            debug!(plot = %plot.id(), conflict = %conflict.id(), "plot overlaps an existing plot");
            return Ok(false);
        }

        self.buckets.publish(self.keys(&plot), &plot);
        debug!(
            plot = %plot.id(),
            owner = %plot.owner(),
            parent = %plot.parent().id,
            "plot created"
        );
        Ok(true)
    }

    /// Removes `plot` from every bucket its region touches.
    ///
    /// Returns `Ok(false)` if it was not indexed. A different plot that only
    /// shares the id is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::WorldMismatch`] if the plot belongs to another
    /// world.
    pub fn remove(&self, plot: &PlotClaim) -> Result<bool, ClaimError> {
        self.check_world(plot)?;
        let removed = self.buckets.retract(self.keys(plot), plot);
        if removed {
            debug!(plot = %plot.id(), "plot removed");
        }
        Ok(removed)
    }

    /// The highest-priority plot containing `pos`, if any.
    #[must_use]
    pub fn get_at(&self, pos: BlockPos) -> Option<Arc<PlotClaim>> {
        self.buckets.resolve(&self.grid.bucket_key_of(pos), pos)
    }

    /// Checks if `actor` may perform `flag` at `pos`.
    ///
    /// Points outside every plot allow everything; the host falls back to
    /// the parent claim's rules.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::UnregisteredFlag`] if the flag is unknown.
    pub fn can_perform_action(
        &self,
        actor: ActorId,
        pos: BlockPos,
        flag: &FlagId,
    ) -> Result<bool, ClaimError> {
        self.registry.index_of(flag)?;
        match self.get_at(pos) {
            Some(plot) => plot.can(actor, flag),
            None => Ok(true),
        }
    }

    /// Snapshot of every plot, each once.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<PlotClaim>> {
        self.buckets.claims()
    }

    /// Number of indexed plots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` if no plot is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Drops every plot.
    pub fn clear(&self) {
        self.buckets.clear();
        info!(world = %self.world, "cleared plots");
    }

    fn keys(&self, plot: &PlotClaim) -> impl Iterator<Item = BucketKey> + use<> {
        self.grid
            .touched_cells(&plot.region())
            .into_iter()
            .map(SpatialGrid::bucket_key)
    }

    fn check_world(&self, plot: &PlotClaim) -> Result<(), ClaimError> {
        if plot.world() == self.world {
            Ok(())
        } else {
            Err(ClaimError::WorldMismatch {
                expected: self.world,
                actual: plot.world(),
            })
        }
    }
}

impl std::fmt::Debug for PlotClaimIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotClaimIndex")
            .field("world", &self.world)
            .field("grid", &self.grid)
            .field("plots", &self.len())
            .finish_non_exhaustive()
    }
}
