//! Free-form region claims, bucketed per world by grid cell.

use std::sync::Arc;

use claim_spatial::{BlockPos, GridCell, SpatialGrid};
use dashmap::DashMap;
use tracing::{debug, info};

use crate::bucket::ClaimBuckets;
use crate::claim::{AreaClaim, BoundedClaim, Claim};
use crate::error::ClaimError;
use crate::flags::{FlagId, FlagRegistry};
use crate::ids::{ActorId, WorldId};

type WorldBuckets = Arc<ClaimBuckets<GridCell, AreaClaim>>;

/// Index of non-overlapping area claims.
///
/// A claim is stored in the bucket of every grid cell its region touches.
/// Creation checks the claims already in those buckets for an exact region
/// overlap and publishes only if there is none. Point lookups read a single
/// bucket and pick the highest-priority claim containing the point.
///
/// Reads never block; mutations expect one writer at a time.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use claim_index::{ActorId, AreaClaim, AreaClaimManager, FlagRegistry, Owner, PermissionSet, WorldId};
/// use claim_spatial::{BlockPos, Region};
///
/// let registry = Arc::new(FlagRegistry::with_defaults());
/// let manager = AreaClaimManager::new(Arc::clone(&registry));
/// let world = WorldId::new_random();
/// let area = |min, max| AreaClaim::new(
///     world,
///     Owner::Player(ActorId::new_random()),
///     Region::from_bounds(min, max),
///     PermissionSet::new(Arc::clone(&registry)),
///     0,
/// );
///
/// assert_eq!(manager.create_claim(area([0, 0, 0], [31, 31, 31])), Ok(true));
/// assert_eq!(manager.create_claim(area([16, 0, 0], [48, 0, 0])), Ok(false));
/// assert_eq!(manager.create_claim(area([32, 0, 0], [63, 0, 0])), Ok(true));
///
/// assert!(manager.claim_at(world, BlockPos::new(5, 10, 2)).is_some());
/// ```
pub struct AreaClaimManager {
    registry: Arc<FlagRegistry>,
    grid: SpatialGrid,
    worlds: DashMap<WorldId, WorldBuckets>,
}

impl AreaClaimManager {
    /// Creates an empty manager on the default grid.
    #[must_use]
    pub fn new(registry: Arc<FlagRegistry>) -> Self {
        Self::with_grid(registry, SpatialGrid::default())
    }

    /// Creates an empty manager on `grid`.
    #[must_use]
    pub fn with_grid(registry: Arc<FlagRegistry>, grid: SpatialGrid) -> Self {
        Self {
            registry,
            grid,
            worlds: DashMap::new(),
        }
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

    /// Indexes `claim` unless it overlaps a claim already in its world.
    ///
    /// Returns `Ok(false)` without changing anything on overlap.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::RegistryMismatch`] if the claim's permissions
    /// were built against another registry, and
    /// [`ClaimError::DuplicateClaimId`] if a claim with the same id is
    /// already indexed in any world.
    pub fn create_claim(&self, claim: impl Into<Arc<AreaClaim>>) -> Result<bool, ClaimError> {
        let claim = claim.into();
        if !claim.permissions().uses_registry(&self.registry) {
            return Err(ClaimError::RegistryMismatch);
        }
        if self.worlds.iter().any(|entry| entry.value().contains_id(claim.id())) {
            return Err(ClaimError::DuplicateClaimId(claim.id()));
        }

        let cells = self.grid.touched_cells(&claim.region());
        let conflict = self
            .world_buckets(claim.world())
            .and_then(|buckets| buckets.find_overlap(cells, &claim));
        if let Some(conflict) = conflict {
            debug!(
                claim = %claim.id(),
                conflict = %conflict.id(),
                shared = ?claim.region().intersection(&conflict.region()),
                "area claim overlaps an existing claim"
            );
            return Ok(false);
        }

        let buckets = Arc::clone(&self.worlds.entry(claim.world()).or_default());
        buckets.publish(cells, &claim);
        debug!(
            claim = %claim.id(),
            world = %claim.world(),
            owner = %claim.owner(),
            cells = cells.cell_count(),
            volume = claim.region().volume(),
            "area claim created"
        );
        Ok(true)
    }

    /// Removes `claim` from every bucket its region touches.
    ///
    /// Returns `false` if it was not indexed. A different claim that only
    /// shares the id is left in place.
    pub fn remove_claim(&self, claim: &AreaClaim) -> bool {
        let world = claim.world();
        let Some(buckets) = self.world_buckets(world) else {
            return false;
        };

        let removed = buckets.retract(self.grid.touched_cells(&claim.region()), claim);
        if buckets.is_empty() {
            self.worlds.remove_if(&world, |_, buckets| buckets.is_empty());
        }
        if removed {
            debug!(claim = %claim.id(), world = %world, "area claim removed");
        }
        removed
    }

    /// The highest-priority claim containing `pos`, if any.
    #[must_use]
    pub fn claim_at(&self, world: WorldId, pos: BlockPos) -> Option<Arc<AreaClaim>> {
        self.world_buckets(world)?
            .resolve(&self.grid.cell_of(pos), pos)
    }

    /// Checks if `actor` may perform `flag` at `pos`.
    ///
    /// Points outside every claim allow everything.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::UnregisteredFlag`] if the flag is unknown.
    pub fn can_perform_action(
        &self,
        actor: ActorId,
        world: WorldId,
        pos: BlockPos,
        flag: &FlagId,
    ) -> Result<bool, ClaimError> {
        self.registry.index_of(flag)?;
        match self.claim_at(world, pos) {
            Some(claim) => claim.can(actor, flag),
            None => Ok(true),
        }
    }

    /// Drops every claim in `world`.
    pub fn clear_world(&self, world: WorldId) {
        if let Some((_, buckets)) = self.worlds.remove(&world) {
            info!(world = %world, dropped = buckets.len(), "cleared area claims of world");
        }
    }

    /// Drops every claim.
    pub fn clear_all(&self) {
        let worlds = self.worlds.len();
        self.worlds.clear();
        info!(worlds, "cleared all area claims");
    }

    /// Snapshot of the claims in `world`, each once.
    #[must_use]
    pub fn claims_in_world(&self, world: WorldId) -> Vec<Arc<AreaClaim>> {
        self.world_buckets(world)
            .map(|buckets| buckets.claims())
            .unwrap_or_default()
    }

    /// Snapshot of every claim, each once.
    #[must_use]
    pub fn all_claims(&self) -> Vec<Arc<AreaClaim>> {
        let worlds: Vec<WorldBuckets> = self
            .worlds
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        worlds.iter().flat_map(|buckets| buckets.claims()).collect()
    }

    /// Number of indexed claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.worlds.iter().map(|entry| entry.value().len()).sum()
    }

    /// Returns `true` if no claim is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    fn world_buckets(&self, world: WorldId) -> Option<WorldBuckets> {
        self.worlds.get(&world).map(|entry| Arc::clone(entry.value()))
    }
}

impl std::fmt::Debug for AreaClaimManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AreaClaimManager")
            .field("grid", &self.grid)
            .field("worlds", &self.worlds.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use claim_spatial::Region;

    use super::*;
    use crate::flags::defaults;
    use crate::owner::Owner;
    use crate::permissions::PermissionSet;

    struct Fixture {
        registry: Arc<FlagRegistry>,
        manager: AreaClaimManager,
        world: WorldId,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = Arc::new(FlagRegistry::with_defaults());
            Self {
                manager: AreaClaimManager::with_grid(Arc::clone(&registry), SpatialGrid::new(32)),
                registry,
                world: WorldId::new_random(),
            }
        }

        fn area(&self, min: [i32; 3], max: [i32; 3], priority: i32) -> Arc<AreaClaim> {
            self.area_in(self.world, min, max, priority)
        }

        fn area_in(
            &self,
            world: WorldId,
            min: [i32; 3],
            max: [i32; 3],
            priority: i32,
        ) -> Arc<AreaClaim> {
            Arc::new(AreaClaim::new(
                world,
                Owner::Player(ActorId::new_random()),
                Region::from_bounds(min, max),
                PermissionSet::new(Arc::clone(&self.registry)),
                priority,
            ))
        }
    }

    #[test]
    fn test_overlap_is_rejected_without_mutation() {
        let fx = Fixture::new();
        let a = fx.area([0, 0, 0], [31, 31, 31], 0);
        assert_eq!(fx.manager.create_claim(Arc::clone(&a)), Ok(true));

        let b = fx.area([16, 0, 0], [48, 0, 0], 0);
        assert_eq!(fx.manager.create_claim(Arc::clone(&b)), Ok(false));
        assert_eq!(fx.manager.len(), 1);
        assert!(fx.manager.claim_at(fx.world, BlockPos::new(40, 0, 0)).is_none());
    }

    #[test]
    fn test_same_region_in_other_world_is_accepted() {
        let fx = Fixture::new();
        let other = WorldId::new_random();
        assert_eq!(fx.manager.create_claim(fx.area([0, 0, 0], [9, 9, 9], 0)), Ok(true));
        assert_eq!(
            fx.manager.create_claim(fx.area_in(other, [0, 0, 0], [9, 9, 9], 0)),
            Ok(true)
        );
        assert_eq!(fx.manager.len(), 2);
        assert_eq!(fx.manager.claims_in_world(other).len(), 1);
    }

    #[test]
    fn test_claim_spanning_cells_resolves_everywhere() {
        let fx = Fixture::new();
        let wide = fx.area([-40, 0, -40], [40, 70, 40], 0);
        fx.manager.create_claim(Arc::clone(&wide)).unwrap();

        for pos in [
            BlockPos::new(-40, 0, -40),
            BlockPos::new(0, 35, 0),
            BlockPos::new(40, 70, 40),
        ] {
            assert_eq!(fx.manager.claim_at(fx.world, pos).unwrap().id(), wide.id());
        }
        assert!(fx.manager.claim_at(fx.world, BlockPos::new(41, 0, 0)).is_none());
        assert_eq!(fx.manager.all_claims().len(), 1);
    }

    #[test]
    fn test_remove_drops_world_entry() {
        let fx = Fixture::new();
        let a = fx.area([0, 0, 0], [100, 0, 0], 0);
        fx.manager.create_claim(Arc::clone(&a)).unwrap();

        assert!(fx.manager.remove_claim(&a));
        assert!(!fx.manager.remove_claim(&a));
        assert!(fx.manager.is_empty());
        assert!(fx.manager.claim_at(fx.world, BlockPos::new(50, 0, 0)).is_none());
    }

    #[test]
    fn test_remove_keeps_neighbours() {
        let fx = Fixture::new();
        let a = fx.area([0, 0, 0], [15, 0, 0], 0);
        let b = fx.area([16, 0, 0], [31, 0, 0], 0);
        fx.manager.create_claim(Arc::clone(&a)).unwrap();
        fx.manager.create_claim(Arc::clone(&b)).unwrap();

        assert!(fx.manager.remove_claim(&a));
        assert_eq!(
            fx.manager.claim_at(fx.world, BlockPos::new(20, 0, 0)).unwrap().id(),
            b.id()
        );
        assert!(fx.manager.claim_at(fx.world, BlockPos::new(5, 0, 0)).is_none());
    }

    #[test]
    fn test_reused_id_is_rejected() {
        let fx = Fixture::new();
        let first = fx.area([0, 0, 0], [40, 0, 0], 0);
        fx.manager.create_claim(Arc::clone(&first)).unwrap();

        let twin = AreaClaim::clone(&fx.area([41, 0, 0], [80, 0, 0], 0)).with_id(first.id());
        assert_eq!(
            fx.manager.create_claim(twin.clone()),
            Err(ClaimError::DuplicateClaimId(first.id()))
        );
        let other_world = fx.area_in(WorldId::new_random(), [0, 0, 0], [1, 1, 1], 0);
        let elsewhere = AreaClaim::clone(&other_world).with_id(first.id());
        assert_eq!(
            fx.manager.create_claim(elsewhere),
            Err(ClaimError::DuplicateClaimId(first.id()))
        );
        assert_eq!(fx.manager.len(), 1);

        // Only the indexed value can be removed under that id.
        assert!(!fx.manager.remove_claim(&twin));
        assert_eq!(
            fx.manager.claim_at(fx.world, BlockPos::new(20, 0, 0)).unwrap().id(),
            first.id()
        );
        assert!(fx.manager.remove_claim(&first));
        assert!(fx.manager.is_empty());
        assert!(fx.manager.claim_at(fx.world, BlockPos::new(60, 0, 0)).is_none());
    }

    #[test]
    fn test_can_perform_action() {
        let fx = Fixture::new();
        let owner = ActorId::new_random();
        let visitor = ActorId::new_random();
        let pvp = fx.registry.get(defaults::PVP).unwrap();
        let build = fx.registry.get(defaults::BUILD).unwrap();
        let arena = AreaClaim::new(
            fx.world,
            Owner::Player(owner),
            Region::from_bounds([0, 0, 0], [20, 20, 20]),
            PermissionSet::with_allowed(Arc::clone(&fx.registry), [&pvp]).unwrap(),
            0,
        );
        fx.manager.create_claim(arena).unwrap();

        let inside = BlockPos::new(10, 10, 10);
        assert_eq!(fx.manager.can_perform_action(visitor, fx.world, inside, &pvp), Ok(true));
        assert_eq!(fx.manager.can_perform_action(visitor, fx.world, inside, &build), Ok(false));
        assert_eq!(fx.manager.can_perform_action(owner, fx.world, inside, &build), Ok(true));
        assert_eq!(
            fx.manager
                .can_perform_action(visitor, fx.world, BlockPos::new(21, 0, 0), &build),
            Ok(true)
        );
    }

    #[test]
    fn test_foreign_registry_is_rejected() {
        let fx = Fixture::new();
        let claim = AreaClaim::new(
            fx.world,
            Owner::Player(ActorId::new_random()),
            Region::from_bounds([0, 0, 0], [1, 1, 1]),
            PermissionSet::new(Arc::new(FlagRegistry::new())),
            0,
        );
        assert_eq!(fx.manager.create_claim(claim), Err(ClaimError::RegistryMismatch));
        assert!(fx.manager.is_empty());
    }

    #[test]
    fn test_clear_world_and_clear_all() {
        let fx = Fixture::new();
        let other = WorldId::new_random();
        fx.manager.create_claim(fx.area([0, 0, 0], [1, 1, 1], 0)).unwrap();
        fx.manager
            .create_claim(fx.area_in(other, [0, 0, 0], [1, 1, 1], 0))
            .unwrap();

        fx.manager.clear_world(fx.world);
        assert!(fx.manager.claims_in_world(fx.world).is_empty());
        assert_eq!(fx.manager.len(), 1);

        fx.manager.clear_all();
        assert!(fx.manager.is_empty());
    }
}
