//! Single-cell claims keyed by world and grid cell.

use std::sync::Arc;

use claim_spatial::{BlockPos, SpatialGrid};
use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::claim::{ChunkClaim, Claim, WorldCell};
use crate::error::ClaimError;
use crate::flags::{FlagId, FlagRegistry};
use crate::ids::{ActorId, WorldId};
use crate::owner::Owner;
use crate::permissions::PermissionSet;

/// Primary map plus the two secondary indexes. Always updated together under
/// one write lock.
#[derive(Debug, Default)]
struct ChunkIndex {
    claims: HashMap<WorldCell, Arc<ChunkClaim>>,
    by_owner: HashMap<ActorId, HashSet<WorldCell>>,
    by_world: HashMap<WorldId, HashSet<WorldCell>>,
}

impl ChunkIndex {
    fn insert(&mut self, claim: Arc<ChunkClaim>) {
        let key = claim.key();
        self.by_owner
            .entry(claim.owner().identity())
            .or_default()
            .insert(key);
        self.by_world.entry(key.world).or_default().insert(key);
        self.claims.insert(key, claim);
    }

    fn remove(&mut self, key: &WorldCell) -> Option<Arc<ChunkClaim>> {
        let claim = self.claims.remove(key)?;
        unlink(&mut self.by_owner, &claim.owner().identity(), key);
        unlink(&mut self.by_world, &key.world, key);
        Some(claim)
    }
}

/// Removes `key` from the set under `group`, dropping the set once empty.
fn unlink<G>(index: &mut HashMap<G, HashSet<WorldCell>>, group: &G, key: &WorldCell)
where
    G: Eq + std::hash::Hash,
{
    if let Some(keys) = index.get_mut(group) {
        keys.remove(key);
        if keys.is_empty() {
            index.remove(group);
        }
    }
}

/// Index of single-cell claims.
///
/// At most one claim occupies a `(world, cell)` key. Each claim is also
/// listed under its owner and its world. Readers take a shared lock and
/// always see the three maps agree; writers hold the exclusive lock for one
/// bounded update.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use claim_index::{
///     ActorId, ChunkClaimManager, FlagRegistry, Owner, PermissionSet, WorldCell, WorldId,
///     flags::defaults,
/// };
/// use claim_spatial::{BlockPos, GridCell};
///
/// let registry = Arc::new(FlagRegistry::with_defaults());
/// let manager = ChunkClaimManager::new(Arc::clone(&registry));
/// let world = WorldId::new_random();
/// let owner = ActorId::new_random();
/// let key = WorldCell::new(world, GridCell::new(0, 0, 0));
///
/// let permissions = PermissionSet::new(Arc::clone(&registry));
/// assert_eq!(manager.create_claim(Owner::Player(owner), key, permissions.clone()), Ok(true));
/// assert_eq!(manager.create_claim(Owner::Player(owner), key, permissions), Ok(false));
///
/// let build = registry.get(defaults::BUILD).unwrap();
/// let inside = BlockPos::new(3, 4, 5);
/// assert_eq!(manager.can_perform_action(owner, world, inside, &build), Ok(true));
/// assert_eq!(manager.can_perform_action(ActorId::new_random(), world, inside, &build), Ok(false));
/// ```
#[derive(Debug)]
pub struct ChunkClaimManager {
    registry: Arc<FlagRegistry>,
    grid: SpatialGrid,
    index: RwLock<ChunkIndex>,
}

impl ChunkClaimManager {
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
            index: RwLock::new(ChunkIndex::default()),
        }
    }

    /// The flag registry permission sets must be built against.
    #[must_use]
    pub fn registry(&self) -> &Arc<FlagRegistry> {
        &self.registry
    }

    /// The grid used to map blocks to cells.
    #[must_use]
    pub const fn grid(&self) -> SpatialGrid {
        self.grid
    }

    /// Claims `key` for `owner`.
    ///
    /// Returns `Ok(false)` without changing anything if the cell is already
    /// claimed.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::RegistryMismatch`] if `permissions` was built
    /// against another registry.
    pub fn create_claim(
        &self,
        owner: Owner,
        key: WorldCell,
        permissions: PermissionSet,
    ) -> Result<bool, ClaimError> {
        self.check_registry(&permissions)?;

        let mut index = self.index.write();
        if index.claims.contains_key(&key) {
            debug!(cell = %key, "chunk already claimed");
            return Ok(false);
        }

        let claim = Arc::new(ChunkClaim::new(owner, key, permissions));
        debug!(cell = %key, owner = %owner, claim = %claim.id(), "chunk claimed");
        index.insert(claim);
        Ok(true)
    }

    /// Restores a previously persisted claim, keeping its id.
    ///
    /// Returns `Ok(false)` if its cell is already claimed.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::RegistryMismatch`] if the claim's permissions
    /// were built against another registry.
    pub fn restore_claim(&self, claim: ChunkClaim) -> Result<bool, ClaimError> {
        self.check_registry(claim.permissions())?;

        let mut index = self.index.write();
        if index.claims.contains_key(&claim.key()) {
            return Ok(false);
        }
        debug!(cell = %claim.key(), claim = %claim.id(), "chunk claim restored");
        index.insert(Arc::new(claim));
        Ok(true)
    }

    /// Unclaims `key`. Returns `false` if it was not claimed.
    pub fn remove_claim(&self, key: &WorldCell) -> bool {
        let removed = self.index.write().remove(key);
        if let Some(claim) = &removed {
            debug!(cell = %key, claim = %claim.id(), "chunk unclaimed");
        }
        removed.is_some()
    }

    /// The claim on `key`, if any.
    #[must_use]
    pub fn claim(&self, key: &WorldCell) -> Option<Arc<ChunkClaim>> {
        self.index.read().claims.get(key).cloned()
    }

    /// The claim on the cell containing `pos`, if any.
    #[must_use]
    pub fn claim_at(&self, world: WorldId, pos: BlockPos) -> Option<Arc<ChunkClaim>> {
        self.claim(&WorldCell::from_block(world, &self.grid, pos))
    }

    /// Checks if `key` is claimed.
    #[must_use]
    pub fn is_claimed(&self, key: &WorldCell) -> bool {
        self.index.read().claims.contains_key(key)
    }

    /// Checks if `actor` may perform `flag` at `pos`.
    ///
    /// Unclaimed cells allow everything.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::UnregisteredFlag`] if the flag is unknown, even
    /// in unclaimed cells.
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

    /// Replaces the permissions of the claim on `key`.
    ///
    /// Returns `Ok(false)` if `key` is not claimed.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::RegistryMismatch`] if `permissions` was built
    /// against another registry.
    pub fn update_flags(
        &self,
        key: &WorldCell,
        permissions: PermissionSet,
    ) -> Result<bool, ClaimError> {
        self.check_registry(&permissions)?;

        let mut index = self.index.write();
        let Some(slot) = index.claims.get_mut(key) else {
            return Ok(false);
        };
        *slot = Arc::new(slot.with_permissions(permissions));
        debug!(cell = %key, granted = ?slot.permissions().granted(), "chunk flags updated");
        Ok(true)
    }

    /// Hands the claim on `key` to `new_owner`.
    ///
    /// Returns `false` if `key` is not claimed.
    pub fn transfer_ownership(&self, key: &WorldCell, new_owner: Owner) -> bool {
        let mut index = self.index.write();
        let Some(claim) = index.claims.get(key).cloned() else {
            return false;
        };

        let old_owner = claim.owner();
        unlink(&mut index.by_owner, &old_owner.identity(), key);
        index
            .by_owner
            .entry(new_owner.identity())
            .or_default()
            .insert(*key);
        index
            .claims
            .insert(*key, Arc::new(claim.with_owner(new_owner)));

        debug!(cell = %key, from = %old_owner, to = %new_owner, "chunk ownership transferred");
        true
    }

    /// Removes every claim owned by `owner`. Returns how many were removed.
    pub fn remove_all_claims_by_owner(&self, owner: ActorId) -> usize {
        let keys = self.chunks_by_owner(owner);
        let removed = keys.iter().filter(|key| self.remove_claim(key)).count();
        if removed > 0 {
            info!(owner = %owner, removed, "removed all chunk claims of owner");
        }
        removed
    }

    /// Snapshot of the cells claimed by `owner`.
    #[must_use]
    pub fn chunks_by_owner(&self, owner: ActorId) -> Vec<WorldCell> {
        self.index
            .read()
            .by_owner
            .get(&owner)
            .map(|keys| keys.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the claimed cells in `world`.
    #[must_use]
    pub fn chunks_in_world(&self, world: WorldId) -> Vec<WorldCell> {
        self.index
            .read()
            .by_world
            .get(&world)
            .map(|keys| keys.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of claims owned by `owner`.
    #[must_use]
    pub fn chunk_count(&self, owner: ActorId) -> usize {
        self.index.read().by_owner.get(&owner).map_or(0, HashSet::len)
    }

    /// Snapshot of every claim.
    #[must_use]
    pub fn all_claims(&self) -> Vec<Arc<ChunkClaim>> {
        self.index.read().claims.values().cloned().collect()
    }

    /// Number of claimed cells across all worlds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.read().claims.len()
    }

    /// Returns `true` if nothing is claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.read().claims.is_empty()
    }

    /// Drops every claim.
    pub fn clear_all(&self) {
        let mut index = self.index.write();
        let dropped = index.claims.len();
        *index = ChunkIndex::default();
        info!(dropped, "cleared all chunk claims");
    }

    fn check_registry(&self, permissions: &PermissionSet) -> Result<(), ClaimError> {
        if permissions.uses_registry(&self.registry) {
            Ok(())
        } else {
            Err(ClaimError::RegistryMismatch)
        }
    }
}
