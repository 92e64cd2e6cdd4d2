//! End-to-end scenarios for the claim managers.
//!
//! Organized by concern:
//!
//! - Resolution: point lookups and priority
//! - Lifecycle: create, remove, transfer and bulk removal
//! - Permissions: owner, visitor and wilderness checks
//! - Concurrency: readers running against a single writer

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::HashSet;
use std::sync::Arc;

use claim_index::{
    ActorId, AreaClaim, AreaClaimManager, BoundedClaim, ChunkClaimManager, Claim, ClaimError,
    ClaimId, ClaimKind, FlagId, FlagRegistry, Owner, ParentRef, PermissionSet, PlotClaim,
    PlotClaimIndex, WorldCell, WorldId, flags::defaults,
};
use claim_spatial::{BlockPos, GridCell, Region, SpatialGrid};

struct World {
    registry: Arc<FlagRegistry>,
    id: WorldId,
}

impl World {
    fn new() -> Self {
        Self {
            registry: Arc::new(FlagRegistry::with_defaults()),
            id: WorldId::new_random(),
        }
    }

    fn flag(&self, id: &str) -> FlagId {
        self.registry.get(id).unwrap()
    }

    fn permissions(&self, allowed: &[&str]) -> PermissionSet {
        let flags: Vec<_> = allowed.iter().map(|id| self.flag(id)).collect();
        PermissionSet::with_allowed(Arc::clone(&self.registry), &flags).unwrap()
    }

    fn areas(&self) -> AreaClaimManager {
        AreaClaimManager::with_grid(Arc::clone(&self.registry), SpatialGrid::new(32))
    }

    fn area(&self, owner: ActorId, min: [i32; 3], max: [i32; 3], priority: i32) -> Arc<AreaClaim> {
        Arc::new(AreaClaim::new(
            self.id,
            Owner::Player(owner),
            Region::from_bounds(min, max),
            self.permissions(&[]),
            priority,
        ))
    }
}

// =============================================================================
// Resolution
// =============================================================================

mod resolution {
    use super::*;

    #[test]
    fn area_scenario_on_32_block_grid() {
        let world = World::new();
        let areas = world.areas();
        let owner = ActorId::new_random();

        let a = world.area(owner, [0, 0, 0], [31, 31, 31], 0);
        assert_eq!(areas.create_claim(Arc::clone(&a)), Ok(true));

        let found = areas.claim_at(world.id, BlockPos::new(5, 10, 2)).unwrap();
        assert_eq!(found.id(), a.id());
        assert!(areas.claim_at(world.id, BlockPos::new(32, 0, 0)).is_none());

        let b = world.area(owner, [16, 0, 0], [48, 0, 0], 0);
        assert_eq!(areas.create_claim(b), Ok(false));

        let b_prime = world.area(owner, [32, 0, 0], [63, 0, 0], 0);
        assert_eq!(areas.create_claim(Arc::clone(&b_prime)), Ok(true));
        assert_eq!(
            areas.claim_at(world.id, BlockPos::new(40, 0, 0)).unwrap().id(),
            b_prime.id()
        );
        assert_eq!(areas.len(), 2);
    }

    #[test]
    fn higher_priority_plot_wins() {
        let world = World::new();
        let plots = PlotClaimIndex::with_grid(
            world.id,
            Arc::clone(&world.registry),
            SpatialGrid::new(32),
        );
        let parent = ParentRef::new(ClaimKind::Area, ClaimId::new_random());
        let plot = |min, max, priority| {
            PlotClaim::new(
                world.id,
                Owner::Player(ActorId::new_random()),
                Region::from_bounds(min, max),
                world.permissions(&[]),
                priority,
                parent,
            )
        };

        let low = Arc::new(plot([0, 0, 0], [9, 9, 9], 1));
        let high = Arc::new(plot([10, 0, 0], [19, 9, 9], 7));
        plots.add(Arc::clone(&low)).unwrap();
        plots.add(Arc::clone(&high)).unwrap();

        assert_eq!(plots.get_at(BlockPos::new(15, 5, 5)).unwrap().priority(), 7);
        assert_eq!(plots.get_at(BlockPos::new(5, 5, 5)).unwrap().id(), low.id());
    }

    #[test]
    fn chunk_lookup_by_block() {
        let world = World::new();
        let chunks = ChunkClaimManager::with_grid(Arc::clone(&world.registry), SpatialGrid::new(16));
        let key = WorldCell::new(world.id, GridCell::new(2, 4, -1));
        chunks
            .create_claim(Owner::Player(ActorId::new_random()), key, world.permissions(&[]))
            .unwrap();

        assert!(chunks.claim_at(world.id, BlockPos::new(32, 64, -16)).is_some());
        assert!(chunks.claim_at(world.id, BlockPos::new(47, 79, -1)).is_some());
        assert!(chunks.claim_at(world.id, BlockPos::new(48, 64, -16)).is_none());
        assert!(chunks.claim_at(world.id, BlockPos::new(32, 64, 0)).is_none());
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn removed_area_leaves_no_trace() {
        let world = World::new();
        let areas = world.areas();
        let owner = ActorId::new_random();
        let claim = world.area(owner, [-50, 0, -50], [50, 10, 50], 0);

        areas.create_claim(Arc::clone(&claim)).unwrap();
        assert!(areas.remove_claim(&claim));

        for pos in [
            BlockPos::new(-50, 0, -50),
            BlockPos::new(0, 5, 0),
            BlockPos::new(50, 10, 50),
        ] {
            assert!(areas.claim_at(world.id, pos).is_none());
        }
        assert!(areas.all_claims().is_empty());
        assert!(areas.is_empty());

        // The same region is free again
        assert_eq!(
            areas.create_claim(world.area(owner, [-50, 0, -50], [50, 10, 50], 0)),
            Ok(true)
        );
    }

    #[test]
    fn create_then_remove_restores_previous_state() {
        let world = World::new();
        let areas = world.areas();
        let owner = ActorId::new_random();
        let kept = world.area(owner, [0, 0, 0], [20, 20, 20], 3);
        areas.create_claim(Arc::clone(&kept)).unwrap();

        let point = BlockPos::new(30, 5, 5);
        let before = areas.claim_at(world.id, point).map(|c| c.id());

        let temp = world.area(owner, [21, 0, 0], [70, 20, 20], 9);
        areas.create_claim(Arc::clone(&temp)).unwrap();
        assert!(areas.remove_claim(&temp));

        assert_eq!(areas.claim_at(world.id, point).map(|c| c.id()), before);
        assert_eq!(areas.len(), 1);
        assert_eq!(
            areas.claim_at(world.id, BlockPos::new(10, 10, 10)).unwrap().id(),
            kept.id()
        );
    }

    #[test]
    fn remove_all_claims_by_owner_counts_exactly() {
        let world = World::new();
        let chunks = ChunkClaimManager::new(Arc::clone(&world.registry));
        let owner = ActorId::new_random();
        let neighbour = ActorId::new_random();

        for x in 0..7 {
            let key = WorldCell::new(world.id, GridCell::new(x, 0, 0));
            chunks
                .create_claim(Owner::Player(owner), key, world.permissions(&[]))
                .unwrap();
        }
        let theirs = WorldCell::new(world.id, GridCell::new(0, 0, 1));
        chunks
            .create_claim(Owner::Player(neighbour), theirs, world.permissions(&[]))
            .unwrap();

        assert_eq!(chunks.remove_all_claims_by_owner(owner), 7);
        assert_eq!(chunks.remove_all_claims_by_owner(owner), 0);
        assert_eq!(chunks.chunk_count(owner), 0);
        assert_eq!(chunks.chunks_by_owner(neighbour), vec![theirs]);
    }

    #[test]
    fn transfer_then_bulk_remove_follows_new_owner() {
        let world = World::new();
        let chunks = ChunkClaimManager::new(Arc::clone(&world.registry));
        let seller = ActorId::new_random();
        let guild = ActorId::new_random();
        let key = WorldCell::new(world.id, GridCell::new(0, 0, 0));

        chunks
            .create_claim(Owner::Player(seller), key, world.permissions(&[]))
            .unwrap();
        assert!(chunks.transfer_ownership(&key, Owner::Group(guild)));

        assert_eq!(chunks.remove_all_claims_by_owner(seller), 0);
        assert_eq!(chunks.remove_all_claims_by_owner(guild), 1);
        assert!(!chunks.is_claimed(&key));
    }

    #[test]
    fn plots_survive_parent_removal() {
        let world = World::new();
        let areas = world.areas();
        let plots = PlotClaimIndex::new(world.id, Arc::clone(&world.registry));

        let town = world.area(ActorId::new_random(), [0, 0, 0], [100, 100, 100], 0);
        areas.create_claim(Arc::clone(&town)).unwrap();

        let shop = Arc::new(PlotClaim::new(
            world.id,
            Owner::Player(ActorId::new_random()),
            Region::from_bounds([10, 60, 10], [15, 70, 15]),
            world.permissions(&[]),
            0,
            ParentRef::to(town.as_ref()),
        ));
        plots.add(Arc::clone(&shop)).unwrap();

        assert!(areas.remove_claim(&town));
        let found = plots.get_at(BlockPos::new(12, 65, 12)).unwrap();
        assert_eq!(found.parent().id, town.id());
        assert!(found.is_area_plot());
    }

    #[test]
    fn reused_claim_id_never_reaches_either_index() {
        let world = World::new();
        let owner = ActorId::new_random();

        let areas = world.areas();
        let first = world.area(owner, [0, 0, 0], [40, 0, 0], 0);
        let twin = AreaClaim::clone(&world.area(owner, [41, 0, 0], [80, 0, 0], 0))
            .with_id(first.id());
        areas.create_claim(Arc::clone(&first)).unwrap();
        assert_eq!(
            areas.create_claim(twin.clone()),
            Err(ClaimError::DuplicateClaimId(first.id()))
        );
        assert_eq!(areas.len(), 1);
        assert!(!areas.remove_claim(&twin));
        assert!(areas.remove_claim(&first));
        assert!(areas.is_empty());
        assert!(areas.claim_at(world.id, BlockPos::new(60, 0, 0)).is_none());

        let plots = PlotClaimIndex::new(world.id, Arc::clone(&world.registry));
        let parent = ParentRef::new(ClaimKind::Area, ClaimId::new_random());
        let plot = |min, max| {
            PlotClaim::new(
                world.id,
                Owner::Player(owner),
                Region::from_bounds(min, max),
                world.permissions(&[]),
                0,
                parent,
            )
        };
        let first = Arc::new(plot([0, 0, 0], [40, 0, 0]));
        let twin = plot([41, 0, 0], [80, 0, 0]).with_id(first.id());
        plots.add(Arc::clone(&first)).unwrap();
        assert_eq!(
            plots.add(twin.clone()),
            Err(ClaimError::DuplicateClaimId(first.id()))
        );
        assert_eq!(plots.len(), 1);
        assert_eq!(plots.remove(&twin), Ok(false));
        assert_eq!(plots.remove(&first), Ok(true));
        assert!(plots.is_empty());
        assert!(plots.get_at(BlockPos::new(60, 0, 0)).is_none());
    }
}

// =============================================================================
// Permissions
// =============================================================================

mod permissions {
    use super::*;

    #[test]
    fn owner_visitor_and_wilderness() {
        let world = World::new();
        let areas = world.areas();
        let owner = ActorId::new_random();
        let visitor = ActorId::new_random();

        let farm = AreaClaim::new(
            world.id,
            Owner::Player(owner),
            Region::from_bounds([0, 0, 0], [15, 15, 15]),
            world.permissions(&[defaults::INTERACT]),
            0,
        );
        areas.create_claim(farm).unwrap();

        let inside = BlockPos::new(8, 8, 8);
        let outside = BlockPos::new(16, 8, 8);
        for flag in world.registry.all() {
            assert_eq!(areas.can_perform_action(owner, world.id, inside, &flag), Ok(true));
            assert_eq!(areas.can_perform_action(visitor, world.id, outside, &flag), Ok(true));

            let expected = flag.as_str() == defaults::INTERACT;
            assert_eq!(
                areas.can_perform_action(visitor, world.id, inside, &flag),
                Ok(expected)
            );
        }
    }

    #[test]
    fn runtime_flag_is_usable_after_registration() {
        let world = World::new();
        let chunks = ChunkClaimManager::new(Arc::clone(&world.registry));
        let owner = ActorId::new_random();
        let visitor = ActorId::new_random();
        let key = WorldCell::new(world.id, GridCell::new(0, 0, 0));
        chunks
            .create_claim(Owner::Player(owner), key, world.permissions(&[]))
            .unwrap();

        let fly = FlagId::new("fly").unwrap();
        let inside = BlockPos::new(1, 1, 1);
        assert_eq!(
            chunks.can_perform_action(visitor, world.id, inside, &fly),
            Err(ClaimError::UnregisteredFlag(fly.clone()))
        );

        let fly = world.registry.register("fly").unwrap();
        assert_eq!(chunks.can_perform_action(visitor, world.id, inside, &fly), Ok(false));

        let mut opened = world.permissions(&[]);
        opened.allow(&fly).unwrap();
        assert_eq!(chunks.update_flags(&key, opened), Ok(true));
        assert_eq!(chunks.can_perform_action(visitor, world.id, inside, &fly), Ok(true));
    }

    #[test]
    fn registering_twice_keeps_position() {
        let registry = FlagRegistry::with_defaults();
        let before = registry.get(defaults::CONTAINERS).unwrap();
        let again = registry.register(defaults::CONTAINERS).unwrap();
        assert_eq!(registry.index_of(&before), registry.index_of(&again));
        assert_eq!(registry.len(), defaults::ALL.len());
    }
}

// =============================================================================
// Concurrency
// =============================================================================

mod concurrency {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[test]
    fn readers_never_see_torn_area_index() {
        let world = World::new();
        let areas = world.areas();
        let owner = ActorId::new_random();
        let done = AtomicBool::new(false);

        let claims: Vec<_> = (0..64)
            .map(|i| world.area(owner, [i * 20, 0, 0], [i * 20 + 19, 40, 40], 0))
            .collect();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while !done.load(Ordering::Acquire) {
                        for i in 0..64 {
                            let pos = BlockPos::new(i * 20 + 10, 20, 20);
                            if let Some(found) = areas.claim_at(world.id, pos) {
                                assert!(found.contains(pos));
                                assert_eq!(found.owner().identity(), owner);
                            }
                        }
                    }
                });
            }

            scope.spawn(|| {
                for _ in 0..10 {
                    for claim in &claims {
                        assert_eq!(areas.create_claim(Arc::clone(claim)), Ok(true));
                    }
                    for claim in &claims {
                        assert!(areas.remove_claim(claim));
                    }
                }
                done.store(true, Ordering::Release);
            });
        });

        assert!(areas.is_empty());
    }

    #[test]
    fn chunk_indexes_agree_under_concurrent_reads() {
        let world = World::new();
        let chunks = ChunkClaimManager::new(Arc::clone(&world.registry));
        let owner = ActorId::new_random();
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while !done.load(Ordering::Acquire) {
                        let by_owner = chunks.chunks_by_owner(owner);
                        for key in by_owner {
                            // Removal may land between the two reads
                            if let Some(claim) = chunks.claim(&key) {
                                assert_eq!(claim.key(), key);
                            }
                        }
                    }
                });
            }

            scope.spawn(|| {
                for round in 0..20 {
                    for x in 0..32 {
                        let key = WorldCell::new(world.id, GridCell::new(x, round, 0));
                        chunks
                            .create_claim(Owner::Player(owner), key, world.permissions(&[]))
                            .unwrap();
                    }
                    assert_eq!(chunks.remove_all_claims_by_owner(owner), 32);
                }
                done.store(true, Ordering::Release);
            });
        });

        assert!(chunks.is_empty());
    }

    #[test]
    fn claimed_chunks_are_listed_under_their_owner() {
        let world = World::new();
        let chunks = ChunkClaimManager::new(Arc::clone(&world.registry));
        let owner = ActorId::new_random();
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while !done.load(Ordering::Acquire) {
                        // Claims are only added here, so anything in the first
                        // snapshot must still be listed by the second.
                        let claimed = chunks.all_claims();
                        let listed: HashSet<WorldCell> =
                            chunks.chunks_by_owner(owner).into_iter().collect();
                        for claim in claimed {
                            assert!(listed.contains(&claim.key()), "{} not listed", claim.key());
                        }
                    }
                });
            }

            scope.spawn(|| {
                for round in 0..20 {
                    for x in 0..32 {
                        let key = WorldCell::new(world.id, GridCell::new(x, round, 0));
                        assert_eq!(
                            chunks.create_claim(Owner::Player(owner), key, world.permissions(&[])),
                            Ok(true)
                        );
                    }
                }
                done.store(true, Ordering::Release);
            });
        });

        assert_eq!(chunks.len(), 640);
        assert_eq!(chunks.chunks_by_owner(owner).len(), 640);
    }
}
