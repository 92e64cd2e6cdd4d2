//! In-memory index of land claims over a block world.
//!
//! Answers "who owns this block, and may this actor do that here" for three
//! claim shapes, while keeping claims of one shape from overlapping:
//!
//! - [`ChunkClaimManager`] - one claim per `(world, grid cell)`
//! - [`AreaClaimManager`] - free-form regions, resolved by priority
//! - [`PlotClaimIndex`] - regions nested inside another claim, per world
//!
//! Permissions are bit sets ([`PermissionSet`]) over flags registered at
//! runtime in a [`FlagRegistry`]. Owners always pass; everyone else needs the
//! flag's bit. Blocks outside every claim are wilderness and allow everything.
//!
//! # Errors
//!
//! Rejected or missing claims are normal outcomes and come back as `bool` or
//! `Option`. [`ClaimError`] is reserved for caller bugs such as an
//! unregistered flag.
//!
//! # Concurrency
//!
//! Managers are `Send + Sync`. Reads run concurrently with each other and
//! with a writer. Mutations on one manager are expected to come from a single
//! writer at a time: two concurrent creates of overlapping area claims may
//! both pass the overlap test.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use claim_index::{
//!     ActorId, AreaClaim, AreaClaimManager, FlagRegistry, Owner, PermissionSet, WorldId,
//!     flags::defaults,
//! };
//! use claim_spatial::{BlockPos, Region};
//!
//! let registry = Arc::new(FlagRegistry::with_defaults());
//! let areas = AreaClaimManager::new(Arc::clone(&registry));
//!
//! let world = WorldId::new_random();
//! let owner = ActorId::new_random();
//! let interact = registry.get(defaults::INTERACT).unwrap();
//! let build = registry.get(defaults::BUILD).unwrap();
//!
//! let town = AreaClaim::new(
//!     world,
//!     Owner::Group(owner),
//!     Region::from_bounds([0, 0, 0], [99, 255, 99]),
//!     PermissionSet::with_allowed(Arc::clone(&registry), [&interact]).unwrap(),
//!     0,
//! );
//! assert_eq!(areas.create_claim(town), Ok(true));
//!
//! let visitor = ActorId::new_random();
//! let square = BlockPos::new(50, 64, 50);
//! assert_eq!(areas.can_perform_action(visitor, world, square, &interact), Ok(true));
//! assert_eq!(areas.can_perform_action(visitor, world, square, &build), Ok(false));
//! assert_eq!(areas.can_perform_action(owner, world, square, &build), Ok(true));
//!
//! // Outside the town
//! let field = BlockPos::new(500, 64, 500);
//! assert_eq!(areas.can_perform_action(visitor, world, field, &build), Ok(true));
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod area_manager;
mod bucket;
mod chunk_manager;
mod claim;
mod error;
pub mod flags;
mod ids;
mod owner;
mod permissions;
mod plot_index;

pub use area_manager::AreaClaimManager;
pub use chunk_manager::ChunkClaimManager;
pub use claim::{
    AreaClaim, BoundedClaim, ChunkClaim, Claim, ClaimKind, ParentRef, PlotClaim, WorldCell,
};
pub use error::ClaimError;
pub use flags::{FlagId, FlagRegistry};
pub use ids::{ActorId, ClaimId, WorldId};
pub use owner::Owner;
pub use permissions::PermissionSet;
pub use plot_index::PlotClaimIndex;
