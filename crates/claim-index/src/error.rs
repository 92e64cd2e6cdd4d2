//! Error types for claim indexing.
//!
//! Every variant here is a caller bug, such as a flag the registry never saw
//! or a claim id indexed twice. Ordinary outcomes such as an overlapping
//! claim or a missing key are reported through `bool` / `Option` return
//! values instead.

use crate::flags::FlagId;
use crate::ids::{ClaimId, WorldId};

/// Errors that indicate misuse of the claim index API.
///
/// # Example
///
/// ```
/// use claim_index::{ClaimError, FlagId, FlagRegistry};
///
/// let registry = FlagRegistry::new();
/// let flag = FlagId::new("build").unwrap();
///
/// let err = registry.index_of(&flag).unwrap_err();
/// assert!(matches!(err, ClaimError::UnregisteredFlag(_)));
/// assert!(err.to_string().contains("build"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ClaimError {
    /// A flag id was empty or whitespace only.
    #[error("flag id must not be blank")]
    BlankFlagId,

    /// A flag was used before being registered.
    ///
    /// This means the caller and the registry disagree on the flag catalogue,
    /// usually because registration was skipped during startup.
    #[error("flag not registered: {0}")]
    UnregisteredFlag(FlagId),

    /// A permission set was built against a different registry than the one
    /// the manager holds, so its bit positions cannot be trusted.
    #[error("permission set belongs to a different flag registry")]
    RegistryMismatch,

    /// A claim reused the id of a claim that is already indexed.
    ///
    /// Ids identify claims for removal, so two indexed claims may never
    /// share one.
    #[error("claim id already indexed: {0}")]
    DuplicateClaimId(ClaimId),

    /// A claim was handed to an index that serves another world.
    #[error("claim belongs to world {actual}, index serves world {expected}")]
    WorldMismatch {
        /// The world served by the index.
        expected: WorldId,
        /// The world named by the claim.
        actual: WorldId,
    },
}
