//! Claim owners.

use crate::ids::ActorId;

/// Who owns a claim: a single player or a group.
///
/// Ownership is an identity test only. Group membership is resolved by the
/// host; to the index a group owner is just another id.
///
/// # Example
///
/// ```
/// use claim_index::{ActorId, Owner};
///
/// let player = ActorId::new_random();
/// let owner = Owner::Player(player);
///
/// assert_eq!(owner.identity(), player);
/// assert!(owner.is_owner(player));
/// assert!(!owner.is_owner(ActorId::new_random()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Owner {
    /// Owned by one player.
    Player(ActorId),
    /// Owned by a group (guild, town, faction...).
    Group(ActorId),
}

impl Owner {
    /// The id of the owning player or group.
    #[must_use]
    pub const fn identity(&self) -> ActorId {
        match self {
            Self::Player(id) | Self::Group(id) => *id,
        }
    }

    /// Checks if `candidate` is this owner.
    #[must_use]
    pub fn is_owner(&self, candidate: ActorId) -> bool {
        self.identity() == candidate
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Player(id) => write!(f, "player:{id}"),
            Self::Group(id) => write!(f, "group:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let id = ActorId::new_random();
        assert_eq!(Owner::Player(id).identity(), id);
        assert_eq!(Owner::Group(id).identity(), id);
    }

    #[test]
    fn test_group_is_owner_only_by_identity() {
        let group = ActorId::new_random();
        let member = ActorId::new_random();
        let owner = Owner::Group(group);
        assert!(owner.is_owner(group));
        assert!(!owner.is_owner(member));
    }

    #[test]
    fn test_display_tags_kind() {
        let id = ActorId::new_random();
        assert_eq!(Owner::Player(id).to_string(), format!("player:{id}"));
        assert_eq!(Owner::Group(id).to_string(), format!("group:{id}"));
    }
}
