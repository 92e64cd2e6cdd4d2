//! Named permission flags and the registry that assigns their bit positions.
//!
//! Flags are not a fixed enum: the host (and its plugins) register the names
//! they need at startup. The first registration of a name claims the next free
//! bit position; later registrations of the same name return the original
//! handle. Bit positions are only stable for the lifetime of one registry and
//! are never persisted.
//!
//! A registry is an explicit value, normally shared as `Arc<FlagRegistry>`
//! between the managers and the permission sets they accept. Independent
//! registries (e.g. one per test) never interfere with each other.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::error::ClaimError;

/// Names of the flags registered by [`FlagRegistry::with_defaults`], in
/// registration order.
pub mod defaults {
    /// Placing blocks.
    pub const BUILD: &str = "build";
    /// Breaking blocks.
    pub const BREAK: &str = "break";
    /// Using doors, buttons, levers and similar.
    pub const INTERACT: &str = "interact";
    /// Opening storage.
    pub const CONTAINERS: &str = "containers";
    /// Player-versus-player combat.
    pub const PVP: &str = "pvp";
    /// Explosion damage.
    pub const EXPLOSIONS: &str = "explosions";
    /// Projectile damage.
    pub const PROJECTILES: &str = "projectiles";

    /// All default flags, in bit order.
    pub const ALL: [&str; 7] = [
        BUILD,
        BREAK,
        INTERACT,
        CONTAINERS,
        PVP,
        EXPLOSIONS,
        PROJECTILES,
    ];
}

/// A non-blank permission flag name.
///
/// Cloning is cheap (the name is reference counted). Equality and hashing use
/// the name only, so a `FlagId` built by hand matches the registered one.
///
/// # Example
///
/// ```
/// use claim_index::{ClaimError, FlagId};
///
/// let flag = FlagId::new("build").unwrap();
/// assert_eq!(flag.as_str(), "build");
///
/// assert_eq!(FlagId::new("  "), Err(ClaimError::BlankFlagId));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlagId(Arc<str>);

impl FlagId {
    /// Creates a flag id.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::BlankFlagId`] if `id` is empty or whitespace.
    pub fn new(id: &str) -> Result<Self, ClaimError> {
        if id.trim().is_empty() {
            return Err(ClaimError::BlankFlagId);
        }
        Ok(Self(Arc::from(id)))
    }

    /// The flag name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FlagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for FlagId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for FlagId {
    type Error = ClaimError;

    fn try_from(id: &str) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for FlagId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for FlagId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Self::new(&id).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    index_by_id: HashMap<FlagId, usize>,
    flags: Vec<FlagId>,
}

/// Catalogue of permission flags, assigning each a stable bit position.
///
/// Registration takes a write lock; lookups take a read lock and never block
/// each other.
///
/// # Example
///
/// ```
/// use claim_index::FlagRegistry;
///
/// let registry = FlagRegistry::new();
/// let build = registry.register("build").unwrap();
/// let fly = registry.register("fly").unwrap();
///
/// assert_eq!(registry.index_of(&build), Ok(0));
/// assert_eq!(registry.index_of(&fly), Ok(1));
///
/// // Registering again keeps the original position
/// let again = registry.register("build").unwrap();
/// assert_eq!(registry.index_of(&again), Ok(0));
/// assert_eq!(registry.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct FlagRegistry {
    state: RwLock<RegistryState>,
}

impl FlagRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the [`defaults`] flags registered, in order.
    ///
    /// # Example
    ///
    /// ```
    /// use claim_index::{FlagRegistry, flags::defaults};
    ///
    /// let registry = FlagRegistry::with_defaults();
    /// let pvp = registry.get(defaults::PVP).unwrap();
    /// assert_eq!(registry.index_of(&pvp), Ok(4));
    /// ```
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        // Default names are non-blank literals.
        for id in defaults::ALL {
            registry.register_flag(FlagId(Arc::from(id)));
        }
        registry
    }

    /// Registers a flag by name.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::BlankFlagId`] if `id` is blank.
    pub fn register(&self, id: &str) -> Result<FlagId, ClaimError> {
        Ok(self.register_flag(FlagId::new(id)?))
    }

    /// Registers a flag, returning the registry's handle for it.
    ///
    /// Idempotent: a flag that is already known keeps its bit position.
    pub fn register_flag(&self, flag: FlagId) -> FlagId {
        let mut state = self.state.write();
        if let Some((existing, _)) = state.index_by_id.get_key_value(&flag) {
            return existing.clone();
        }

        let index = state.flags.len();
        state.index_by_id.insert(flag.clone(), index);
        state.flags.push(flag.clone());
        tracing::debug!(flag = %flag, index, "registered claim flag");
        flag
    }

    /// Returns the bit position of a flag.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::UnregisteredFlag`] if the flag was never
    /// registered with this registry.
    pub fn index_of(&self, flag: &FlagId) -> Result<usize, ClaimError> {
        self.state
            .read()
            .index_by_id
            .get(flag)
            .copied()
            .ok_or_else(|| ClaimError::UnregisteredFlag(flag.clone()))
    }

    /// Looks up a registered flag by name.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<FlagId> {
        self.state
            .read()
            .index_by_id
            .get_key_value(id)
            .map(|(flag, _)| flag.clone())
    }

    /// Returns the flag at a bit position.
    #[must_use]
    pub fn flag_at(&self, index: usize) -> Option<FlagId> {
        self.state.read().flags.get(index).cloned()
    }

    /// Checks if a flag is registered.
    #[must_use]
    pub fn contains(&self, flag: &FlagId) -> bool {
        self.state.read().index_by_id.contains_key(flag)
    }

    /// Snapshot of every registered flag, in bit order.
    #[must_use]
    pub fn all(&self) -> Vec<FlagId> {
        self.state.read().flags.clone()
    }

    /// Number of registered flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().flags.len()
    }

    /// Returns `true` if no flag has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().flags.is_empty()
    }
}
