//! Per-claim permission bits.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::ClaimError;
use crate::flags::{FlagId, FlagRegistry};

const WORD_BITS: usize = u64::BITS as usize;

/// The flags a claim grants to non-owners.
///
/// A bit vector indexed by the registration order of a [`FlagRegistry`]. Every
/// flag starts denied. The set keeps a handle to the registry it was built
/// against; managers reject sets built against any other registry.
///
/// Claims are immutable values, so updating a claim's permissions means
/// building a new set and swapping in a new claim.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use claim_index::{FlagRegistry, PermissionSet};
///
/// let registry = Arc::new(FlagRegistry::new());
/// let build = registry.register("build").unwrap();
/// let pvp = registry.register("pvp").unwrap();
///
/// let mut permissions = PermissionSet::new(Arc::clone(&registry));
/// assert_eq!(permissions.allows(&build), Ok(false));
///
/// permissions.allow(&build).unwrap();
/// assert_eq!(permissions.allows(&build), Ok(true));
/// assert_eq!(permissions.allows(&pvp), Ok(false));
///
/// permissions.deny(&build).unwrap();
/// assert!(permissions.is_empty());
/// ```
#[derive(Clone)]
pub struct PermissionSet {
    registry: Arc<FlagRegistry>,
    words: SmallVec<[u64; 1]>,
}

impl PermissionSet {
    /// Creates a set with every flag denied.
    #[must_use]
    pub fn new(registry: Arc<FlagRegistry>) -> Self {
        Self {
            registry,
            words: SmallVec::new(),
        }
    }

    /// Creates a set with the given flags allowed.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::UnregisteredFlag`] for the first flag the
    /// registry does not know.
    pub fn with_allowed<'a, I>(registry: Arc<FlagRegistry>, flags: I) -> Result<Self, ClaimError>
    where
        I: IntoIterator<Item = &'a FlagId>,
    {
        let mut set = Self::new(registry);
        for flag in flags {
            set.allow(flag)?;
        }
        Ok(set)
    }

    /// The registry this set's bit positions come from.
    #[must_use]
    pub fn registry(&self) -> &Arc<FlagRegistry> {
        &self.registry
    }

    /// Checks if this set was built against `registry`.
    #[must_use]
    pub fn uses_registry(&self, registry: &Arc<FlagRegistry>) -> bool {
        Arc::ptr_eq(&self.registry, registry)
    }

    /// Grants a flag.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::UnregisteredFlag`] if the flag is unknown.
    pub fn allow(&mut self, flag: &FlagId) -> Result<(), ClaimError> {
        self.set(flag, true)
    }

    /// Revokes a flag.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::UnregisteredFlag`] if the flag is unknown.
    pub fn deny(&mut self, flag: &FlagId) -> Result<(), ClaimError> {
        self.set(flag, false)
    }

    /// Grants or revokes a flag.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::UnregisteredFlag`] if the flag is unknown.
    pub fn set(&mut self, flag: &FlagId, allowed: bool) -> Result<(), ClaimError> {
        let index = self.registry.index_of(flag)?;
        let (word, mask) = (index / WORD_BITS, 1u64 << (index % WORD_BITS));

        if allowed {
            if word >= self.words.len() {
                self.words.resize(word + 1, 0);
            }
            self.words[word] |= mask;
        } else if let Some(bits) = self.words.get_mut(word) {
            *bits &= !mask;
        }
        Ok(())
    }

    /// Checks if a flag is granted. Unset flags are denied.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::UnregisteredFlag`] if the flag is unknown.
    pub fn allows(&self, flag: &FlagId) -> Result<bool, ClaimError> {
        let index = self.registry.index_of(flag)?;
        Ok(self.bit(index))
    }

    /// Returns `true` if no flag is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    /// The granted flags, in registration order.
    #[must_use]
    pub fn granted(&self) -> Vec<FlagId> {
        self.registry
            .all()
            .into_iter()
            .enumerate()
            .filter(|&(index, _)| self.bit(index))
            .map(|(_, flag)| flag)
            .collect()
    }

    /// Copy of the raw bit words, least significant bit first, without
    /// trailing zero words.
    #[must_use]
    pub fn bits(&self) -> Vec<u64> {
        let len = self
            .words
            .iter()
            .rposition(|&word| word != 0)
            .map_or(0, |last| last + 1);
        self.words[..len].to_vec()
    }

    fn bit(&self, index: usize) -> bool {
        self.words
            .get(index / WORD_BITS)
            .is_some_and(|word| word & (1u64 << (index % WORD_BITS)) != 0)
    }
}

impl PartialEq for PermissionSet {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry) && self.bits() == other.bits()
    }
}

impl Eq for PermissionSet {}

impl std::fmt::Debug for PermissionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionSet")
            .field("granted", &self.granted())
            .finish()
    }
}
