//! Cell-bucketed storage shared by the area manager and the plot index.
//!
//! Each bucket is an immutable `Arc<[Arc<C>]>`. Writers build a new slice and
//! swap it into the map under the shard lock; readers clone the `Arc` out and
//! iterate with no lock held, so a reader sees either the old or the new
//! bucket, never a half-written one.

use std::hash::Hash;
use std::sync::Arc;

use claim_spatial::BlockPos;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use hashbrown::HashSet;

use crate::claim::BoundedClaim;
use crate::ids::ClaimId;

type Bucket<C> = Arc<[Arc<C>]>;

/// Claims indexed under every cell their region touches.
///
/// `by_id` holds each published claim once. Ids are unique within one
/// `ClaimBuckets`; the managers reject a second claim with a known id.
pub(crate) struct ClaimBuckets<K, C> {
    buckets: DashMap<K, Bucket<C>>,
    by_id: DashMap<ClaimId, Arc<C>>,
}

impl<K: Eq + Hash, C> Default for ClaimBuckets<K, C> {
    fn default() -> Self {
        Self {
            buckets: DashMap::new(),
            by_id: DashMap::new(),
        }
    }
}

impl<K, C> ClaimBuckets<K, C>
where
    K: Eq + Hash + Copy,
    C: BoundedClaim + PartialEq,
{
    /// Snapshot of one bucket.
    pub(crate) fn bucket(&self, key: &K) -> Option<Bucket<C>> {
        self.buckets.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Checks if a claim with `id` is indexed.
    pub(crate) fn contains_id(&self, id: ClaimId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// First indexed claim under `keys` whose region intersects `claim`.
    ///
    /// A claim stored in several of the buckets is tested once.
    pub(crate) fn find_overlap<I>(&self, keys: I, claim: &C) -> Option<Arc<C>>
    where
        I: IntoIterator<Item = K>,
    {
        let mut tested = HashSet::new();
        for key in keys {
            let Some(bucket) = self.bucket(&key) else {
                continue;
            };
            for candidate in bucket.iter() {
                if tested.insert(candidate.id()) && candidate.intersects(claim) {
                    return Some(Arc::clone(candidate));
                }
            }
        }
        None
    }

    /// Appends `claim` to the bucket of every key, creating buckets on demand.
    ///
    /// The caller has checked that the id is not indexed yet.
    pub(crate) fn publish<I>(&self, keys: I, claim: &Arc<C>)
    where
        I: IntoIterator<Item = K>,
    {
        self.by_id.insert(claim.id(), Arc::clone(claim));
        for key in keys {
            self.buckets
                .entry(key)
                .and_modify(|bucket| {
                    *bucket = bucket
                        .iter()
                        .cloned()
                        .chain(std::iter::once(Arc::clone(claim)))
                        .collect();
                })
                .or_insert_with(|| Arc::from([Arc::clone(claim)]));
        }
    }

    /// Removes `claim` from the bucket of every key.
    ///
    /// Only an indexed claim equal to `claim` in every field is removed; a
    /// different claim that happens to share the id stays untouched. Buckets
    /// left empty are dropped. Returns `true` if the claim was indexed.
    pub(crate) fn retract<I>(&self, keys: I, claim: &C) -> bool
    where
        I: IntoIterator<Item = K>,
    {
        let id = claim.id();
        if self
            .by_id
            .remove_if(&id, |_, stored| **stored == *claim)
            .is_none()
        {
            return false;
        }

        for key in keys {
            let Entry::Occupied(mut entry) = self.buckets.entry(key) else {
                continue;
            };
            let rest: Vec<Arc<C>> = entry
                .get()
                .iter()
                .filter(|indexed| indexed.id() != id)
                .cloned()
                .collect();
            if rest.is_empty() {
                entry.remove();
            } else if rest.len() != entry.get().len() {
                entry.insert(rest.into());
            }
        }
        true
    }

    /// The highest-priority claim in `key`'s bucket containing `pos`.
    ///
    /// On equal priority the claim published first wins.
    pub(crate) fn resolve(&self, key: &K, pos: BlockPos) -> Option<Arc<C>> {
        let bucket = self.bucket(key)?;
        let mut best: Option<&Arc<C>> = None;
        for claim in bucket.iter().filter(|claim| claim.contains(pos)) {
            if best.is_none_or(|current| claim.priority() > current.priority()) {
                best = Some(claim);
            }
        }
        best.cloned()
    }

    /// Every indexed claim, once each.
    pub(crate) fn claims(&self) -> Vec<Arc<C>> {
        self.by_id
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Number of indexed claims.
    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Number of non-empty buckets.
    #[cfg(test)]
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub(crate) fn clear(&self) {
        self.by_id.clear();
        self.buckets.clear();
    }
}
