//! Resolved-style cache
//!
//! Content-addressed, process-wide-per-engine map from cascade key to
//! shared resolved record. Entries are never evicted individually; the
//! only supported invalidation is a full clear (sheet/schema reload).
//!
//! The key is a rolling hash over (element type name, matched-rule
//! identities + specificities). Collisions are not disambiguated by a
//! secondary equality check: two distinct matched-rule sets that hash
//! alike would share a record. This mirrors the source design and is an
//! accepted risk.

use std::collections::HashMap;
use std::sync::Arc;

use crate::resolved::ResolvedStyle;

const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Fixed multiply-xor combiner used for cascade cache keys
#[inline]
pub(crate) fn fold_hash(hash: u64, value: u64) -> u64 {
    (hash ^ value).wrapping_mul(FNV_PRIME)
}

/// Shared cache of resolved styles, keyed by cascade hash
#[derive(Debug, Default)]
pub struct StyleCache {
    map: HashMap<u64, Arc<ResolvedStyle>>,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: u64) -> Option<Arc<ResolvedStyle>> {
        self.map.get(&key).map(Arc::clone)
    }

    /// Publish a record. Records are immutable from here on.
    pub fn insert(&mut self, key: u64, style: Arc<ResolvedStyle>) {
        self.map.insert(key, style);
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Rough memory held by the cache table itself
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.map.capacity()
                * (std::mem::size_of::<u64>() + std::mem::size_of::<Arc<ResolvedStyle>>())
    }
}

/// Counters for one engine's style passes
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleStats {
    /// Elements attached from the shared cache without property work
    pub cache_hits: u64,
    /// Elements whose record had to be built
    pub cache_misses: u64,
    /// Elements whose resolved record was refreshed this far
    pub nodes_restyled: u64,
    /// Subtrees skipped because both dirty flags were clear
    pub subtrees_skipped: u64,
    /// Full cache clears performed
    pub full_clears: u64,
}

impl StyleStats {
    /// Share of resolutions served from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}
