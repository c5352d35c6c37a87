//! Content recycling caches.
//!
//! Two caches share one element-id key space. The *explicit* cache is
//! unbounded and holds content for sections pinned "keep alive" (e.g. to
//! preserve nested scroll state offscreen); entries leave it only when the
//! section is unpinned or removed. The *auto* cache is the bounded LRU that
//! serves everything else. Cell reuse looks up explicit first, auto second,
//! and a miss just means the caller creates a fresh handle.

mod lru;

pub use lru::LruCache;

use cascade_core::collections::map::{HashMap, HashSet};
use cascade_core::{ElementId, SectionKey};

use crate::content::{content_type_compatible, ContentHandle};

/// Default capacity of the auto cache.
pub const DEFAULT_AUTO_CAPACITY: usize = 50;

/// Counters describing recycling behavior, for tests and debugging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecycleStats {
    /// Entries currently parked in the explicit cache.
    pub pooled_explicit: usize,
    /// Entries currently parked in the auto cache.
    pub pooled_auto: usize,
    /// Lookups satisfied from either cache.
    pub reuse_count: usize,
    /// Lookups that required the caller to create fresh content.
    pub miss_count: usize,
    /// Handles dropped by auto-cache eviction.
    pub evicted_count: usize,
}

/// The two-tier recycling cache.
pub struct ReusePool {
    explicit: HashMap<ElementId, ContentHandle>,
    pinned_sections: HashSet<SectionKey>,
    auto: LruCache<ContentHandle>,
    reuse_count: usize,
    miss_count: usize,
    evicted_count: usize,
}

impl Default for ReusePool {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_CAPACITY)
    }
}

impl ReusePool {
    /// Creates a pool whose auto cache holds at most `auto_capacity` handles.
    pub fn new(auto_capacity: usize) -> Self {
        Self {
            explicit: HashMap::default(),
            pinned_sections: HashSet::default(),
            auto: LruCache::new(auto_capacity),
            reuse_count: 0,
            miss_count: 0,
            evicted_count: 0,
        }
    }

    /// Pins a section: its handles park in the explicit cache and survive
    /// auto-cache pressure until [`ReusePool::unpin_section`] or
    /// [`ReusePool::remove_section`].
    pub fn pin_section(&mut self, section: SectionKey) {
        self.pinned_sections.insert(section);
    }

    /// Unpins a section. Its explicit entries demote to the auto cache so
    /// they still get a chance at reuse before eviction.
    pub fn unpin_section(&mut self, section: SectionKey) {
        if !self.pinned_sections.remove(&section) {
            return;
        }
        let demoted: Vec<ElementId> = self
            .explicit
            .keys()
            .filter(|id| section_of(**id) == section)
            .copied()
            .collect();
        for id in demoted {
            let handle = self
                .explicit
                .remove(&id)
                .expect("explicit entry present for collected key");
            self.insert_auto(id, handle);
        }
    }

    pub fn is_pinned(&self, section: SectionKey) -> bool {
        self.pinned_sections.contains(&section)
    }

    /// Takes the cached handle for `id`, explicit cache first.
    ///
    /// `wanted_type` gates reuse: an incompatible cached handle is dropped
    /// and the lookup counts as a miss, since the caller must create fresh
    /// content either way.
    pub fn dequeue(&mut self, id: ElementId, wanted_type: Option<u64>) -> Option<ContentHandle> {
        // release-from-explicit-before-evict-from-auto: the explicit entry is
        // taken out before any auto mutation can evict
        let handle = self
            .explicit
            .remove(&id)
            .or_else(|| self.auto.remove(id));
        match handle {
            Some(handle) if content_type_compatible(handle.content_type(), wanted_type) => {
                self.reuse_count += 1;
                Some(handle)
            }
            Some(_incompatible) => {
                log::debug!("recycle: cached content for {id:?} has incompatible type; dropped");
                self.miss_count += 1;
                None
            }
            None => {
                self.miss_count += 1;
                None
            }
        }
    }

    /// Parks a retired handle for later reuse. The handle is unbound before
    /// it enters a cache; an evicted cold handle is dropped.
    pub fn store(&mut self, id: ElementId, mut handle: ContentHandle) {
        handle.unbind();
        if self.pinned_sections.contains(&section_of(id)) {
            if self.explicit.insert(id, handle).is_some() {
                log::debug!("recycle: replaced explicit entry for {id:?}");
            }
            return;
        }
        self.insert_auto(id, handle);
    }

    fn insert_auto(&mut self, id: ElementId, handle: ContentHandle) {
        if let Some((evicted, _)) = self.auto.insert(id, handle) {
            // a same-key replacement is not an eviction
            if evicted != id {
                self.evicted_count += 1;
            }
        }
    }

    /// Drops every cached handle belonging to `section`, both tiers.
    /// Called when the section itself leaves the snapshot.
    pub fn remove_section(&mut self, section: SectionKey) {
        self.pinned_sections.remove(&section);
        self.explicit.retain(|id, _| section_of(*id) != section);
        self.auto.retain(|id, _| section_of(id) != section);
    }

    /// Drops a single cached handle, if present.
    pub fn invalidate(&mut self, id: ElementId) {
        if self.explicit.remove(&id).is_none() {
            self.auto.remove(id);
        }
    }

    pub fn stats(&self) -> RecycleStats {
        RecycleStats {
            pooled_explicit: self.explicit.len(),
            pooled_auto: self.auto.len(),
            reuse_count: self.reuse_count,
            miss_count: self.miss_count,
            evicted_count: self.evicted_count,
        }
    }
}

fn section_of(id: ElementId) -> SectionKey {
    match id {
        ElementId::Item(item) => item.section(),
        ElementId::Supplementary(supplementary) => supplementary.section(),
    }
}
