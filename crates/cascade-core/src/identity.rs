//! Stable identity for sections, items, and supplementary content.
//!
//! All components downstream of the data source operate on the opaque ids
//! defined here, never on raw model values. Keys are digested to `u64` once
//! at snapshot construction; equality and hashing are structural and carry
//! no ordering semantics.

use std::hash::{Hash, Hasher};

#[cfg(feature = "std-hash")]
mod hasher {
    pub use std::collections::hash_map::DefaultHasher;

    #[inline]
    pub fn new() -> DefaultHasher {
        DefaultHasher::new()
    }
}

#[cfg(not(feature = "std-hash"))]
mod hasher {
    // fast branch: AHasher::default() uses fixed keys, so digests are
    // stable for the lifetime of the process
    pub use ahash::AHasher as DefaultHasher;

    #[inline]
    pub fn new() -> DefaultHasher {
        DefaultHasher::default()
    }
}

/// Digests an arbitrary hashable key into the `u64` space all ids live in.
#[inline]
pub fn digest_key<K: Hash>(key: &K) -> u64 {
    let mut h = hasher::new();
    key.hash(&mut h);
    h.finish()
}

/// Identity of a section, derived from a caller-supplied key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionKey(u64);

impl SectionKey {
    /// Digests `key` into a section identity.
    pub fn new<K: Hash>(key: &K) -> Self {
        Self(digest_key(key))
    }

    /// Wraps an already-digested hash.
    #[inline]
    pub const fn from_raw(hash: u64) -> Self {
        Self(hash)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Identity of an item within a section, derived from a caller-supplied key.
///
/// An `ItemKey` alone is only meaningful inside one section; combine it with
/// the section's key via [`ItemId::new`] to get a globally unique id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ItemKey(u64);

impl ItemKey {
    /// Digests `key` into an item identity.
    pub fn new<K: Hash>(key: &K) -> Self {
        Self(digest_key(key))
    }

    #[inline]
    pub const fn from_raw(hash: u64) -> Self {
        Self(hash)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Composite identity of one item: the section's key hash plus the item's
/// key hash.
///
/// Equality and hashing are structural. There are deliberately no ordering
/// semantics; render order comes from the snapshot, never from ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ItemId {
    section_hash: u64,
    item_hash: u64,
}

impl ItemId {
    /// Combines a section identity with an item identity.
    #[inline]
    pub const fn new(section: SectionKey, item: ItemKey) -> Self {
        Self {
            section_hash: section.raw(),
            item_hash: item.raw(),
        }
    }

    /// The section component of this id.
    #[inline]
    pub const fn section(self) -> SectionKey {
        SectionKey::from_raw(self.section_hash)
    }

    /// The item component of this id.
    #[inline]
    pub const fn item(self) -> ItemKey {
        ItemKey::from_raw(self.item_hash)
    }
}

/// Identity of supplementary content (header, footer, custom decoration)
/// within a section, keyed by a free-form "kind" string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SupplementaryId {
    section_hash: u64,
    kind_hash: u64,
}

impl SupplementaryId {
    /// Combines a section identity with a supplementary kind.
    pub fn new(section: SectionKey, kind: &str) -> Self {
        Self {
            section_hash: section.raw(),
            kind_hash: digest_key(&kind),
        }
    }

    #[inline]
    pub const fn section(self) -> SectionKey {
        SectionKey::from_raw(self.section_hash)
    }
}

/// Any element the recycling caches can hold content for.
///
/// Items and supplementaries share one key space so a single cache can serve
/// both lookup paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementId {
    Item(ItemId),
    Supplementary(SupplementaryId),
}

impl From<ItemId> for ElementId {
    fn from(id: ItemId) -> Self {
        ElementId::Item(id)
    }
}

impl From<SupplementaryId> for ElementId {
    fn from(id: SupplementaryId) -> Self {
        ElementId::Supplementary(id)
    }
}
