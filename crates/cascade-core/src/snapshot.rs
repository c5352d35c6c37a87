//! Immutable snapshots of the collection's structure.
//!
//! A [`Snapshot`] is an ordered description of sections and their item ids at
//! one point in time. The data source produces a fresh snapshot on every
//! change; the differ compares the on-screen snapshot against the new one.
//! Snapshots never mutate after [`SnapshotBuilder::build`].

use std::hash::Hash;

use crate::collections::map::{HashMap, HashSet};
use crate::identity::{ItemId, ItemKey, SectionKey, SupplementaryId};

/// Position of an item within a snapshot: section index plus item index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexPath {
    pub section: usize,
    pub item: usize,
}

impl IndexPath {
    #[inline]
    pub const fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }
}

/// One section of a snapshot: its identity, its items in render order, and
/// the supplementary kinds (header/footer/decorations) it carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionSnapshot {
    id: SectionKey,
    items: Vec<ItemId>,
    supplementary_kinds: Vec<String>,
}

impl SectionSnapshot {
    #[inline]
    pub fn id(&self) -> SectionKey {
        self.id
    }

    #[inline]
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    #[inline]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Kinds of supplementary content this section declares, in declaration
    /// order.
    pub fn supplementary_kinds(&self) -> &[String] {
        &self.supplementary_kinds
    }

    /// Returns true if the section declares a supplementary of `kind`.
    pub fn has_supplementary(&self, kind: &str) -> bool {
        self.supplementary_kinds.iter().any(|k| k == kind)
    }

    /// The supplementary id for `kind`, whether or not the section declares
    /// it.
    pub fn supplementary_id(&self, kind: &str) -> SupplementaryId {
        SupplementaryId::new(self.id, kind)
    }

    /// Position of `id` within this section, if present.
    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|&it| it == id)
    }
}

/// An immutable ordered description of sections and their item ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    sections: Vec<SectionSnapshot>,
}

impl Snapshot {
    /// Starts building a snapshot.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    #[inline]
    pub fn sections(&self) -> &[SectionSnapshot] {
        &self.sections
    }

    #[inline]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn section(&self, index: usize) -> Option<&SectionSnapshot> {
        self.sections.get(index)
    }

    /// Index of the section with the given identity.
    pub fn index_of_section(&self, id: SectionKey) -> Option<usize> {
        self.sections.iter().position(|s| s.id() == id)
    }

    /// Total number of items across all sections.
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.item_count()).sum()
    }

    /// Resolves an index path to an item id.
    pub fn item_at(&self, path: IndexPath) -> Option<ItemId> {
        self.sections
            .get(path.section)
            .and_then(|s| s.items().get(path.item))
            .copied()
    }

    /// Locates an item id anywhere in the snapshot.
    pub fn index_path_of(&self, id: ItemId) -> Option<IndexPath> {
        self.sections.iter().enumerate().find_map(|(si, s)| {
            s.index_of(id).map(|ii| IndexPath::new(si, ii))
        })
    }
}

/// Builds a [`Snapshot`], enforcing id uniqueness as it goes.
///
/// Duplicate section or item keys are a caller error: the first occurrence
/// wins, later occurrences are dropped with a debug diagnostic. The builder
/// never fails.
#[derive(Default)]
pub struct SnapshotBuilder {
    sections: Vec<SectionSnapshot>,
    seen_sections: HashSet<SectionKey>,
    seen_items: HashSet<ItemId>,
    // true while appends go to the most recent section; false after a
    // duplicate section was dropped, so its items are dropped with it
    current_live: bool,
}

impl SnapshotBuilder {
    /// Opens a new section keyed by `key`. Items pushed afterwards land in
    /// this section until the next `push_section`.
    pub fn push_section<K: Hash>(&mut self, key: &K) -> &mut Self {
        self.push_section_id(SectionKey::new(key))
    }

    /// Opens a new section with an already-digested identity.
    pub fn push_section_id(&mut self, id: SectionKey) -> &mut Self {
        if !self.seen_sections.insert(id) {
            log::debug!("snapshot: duplicate section id {id:?} dropped (first occurrence wins)");
            self.current_live = false;
            return self;
        }
        self.sections.push(SectionSnapshot {
            id,
            items: Vec::new(),
            supplementary_kinds: Vec::new(),
        });
        self.current_live = true;
        self
    }

    /// Appends an item keyed by `key` to the currently open section.
    ///
    /// Items pushed after a dropped duplicate section are dropped with it.
    pub fn push_item<K: Hash>(&mut self, key: &K) -> &mut Self {
        let Some(section) = self.current_section() else {
            if self.sections.is_empty() {
                log::debug!("snapshot: item pushed before any section; dropped");
            }
            return self;
        };
        let id = ItemId::new(section, ItemKey::new(key));
        self.push_item_id(id)
    }

    /// Appends an item with an already-composed id to the open section.
    pub fn push_item_id(&mut self, id: ItemId) -> &mut Self {
        if !self.current_live {
            if self.sections.is_empty() {
                log::debug!("snapshot: item pushed before any section; dropped");
            }
            return self;
        }
        let last = self
            .sections
            .last_mut()
            .expect("live builder has an open section");
        if !self.seen_items.insert(id) {
            log::debug!("snapshot: duplicate item id {id:?} dropped (first occurrence wins)");
            return self;
        }
        last.items.push(id);
        self
    }

    /// Declares a supplementary of `kind` on the currently open section.
    pub fn push_supplementary(&mut self, kind: &str) -> &mut Self {
        if !self.current_live {
            if self.sections.is_empty() {
                log::debug!("snapshot: supplementary pushed before any section; dropped");
            }
            return self;
        }
        let last = self
            .sections
            .last_mut()
            .expect("live builder has an open section");
        if last.supplementary_kinds.iter().any(|k| k == kind) {
            log::debug!("snapshot: duplicate supplementary kind {kind:?} dropped");
            return self;
        }
        last.supplementary_kinds.push(kind.to_owned());
        self
    }

    /// Finishes the snapshot.
    pub fn build(self) -> Snapshot {
        Snapshot {
            sections: self.sections,
        }
    }

    fn current_section(&self) -> Option<SectionKey> {
        if self.current_live {
            self.sections.last().map(|s| s.id())
        } else {
            None
        }
    }
}

/// Maps every item id in a snapshot to its index path, for O(1) lookups
/// during diffing.
pub(crate) fn index_items(snapshot: &Snapshot) -> HashMap<ItemId, IndexPath> {
    let mut map = HashMap::default();
    for (si, section) in snapshot.sections().iter().enumerate() {
        for (ii, &id) in section.items().iter().enumerate() {
            map.entry(id).or_insert(IndexPath::new(si, ii));
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_item_snapshot() -> Snapshot {
        let mut b = Snapshot::builder();
        b.push_section(&"a");
        b.push_item(&1).push_item(&2);
        b.push_section(&"b");
        b.push_item(&1);
        b.build()
    }

    #[test]
    fn test_builder_preserves_order() {
        let snap = three_item_snapshot();
        assert_eq!(snap.section_count(), 2);
        assert_eq!(snap.item_count(), 3);
        assert_eq!(snap.sections()[0].item_count(), 2);
    }

    #[test]
    fn test_same_item_key_differs_across_sections() {
        let snap = three_item_snapshot();
        let a0 = snap.item_at(IndexPath::new(0, 0)).unwrap();
        let b0 = snap.item_at(IndexPath::new(1, 0)).unwrap();
        assert_ne!(a0, b0);
    }

    #[test]
    fn test_duplicate_item_first_occurrence_wins() {
        let mut b = Snapshot::builder();
        b.push_section(&"a");
        b.push_item(&1).push_item(&1).push_item(&2);
        let snap = b.build();
        assert_eq!(snap.sections()[0].item_count(), 2);
    }

    #[test]
    fn test_duplicate_section_dropped_with_items() {
        let mut b = Snapshot::builder();
        b.push_section(&"a");
        b.push_item(&1);
        b.push_section(&"a");
        b.push_item(&2);
        let snap = b.build();
        assert_eq!(snap.section_count(), 1);
        assert_eq!(snap.item_count(), 1);
    }

    #[test]
    fn test_index_path_lookup_round_trips() {
        let snap = three_item_snapshot();
        let path = IndexPath::new(1, 0);
        let id = snap.item_at(path).unwrap();
        assert_eq!(snap.index_path_of(id), Some(path));
    }

    #[test]
    fn test_supplementary_kinds() {
        let mut b = Snapshot::builder();
        b.push_section(&"a");
        b.push_supplementary("header");
        b.push_supplementary("footer");
        b.push_supplementary("header");
        let snap = b.build();
        let section = &snap.sections()[0];
        assert_eq!(section.supplementary_kinds().len(), 2);
        assert!(section.has_supplementary("header"));
        assert!(!section.has_supplementary("badge"));
    }
}
