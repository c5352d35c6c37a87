//! Reorder mutation surface for drag/drop.
//!
//! A [`SectionStore`] is the mutable backing list behind the immutable
//! snapshots: drop gestures land here as move/remove/insert operations, and
//! every accepted mutation is reflected in a fresh [`Snapshot`] fed back
//! through the differ so the view stays consistent.
//!
//! All caller-model errors degrade: out-of-range indices clamp or ignore the
//! offending operation with a debug diagnostic, and a drop that would
//! duplicate an id within its destination section is rejected as a no-op.

use cascade_core::{IndexPath, ItemId, ItemKey, SectionKey, Snapshot};

#[derive(Clone, Debug)]
struct StoreSection {
    key: SectionKey,
    items: Vec<ItemId>,
    supplementary_kinds: Vec<String>,
}

/// Mutable ordered backing store for one snapshot's worth of sections.
#[derive(Clone, Debug, Default)]
pub struct SectionStore {
    sections: Vec<StoreSection>,
}

impl SectionStore {
    /// Seeds the store from the current snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let sections = snapshot
            .sections()
            .iter()
            .map(|s| StoreSection {
                key: s.id(),
                items: s.items().to_vec(),
                supplementary_kinds: s.supplementary_kinds().to_vec(),
            })
            .collect();
        Self { sections }
    }

    /// Produces the snapshot reflecting every mutation so far.
    pub fn snapshot(&self) -> Snapshot {
        let mut builder = Snapshot::builder();
        for section in &self.sections {
            builder.push_section_id(section.key);
            for kind in &section.supplementary_kinds {
                builder.push_supplementary(kind);
            }
            for &item in &section.items {
                builder.push_item_id(item);
            }
        }
        builder.build()
    }

    /// Moves the item at `from` to `to`.
    ///
    /// A move across sections re-derives the item's id under the destination
    /// section, so the differ sees it as remove + insert. The destination
    /// index clamps into range; a move that would duplicate an id in the
    /// destination section is rejected. Returns whether anything changed.
    pub fn apply_move(&mut self, from: IndexPath, to: IndexPath) -> bool {
        let Some(&id) = self
            .sections
            .get(from.section)
            .and_then(|s| s.items.get(from.item))
        else {
            log::debug!("reorder: move from out-of-range {from:?} ignored");
            return false;
        };
        if to.section >= self.sections.len() {
            log::debug!("reorder: move to out-of-range section {} ignored", to.section);
            return false;
        }

        if from.section == to.section {
            let items = &mut self.sections[from.section].items;
            items.remove(from.item);
            let index = to.item.min(items.len());
            items.insert(index, id);
            return true;
        }

        let moved = ItemId::new(self.sections[to.section].key, id.item());
        if self.sections[to.section].items.contains(&moved) {
            log::debug!("reorder: move would duplicate {moved:?} in destination; rejected");
            return false;
        }
        self.sections[from.section].items.remove(from.item);
        let destination = &mut self.sections[to.section].items;
        let index = to.item.min(destination.len());
        destination.insert(index, moved);
        true
    }

    /// Removes the items at `paths`. Out-of-range paths are ignored with a
    /// diagnostic. Returns how many items were removed.
    pub fn apply_remove(&mut self, paths: &[IndexPath]) -> usize {
        let mut ordered: Vec<IndexPath> = paths.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut removed = 0;
        // descending so earlier removals never shift later targets
        for path in ordered.into_iter().rev() {
            let valid = self
                .sections
                .get(path.section)
                .is_some_and(|s| path.item < s.items.len());
            if valid {
                self.sections[path.section].items.remove(path.item);
                removed += 1;
            } else {
                log::debug!("reorder: remove at out-of-range {path:?} ignored");
            }
        }
        removed
    }

    /// Inserts items keyed by `keys` starting at `at`. The insertion index
    /// clamps into range; keys that would duplicate an existing id in the
    /// section are skipped. Returns how many items were inserted.
    pub fn apply_insert(&mut self, at: IndexPath, keys: &[ItemKey]) -> usize {
        let Some(section) = self.sections.get_mut(at.section) else {
            log::debug!("reorder: insert into out-of-range section {} ignored", at.section);
            return 0;
        };

        let mut index = at.item.min(section.items.len());
        let mut inserted = 0;
        for &key in keys {
            let id = ItemId::new(section.key, key);
            if section.items.contains(&id) {
                log::debug!("reorder: insert would duplicate {id:?}; skipped");
                continue;
            }
            section.items.insert(index, id);
            index += 1;
            inserted += 1;
        }
        inserted
    }
}
