//! Snapshot differ.
//!
//! Computes a staged sequence of structural edits transforming the on-screen
//! snapshot into a newly produced one while preserving element identity.
//! Staging exists because bulk heterogeneous changes (a section move combined
//! with item inserts inside it) cannot be expressed as one atomic edit
//! against an incrementally-updating view hierarchy.
//!
//! Stage order and coordinate spaces:
//!
//! 1. **Reloads** — item paths in the *old* snapshot's coordinates. Rebind
//!    content in place; structure is untouched.
//! 2. **Removes** — item paths in old coordinates (descending), then section
//!    indices in old coordinates (descending).
//! 3. **Section arrangement** — inserts at *new* indices, moves with `from`
//!    addressing the post-removal section list and `to` the new index.
//!    Applied batch-wise: moved sections are lifted out, then inserted and
//!    moved sections are placed at their target indices ascending.
//! 4. **Item arrangement** — inserts at new paths, moves with `from`
//!    addressing the post-removal item list of the already-arranged section
//!    and `to` the new path. Applied batch-wise like stage 3.
//!
//! An id changing sections is never a cross-section move: the section hash is
//! part of [`ItemId`], so it surfaces naturally as remove + insert.
//!
//! The differ never fails. Malformed input degrades best-effort; an
//! oversized changeset degrades to a non-animated full reload (a performance
//! guard, not a correctness one).

use smallvec::SmallVec;

use crate::collections::map::{HashMap, HashSet};
use crate::identity::ItemId;
use crate::snapshot::{index_items, IndexPath, Snapshot};

/// Structural edit against the section list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionEdit {
    Insert { to: usize },
    Remove { from: usize },
    Move { from: usize, to: usize },
}

/// Structural edit against one section's item list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemEdit {
    Reload { at: IndexPath },
    Remove { at: IndexPath },
    Insert { at: IndexPath },
    Move { from: IndexPath, to: IndexPath },
}

pub type SectionEditList = SmallVec<[SectionEdit; 4]>;
pub type ItemEditList = SmallVec<[ItemEdit; 8]>;

/// One batch of edits that can be applied to a live view hierarchy without
/// intermediate inconsistency.
#[derive(Clone, Debug, Default)]
pub struct Stage {
    pub section_edits: SectionEditList,
    pub item_edits: ItemEditList,
}

impl Stage {
    pub fn is_empty(&self) -> bool {
        self.section_edits.is_empty() && self.item_edits.is_empty()
    }

    pub fn edit_count(&self) -> usize {
        self.section_edits.len() + self.item_edits.len()
    }
}

/// Tuning knobs for the differ.
#[derive(Clone, Debug)]
pub struct DiffOptions {
    /// Above this many edits the changeset degrades to a full reload instead
    /// of a huge staged animation. `None` disables the fallback.
    pub full_reload_threshold: Option<usize>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            full_reload_threshold: Some(100),
        }
    }
}

/// The staged result of diffing two snapshots.
#[derive(Clone, Debug, Default)]
pub struct Changeset {
    stages: Vec<Stage>,
    edit_count: usize,
    full_reload: bool,
}

impl Changeset {
    fn full_reload() -> Self {
        Self {
            stages: Vec::new(),
            edit_count: 0,
            full_reload: true,
        }
    }

    /// Stages in application order. Empty stages are omitted.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// True when the host should replace everything without animation
    /// instead of applying stages.
    pub fn is_full_reload(&self) -> bool {
        self.full_reload
    }

    /// Total number of edits across all stages.
    pub fn edit_count(&self) -> usize {
        self.edit_count
    }

    /// True when the snapshots were structurally identical and nothing was
    /// marked for reload.
    pub fn is_empty(&self) -> bool {
        !self.full_reload && self.stages.is_empty()
    }

    fn push_stage(&mut self, stage: Stage) {
        if !stage.is_empty() {
            self.edit_count += stage.edit_count();
            self.stages.push(stage);
        }
    }
}

/// Diffs two snapshots with no items marked for reload.
pub fn diff(old: &Snapshot, new: &Snapshot, options: &DiffOptions) -> Changeset {
    diff_with_reloads(old, new, &HashSet::default(), options)
}

/// Diffs two snapshots, forcing a rebind for the ids in `reloads` even when
/// their identity and position are unchanged (used when an id's underlying
/// data mutates in place).
pub fn diff_with_reloads(
    old: &Snapshot,
    new: &Snapshot,
    reloads: &HashSet<ItemId>,
    options: &DiffOptions,
) -> Changeset {
    let plan = SectionPlan::build(old, new);
    let new_item_paths = index_items(new);

    let mut reload_stage = Stage::default();
    let mut remove_stage = Stage::default();
    let mut section_stage = Stage::default();
    let mut item_stage = Stage::default();

    for &from in plan.removes.iter().rev() {
        remove_stage.section_edits.push(SectionEdit::Remove { from });
    }
    for &to in &plan.inserts {
        section_stage.section_edits.push(SectionEdit::Insert { to });
    }
    for &(from, to) in &plan.moves {
        section_stage.section_edits.push(SectionEdit::Move { from, to });
    }

    let mut item_removes: Vec<IndexPath> = Vec::new();
    for &(old_idx, new_idx) in &plan.common {
        diff_section_items(
            old,
            new,
            old_idx,
            new_idx,
            reloads,
            &new_item_paths,
            &mut reload_stage,
            &mut item_removes,
            &mut item_stage,
        );
    }

    item_removes.sort_unstable();
    for &at in item_removes.iter().rev() {
        remove_stage.item_edits.push(ItemEdit::Remove { at });
    }

    let mut changeset = Changeset::default();
    changeset.push_stage(reload_stage);
    changeset.push_stage(remove_stage);
    changeset.push_stage(section_stage);
    changeset.push_stage(item_stage);

    if let Some(threshold) = options.full_reload_threshold {
        if changeset.edit_count() > threshold {
            log::debug!(
                "diff: {} edits exceed full-reload threshold {}; degrading to full reload",
                changeset.edit_count(),
                threshold
            );
            return Changeset::full_reload();
        }
    }

    changeset
}

/// Section-level alignment between two snapshots.
struct SectionPlan {
    /// Old indices of removed sections, ascending.
    removes: Vec<usize>,
    /// New indices of inserted sections, ascending.
    inserts: Vec<usize>,
    /// Moves as (index into the post-removal section list, new index).
    moves: Vec<(usize, usize)>,
    /// Sections present in both snapshots as (old index, new index), in old
    /// order.
    common: Vec<(usize, usize)>,
}

impl SectionPlan {
    fn build(old: &Snapshot, new: &Snapshot) -> Self {
        let mut new_pos = HashMap::default();
        for (i, s) in new.sections().iter().enumerate() {
            new_pos.entry(s.id()).or_insert(i);
        }
        let mut old_pos = HashMap::default();
        for (i, s) in old.sections().iter().enumerate() {
            old_pos.entry(s.id()).or_insert(i);
        }

        let mut removes = Vec::new();
        let mut common = Vec::new();
        for (i, s) in old.sections().iter().enumerate() {
            match new_pos.get(&s.id()) {
                Some(&ni) => common.push((i, ni)),
                None => removes.push(i),
            }
        }

        let mut inserts = Vec::new();
        for (i, s) in new.sections().iter().enumerate() {
            if !old_pos.contains_key(&s.id()) {
                inserts.push(i);
            }
        }

        // Sections whose new positions form a longest increasing subsequence
        // stay put; the rest move. `from` addresses the post-removal list,
        // which is exactly `common` in old order.
        let new_positions: Vec<usize> = common.iter().map(|&(_, ni)| ni).collect();
        let stationary = longest_increasing_subsequence(&new_positions);
        let mut moves = Vec::new();
        for (ci, &(_, ni)) in common.iter().enumerate() {
            if !stationary[ci] {
                moves.push((ci, ni));
            }
        }
        moves.sort_unstable_by_key(|&(_, to)| to);

        Self {
            removes,
            inserts,
            moves,
            common,
        }
    }
}

/// Diffs the items of one section present in both snapshots.
#[allow(clippy::too_many_arguments)]
fn diff_section_items(
    old: &Snapshot,
    new: &Snapshot,
    old_idx: usize,
    new_idx: usize,
    reloads: &HashSet<ItemId>,
    new_item_paths: &HashMap<ItemId, IndexPath>,
    reload_stage: &mut Stage,
    item_removes: &mut Vec<IndexPath>,
    item_stage: &mut Stage,
) {
    let old_items = old.sections()[old_idx].items();
    let new_items = new.sections()[new_idx].items();

    let mut old_item_pos = HashMap::default();
    for (i, &id) in old_items.iter().enumerate() {
        old_item_pos.entry(id).or_insert(i);
    }

    // Retained items in old relative order; their index in this list is the
    // `from` coordinate for stage-4 moves (the post-removal item list).
    let mut retained_new_positions: Vec<usize> = Vec::new();
    for (i, &id) in old_items.iter().enumerate() {
        match new_item_paths.get(&id) {
            // An id can only reappear in the section with the same key; the
            // section hash inside ItemId guarantees it.
            Some(path) if path.section == new_idx => {
                retained_new_positions.push(path.item);
                if reloads.contains(&id) {
                    reload_stage.item_edits.push(ItemEdit::Reload {
                        at: IndexPath::new(old_idx, i),
                    });
                }
            }
            _ => item_removes.push(IndexPath::new(old_idx, i)),
        }
    }

    let stationary = longest_increasing_subsequence(&retained_new_positions);
    let mut moves: Vec<(usize, usize)> = Vec::new();
    for (ri, &np) in retained_new_positions.iter().enumerate() {
        if !stationary[ri] {
            moves.push((ri, np));
        }
    }
    moves.sort_unstable_by_key(|&(_, to)| to);
    for (from_item, to_item) in moves {
        item_stage.item_edits.push(ItemEdit::Move {
            from: IndexPath::new(new_idx, from_item),
            to: IndexPath::new(new_idx, to_item),
        });
    }

    for (i, &id) in new_items.iter().enumerate() {
        if !old_item_pos.contains_key(&id) {
            item_stage.item_edits.push(ItemEdit::Insert {
                at: IndexPath::new(new_idx, i),
            });
        }
    }
}

/// Marks the elements of one longest strictly-increasing subsequence.
///
/// Returns a mask parallel to `values`; `true` entries are part of the
/// subsequence. O(n log n) patience sorting with predecessor links.
fn longest_increasing_subsequence(values: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; values.len()];

    for (i, &v) in values.iter().enumerate() {
        let pos = tails.partition_point(|&t| values[t] < v);
        if pos > 0 {
            prev[i] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }

    let mut keep = vec![false; values.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        keep[i] = true;
        cursor = prev[i];
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(sections: &[(&str, &[u32])]) -> Snapshot {
        let mut b = Snapshot::builder();
        for (key, items) in sections {
            b.push_section(key);
            for item in *items {
                b.push_item(item);
            }
        }
        b.build()
    }

    fn all_item_edits(changeset: &Changeset) -> Vec<ItemEdit> {
        changeset
            .stages()
            .iter()
            .flat_map(|s| s.item_edits.iter().copied())
            .collect()
    }

    fn all_section_edits(changeset: &Changeset) -> Vec<SectionEdit> {
        changeset
            .stages()
            .iter()
            .flat_map(|s| s.section_edits.iter().copied())
            .collect()
    }

    #[test]
    fn test_identical_snapshots_yield_empty_changeset() {
        let snap = snapshot(&[("a", &[1, 2, 3]), ("b", &[4])]);
        let changeset = diff(&snap, &snap.clone(), &DiffOptions::default());
        assert!(changeset.is_empty());
        assert_eq!(changeset.edit_count(), 0);
    }

    #[test]
    fn test_item_insert() {
        let old = snapshot(&[("a", &[1, 3])]);
        let new = snapshot(&[("a", &[1, 2, 3])]);
        let changeset = diff(&old, &new, &DiffOptions::default());
        assert_eq!(
            all_item_edits(&changeset),
            vec![ItemEdit::Insert {
                at: IndexPath::new(0, 1)
            }]
        );
    }

    #[test]
    fn test_item_remove_descending() {
        let old = snapshot(&[("a", &[1, 2, 3, 4])]);
        let new = snapshot(&[("a", &[2])]);
        let changeset = diff(&old, &new, &DiffOptions::default());
        assert_eq!(
            all_item_edits(&changeset),
            vec![
                ItemEdit::Remove {
                    at: IndexPath::new(0, 3)
                },
                ItemEdit::Remove {
                    at: IndexPath::new(0, 2)
                },
                ItemEdit::Remove {
                    at: IndexPath::new(0, 0)
                },
            ]
        );
    }

    #[test]
    fn test_item_move_is_minimal() {
        // 1,2,3,4 -> 4,1,2,3: one move, not three
        let old = snapshot(&[("a", &[1, 2, 3, 4])]);
        let new = snapshot(&[("a", &[4, 1, 2, 3])]);
        let changeset = diff(&old, &new, &DiffOptions::default());
        let edits = all_item_edits(&changeset);
        assert_eq!(
            edits,
            vec![ItemEdit::Move {
                from: IndexPath::new(0, 3),
                to: IndexPath::new(0, 0)
            }]
        );
    }

    #[test]
    fn test_reload_marked_item() {
        let old = snapshot(&[("a", &[1, 2])]);
        let new = snapshot(&[("a", &[1, 2])]);
        let id = old.item_at(IndexPath::new(0, 1)).unwrap();
        let mut reloads = HashSet::default();
        reloads.insert(id);
        let changeset = diff_with_reloads(&old, &new, &reloads, &DiffOptions::default());
        assert_eq!(
            all_item_edits(&changeset),
            vec![ItemEdit::Reload {
                at: IndexPath::new(0, 1)
            }]
        );
    }

    #[test]
    fn test_reload_of_removed_item_is_not_emitted() {
        let old = snapshot(&[("a", &[1, 2])]);
        let new = snapshot(&[("a", &[1])]);
        let removed = old.item_at(IndexPath::new(0, 1)).unwrap();
        let mut reloads = HashSet::default();
        reloads.insert(removed);
        let changeset = diff_with_reloads(&old, &new, &reloads, &DiffOptions::default());
        assert_eq!(
            all_item_edits(&changeset),
            vec![ItemEdit::Remove {
                at: IndexPath::new(0, 1)
            }]
        );
    }

    #[test]
    fn test_section_insert_and_remove() {
        let old = snapshot(&[("a", &[1]), ("b", &[2])]);
        let new = snapshot(&[("b", &[2]), ("c", &[3])]);
        let changeset = diff(&old, &new, &DiffOptions::default());
        let edits = all_section_edits(&changeset);
        assert!(edits.contains(&SectionEdit::Remove { from: 0 }));
        assert!(edits.contains(&SectionEdit::Insert { to: 1 }));
    }

    #[test]
    fn test_section_move() {
        let old = snapshot(&[("a", &[1]), ("b", &[2]), ("c", &[3])]);
        let new = snapshot(&[("c", &[3]), ("a", &[1]), ("b", &[2])]);
        let changeset = diff(&old, &new, &DiffOptions::default());
        assert_eq!(
            all_section_edits(&changeset),
            vec![SectionEdit::Move { from: 2, to: 0 }]
        );
    }

    #[test]
    fn test_cross_section_move_is_remove_plus_insert() {
        let old = snapshot(&[("a", &[1, 2]), ("b", &[])]);
        let new = snapshot(&[("a", &[1]), ("b", &[2])]);
        let changeset = diff(&old, &new, &DiffOptions::default());
        let edits = all_item_edits(&changeset);
        assert!(edits.contains(&ItemEdit::Remove {
            at: IndexPath::new(0, 1)
        }));
        assert!(edits.contains(&ItemEdit::Insert {
            at: IndexPath::new(1, 0)
        }));
        assert!(!edits.iter().any(|e| matches!(e, ItemEdit::Move { .. })));
    }

    #[test]
    fn test_reloads_come_before_structural_stages() {
        let old = snapshot(&[("a", &[1, 2, 3])]);
        let new = snapshot(&[("a", &[3, 1])]);
        let reloaded = old.item_at(IndexPath::new(0, 0)).unwrap();
        let mut reloads = HashSet::default();
        reloads.insert(reloaded);
        let changeset = diff_with_reloads(&old, &new, &reloads, &DiffOptions::default());
        let first = &changeset.stages()[0];
        assert!(matches!(first.item_edits[0], ItemEdit::Reload { .. }));
    }

    #[test]
    fn test_full_reload_threshold() {
        let old_items: Vec<u32> = (0..200).collect();
        let old = snapshot(&[("a", &old_items)]);
        let new = snapshot(&[("a", &[])]);
        let changeset = diff(&old, &new, &DiffOptions::default());
        assert!(changeset.is_full_reload());
        assert!(changeset.stages().is_empty());

        let unbounded = DiffOptions {
            full_reload_threshold: None,
        };
        let changeset = diff(&old, &new, &unbounded);
        assert!(!changeset.is_full_reload());
        assert_eq!(changeset.edit_count(), 200);
    }

    #[test]
    fn test_lis_mask() {
        let mask = longest_increasing_subsequence(&[3, 0, 1, 2]);
        assert_eq!(mask, vec![false, true, true, true]);
        let mask = longest_increasing_subsequence(&[0, 1, 2, 3]);
        assert!(mask.iter().all(|&k| k));
        assert!(longest_increasing_subsequence(&[]).is_empty());
    }
}
