//! Replay tests for the snapshot differ: applying the computed stages in
//! order to a model initialized as `old` must land exactly on `new`.

use cascade_core::collections::map::HashSet;
use cascade_core::{diff, diff_with_reloads, DiffOptions, IndexPath, Snapshot};
use cascade_testing::{assert_replay_matches, snapshot, ReplayModel};

fn unbounded() -> DiffOptions {
    DiffOptions {
        full_reload_threshold: None,
    }
}

fn check(old: &Snapshot, new: &Snapshot) {
    let changeset = diff(old, new, &unbounded());
    assert_replay_matches(old, new, &changeset);
}

#[test]
fn test_replay_identical() {
    let snap = snapshot(&[("a", &[1, 2, 3]), ("b", &[4, 5])]);
    let changeset = diff(&snap, &snap.clone(), &unbounded());
    assert!(changeset.is_empty());
    assert_replay_matches(&snap, &snap.clone(), &changeset);
}

#[test]
fn test_replay_inserts_and_removes() {
    check(
        &snapshot(&[("a", &[1, 2, 3])]),
        &snapshot(&[("a", &[0, 2, 4, 5])]),
    );
    check(&snapshot(&[("a", &[])]), &snapshot(&[("a", &[1, 2, 3])]));
    check(&snapshot(&[("a", &[1, 2, 3])]), &snapshot(&[("a", &[])]));
}

#[test]
fn test_replay_moves_within_section() {
    check(
        &snapshot(&[("a", &[1, 2, 3, 4, 5])]),
        &snapshot(&[("a", &[5, 3, 1, 2, 4])]),
    );
    check(
        &snapshot(&[("a", &[1, 2, 3, 4])]),
        &snapshot(&[("a", &[4, 3, 2, 1])]),
    );
}

#[test]
fn test_replay_section_move_with_item_edits_inside() {
    // a section moves while items are inserted and removed inside it: the
    // combination that forces staged application
    check(
        &snapshot(&[("a", &[1, 2]), ("b", &[10, 11, 12]), ("c", &[20])]),
        &snapshot(&[("b", &[11, 13, 10]), ("c", &[20]), ("a", &[2])]),
    );
}

#[test]
fn test_replay_section_insert_remove_and_move() {
    check(
        &snapshot(&[("a", &[1]), ("b", &[2]), ("c", &[3])]),
        &snapshot(&[("d", &[9, 8]), ("c", &[3]), ("a", &[1])]),
    );
}

#[test]
fn test_replay_item_key_crossing_sections() {
    // the same caller key leaves one section and enters another; ids differ,
    // so the differ must emit remove + insert, never a cross-section move
    check(
        &snapshot(&[("a", &[1, 2, 3]), ("b", &[7])]),
        &snapshot(&[("a", &[1, 3]), ("b", &[7, 2])]),
    );
}

#[test]
fn test_replay_records_reloads() {
    let old = snapshot(&[("a", &[1, 2, 3])]);
    let new = snapshot(&[("a", &[3, 1, 2])]);
    let reloaded_id = old.item_at(IndexPath::new(0, 0)).unwrap();
    let mut reloads = HashSet::default();
    reloads.insert(reloaded_id);

    let changeset = diff_with_reloads(&old, &new, &reloads, &unbounded());
    let mut model = ReplayModel::from_snapshot(&old);
    model.apply(&changeset, &new);
    assert!(model.matches(&new));
    assert_eq!(model.reloaded(), &[reloaded_id]);
}

#[test]
fn test_replay_full_reload() {
    let old_items: Vec<u32> = (0..300).collect();
    let old = snapshot(&[("a", &old_items)]);
    let new = snapshot(&[("b", &[1])]);
    let changeset = diff(&old, &new, &DiffOptions::default());
    assert!(changeset.is_full_reload());
    assert_replay_matches(&old, &new, &changeset);
}

/// xorshift64*, good enough to sweep structurally varied snapshot pairs
/// without pulling a dependency into the test.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }
}

fn random_snapshot(rng: &mut Rng) -> Snapshot {
    const SECTION_POOL: [&str; 6] = ["s0", "s1", "s2", "s3", "s4", "s5"];
    let mut builder = Snapshot::builder();
    let mut order: Vec<&str> = SECTION_POOL.to_vec();
    // partial shuffle, then keep a prefix
    for i in (1..order.len()).rev() {
        order.swap(i, rng.below(i + 1));
    }
    let section_count = 1 + rng.below(SECTION_POOL.len());
    for key in order.into_iter().take(section_count) {
        builder.push_section(&key);
        let mut items: Vec<u32> = (0..12).collect();
        for i in (1..items.len()).rev() {
            items.swap(i, rng.below(i + 1));
        }
        let item_count = rng.below(items.len() + 1);
        for item in items.into_iter().take(item_count) {
            builder.push_item(&item);
        }
    }
    builder.build()
}

#[test]
fn test_replay_random_pairs() {
    let mut rng = Rng(0x9E37_79B9_7F4A_7C15);
    for _ in 0..200 {
        let old = random_snapshot(&mut rng);
        let new = random_snapshot(&mut rng);
        let changeset = diff(&old, &new, &unbounded());
        assert_replay_matches(&old, &new, &changeset);
    }
}

#[test]
fn test_replay_random_pairs_with_threshold() {
    let mut rng = Rng(0x0123_4567_89AB_CDEF);
    let options = DiffOptions {
        full_reload_threshold: Some(10),
    };
    for _ in 0..100 {
        let old = random_snapshot(&mut rng);
        let new = random_snapshot(&mut rng);
        let changeset = diff(&old, &new, &options);
        assert!(changeset.edit_count() <= 10 || changeset.is_full_reload());
        assert_replay_matches(&old, &new, &changeset);
    }
}
