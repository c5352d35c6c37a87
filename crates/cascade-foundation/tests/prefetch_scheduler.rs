//! End-to-end scheduler tests: visibility events in, coalesced start/cancel
//! signals out on the loader.

use std::thread::sleep;
use std::time::Duration;

use cascade_core::{ElementId, IndexPath, Snapshot};
use cascade_foundation::{
    compute_prefetch_set, PrefetchConfig, PrefetchScheduler, VisibleRange,
};
use cascade_testing::RecordingLoader;

fn test_config() -> PrefetchConfig {
    PrefetchConfig {
        coalesce_window: Duration::from_millis(10),
        ..PrefetchConfig::default()
    }
}

fn two_section_snapshot() -> Snapshot {
    let mut builder = Snapshot::builder();
    for section in ["a", "b"] {
        builder.push_section(&section);
        for item in 0..30 {
            builder.push_item(&(section, item));
        }
    }
    builder.build()
}

/// Ids the pure window computation expects for `visible`.
fn expected_ids(snapshot: &Snapshot, visible: &[VisibleRange]) -> Vec<ElementId> {
    let lengths: Vec<usize> = snapshot.sections().iter().map(|s| s.item_count()).collect();
    let window = compute_prefetch_set(visible, &lengths, &test_config());
    let mut ids = Vec::new();
    for (&section, indices) in &window {
        for &item in indices {
            ids.push(snapshot.item_at(IndexPath::new(section, item)).unwrap().into());
        }
    }
    ids
}

/// Drains until `predicate` holds or the deadline passes.
fn drain_until(
    scheduler: &PrefetchScheduler,
    loader: &mut RecordingLoader,
    predicate: impl Fn(&RecordingLoader) -> bool,
) {
    for _ in 0..100 {
        scheduler.drain(loader);
        if predicate(loader) {
            return;
        }
        sleep(Duration::from_millis(10));
    }
    panic!("scheduler produced no matching delta within the deadline");
}

fn matches_unordered(actual: &[ElementId], expected: &[ElementId]) -> bool {
    actual.len() == expected.len() && expected.iter().all(|id| actual.contains(id))
}

#[test]
fn test_starts_for_initial_window() {
    let snapshot = two_section_snapshot();
    let scheduler = PrefetchScheduler::new(test_config());
    let mut loader = RecordingLoader::new();

    let visible = vec![VisibleRange::new(0, 0, 5)];
    scheduler.visibility_changed(&snapshot, visible.clone());

    let expected = expected_ids(&snapshot, &visible);
    assert!(!expected.is_empty());
    drain_until(&scheduler, &mut loader, |l| {
        matches_unordered(&l.active(), &expected)
    });
    assert!(loader.cancels_follow_starts());
}

#[test]
fn test_burst_coalesces_to_latest() {
    let snapshot = two_section_snapshot();
    let scheduler = PrefetchScheduler::new(test_config());
    let mut loader = RecordingLoader::new();

    // a burst of scroll deltas inside one coalescing window: only the
    // latest range matters
    scheduler.visibility_changed(&snapshot, vec![VisibleRange::new(0, 0, 4)]);
    scheduler.visibility_changed(&snapshot, vec![VisibleRange::new(0, 3, 8)]);
    let latest = vec![VisibleRange::new(0, 10, 15)];
    scheduler.visibility_changed(&snapshot, latest.clone());

    let expected = expected_ids(&snapshot, &latest);
    drain_until(&scheduler, &mut loader, |l| {
        matches_unordered(&l.active(), &expected)
    });
    assert!(loader.cancels_follow_starts());
}

#[test]
fn test_window_shift_cancels_stale_ids() {
    let snapshot = two_section_snapshot();
    let scheduler = PrefetchScheduler::new(test_config());
    let mut loader = RecordingLoader::new();

    let first = vec![VisibleRange::new(0, 0, 5)];
    scheduler.visibility_changed(&snapshot, first.clone());
    let first_expected = expected_ids(&snapshot, &first);
    drain_until(&scheduler, &mut loader, |l| {
        matches_unordered(&l.active(), &first_expected)
    });

    // jump to the second section; everything from the first window cancels
    let second = vec![VisibleRange::new(1, 10, 15)];
    scheduler.visibility_changed(&snapshot, second.clone());
    let second_expected = expected_ids(&snapshot, &second);
    drain_until(&scheduler, &mut loader, |l| {
        matches_unordered(&l.active(), &second_expected)
    });

    assert!(loader.cancels_follow_starts());
    // every id from the first window got an explicit cancel
    for id in &first_expected {
        assert!(loader
            .events()
            .contains(&cascade_testing::LoaderEvent::Cancel(*id)));
    }
}

#[test]
fn test_unchanged_window_emits_nothing_new() {
    let snapshot = two_section_snapshot();
    let scheduler = PrefetchScheduler::new(test_config());
    let mut loader = RecordingLoader::new();

    let visible = vec![VisibleRange::new(0, 0, 5)];
    scheduler.visibility_changed(&snapshot, visible.clone());
    let expected = expected_ids(&snapshot, &visible);
    drain_until(&scheduler, &mut loader, |l| {
        matches_unordered(&l.active(), &expected)
    });
    let events_before = loader.events().len();

    // same window again: the recomputed set diffs to nothing
    scheduler.visibility_changed(&snapshot, visible);
    sleep(Duration::from_millis(80));
    scheduler.drain(&mut loader);
    assert_eq!(loader.events().len(), events_before);
}
