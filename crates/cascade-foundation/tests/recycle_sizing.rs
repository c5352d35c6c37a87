//! Cell-reuse flow across the recycling pool and the self-sizing
//! negotiator: create on miss, bind, negotiate, retire, rebind on reuse.

use cascade_core::{ElementId, ItemId, ItemKey, SectionKey};
use cascade_foundation::{ContentHandle, ReusePool};
use cascade_testing::TestContent;
use cascade_ui_layout::{negotiate, AxisFit, Size, SizeLimits};

fn id(n: u32) -> ElementId {
    ItemId::new(SectionKey::new(&"feed"), ItemKey::new(&n)).into()
}

#[test]
fn test_reuse_cycle_with_negotiated_sizes() {
    let mut pool = ReusePool::new(8);
    let target = Size::new(200.0, 600.0);
    let estimate = Size::new(200.0, 48.0);

    // first appearance: miss, create, bind, size
    assert!(pool.dequeue(id(1), None).is_none());
    let mut handle: ContentHandle = TestContent::new(Size::new(320.0, 120.0)).boxed();
    handle.bind(id(1));
    let outcome = negotiate(
        &mut *handle,
        target,
        AxisFit::fixed_width(),
        SizeLimits::default(),
        estimate,
    );
    assert_eq!(outcome.size, Size::new(200.0, 120.0));
    assert!(!outcome.deferred);

    // scrolled offscreen: retire the handle
    pool.store(id(1), handle);

    // scrolled back: the same id reuses the parked handle, rebinding it
    let mut handle = pool.dequeue(id(1), None).expect("parked handle reused");
    assert_eq!(handle.bound_id(), None);
    handle.bind(id(1));
    assert_eq!(handle.bound_id(), Some(id(1)));

    let stats = pool.stats();
    assert_eq!(stats.reuse_count, 1);
    assert_eq!(stats.miss_count, 1);
}

#[test]
fn test_greedy_content_sizes_through_trait_object() {
    let mut handle: ContentHandle = TestContent::new(Size::ZERO).greedy().boxed();
    let outcome = negotiate(
        &mut *handle,
        Size::new(180.0, 400.0),
        AxisFit::fixed_width(),
        SizeLimits::at_most(Size::new(180.0, 300.0)),
        Size::new(180.0, 48.0),
    );
    // greedy content re-measures against the bounding box, then the caller
    // maximum clamps it
    assert_eq!(outcome.size, Size::new(180.0, 300.0));
    assert!(!outcome.deferred);
}

#[test]
fn test_content_type_gates_rebinding() {
    let mut pool = ReusePool::new(8);
    pool.store(id(3), TestContent::new(Size::ZERO).with_content_type(7).boxed());
    // a slot expecting a different content type cannot take this handle
    assert!(pool.dequeue(id(3), Some(8)).is_none());
    pool.store(id(4), TestContent::new(Size::ZERO).with_content_type(7).boxed());
    assert!(pool.dequeue(id(4), Some(7)).is_some());
}
