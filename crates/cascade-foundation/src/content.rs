//! The reusable content handle contract.
//!
//! A content handle is an opaque, owned rendering object bound to at most one
//! element at a time. The core never inspects what is behind the trait; it
//! only binds, unbinds, measures, and recycles.

use cascade_core::ElementId;
use cascade_ui_layout::Measurable;

/// A reusable rendering object.
///
/// Lifecycle: created lazily on first need, rebound in place when a slot is
/// reused for a different but type-compatible element, released back to a
/// cache, and dropped on eviction or explicit invalidation. A handle is
/// either bound to exactly one element or idle; the caches only ever hold
/// idle handles.
pub trait RecyclableContent: Measurable {
    /// Binds the handle to `id`, rebinding in place if it was bound before.
    fn bind(&mut self, id: ElementId);

    /// Releases the current binding.
    fn unbind(&mut self);

    /// The element this handle currently renders, if any.
    fn bound_id(&self) -> Option<ElementId>;

    /// Reuse-compatibility class. Handles are only rebound across elements
    /// that share a content type; `None` is compatible with anything.
    fn content_type(&self) -> Option<u64> {
        None
    }
}

/// Owned handle to recyclable content.
pub type ContentHandle = Box<dyn RecyclableContent>;

/// True when a cached handle of `cached` type may serve an element expecting
/// `wanted`.
pub(crate) fn content_type_compatible(cached: Option<u64>, wanted: Option<u64>) -> bool {
    match (cached, wanted) {
        (None, _) | (_, None) => true,
        (Some(a), Some(b)) => a == b,
    }
}
