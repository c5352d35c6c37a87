//! Content recycling, prefetch scheduling, and reorder mutations for Cascade.
//!
//! Everything here is UI-thread-only except the prefetch computation, which
//! runs on a background worker and hands results back over a channel.

mod content;
pub mod prefetch;
pub mod recycle;
mod reorder;

pub use content::{ContentHandle, RecyclableContent};
pub use prefetch::{
    compute_prefetch_set, PrefetchConfig, PrefetchDelta, PrefetchScheduler, PrefetchSet,
    ResourceLoader, VisibleRange,
};
pub use recycle::{LruCache, RecycleStats, ReusePool, DEFAULT_AUTO_CAPACITY};
pub use reorder::SectionStore;

pub mod prelude {
    pub use crate::content::{ContentHandle, RecyclableContent};
    pub use crate::prefetch::{PrefetchConfig, PrefetchScheduler, ResourceLoader, VisibleRange};
    pub use crate::recycle::ReusePool;
    pub use crate::reorder::SectionStore;
}
