//! Prefetch window computation and scheduling.
//!
//! Anticipates scrolling by warming items just outside the visible window,
//! including across section boundaries: when the visible edge is close to a
//! section's start or end, the adjacent section's tail or head is warmed
//! before any of its items become visible.

mod scheduler;

pub use scheduler::{PrefetchDelta, PrefetchScheduler, ResourceLoader};

use cascade_core::collections::map::HashMap;
use web_time::Duration;

/// Items to warm beyond the last visible index.
pub const DEFAULT_LOOKAHEAD: usize = 5;
/// Items to warm before the first visible index.
pub const DEFAULT_LOOKBEHIND: usize = 5;
/// How long visibility events buffer before one computation runs.
pub const DEFAULT_COALESCE_WINDOW: Duration = Duration::from_millis(100);

/// Tuning for the prefetch window and its scheduler.
#[derive(Clone, Debug)]
pub struct PrefetchConfig {
    pub lookahead: usize,
    pub lookbehind: usize,
    pub coalesce_window: Duration,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            lookahead: DEFAULT_LOOKAHEAD,
            lookbehind: DEFAULT_LOOKBEHIND,
            coalesce_window: DEFAULT_COALESCE_WINDOW,
        }
    }
}

/// Inclusive range of visible items within one section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibleRange {
    pub section: usize,
    pub first: usize,
    pub last: usize,
}

impl VisibleRange {
    pub const fn new(section: usize, first: usize, last: usize) -> Self {
        Self {
            section,
            first,
            last,
        }
    }
}

/// Section index → item indices scheduled for prefetch. Transient; rebuilt
/// on every coalesced tick.
pub type PrefetchSet = HashMap<usize, Vec<usize>>;

/// Computes the prefetch set for the given visible ranges.
///
/// Ranges are expected ordered by section, at most one per section.
/// Out-of-range input clamps to section bounds; a malformed range is skipped
/// with a diagnostic rather than failing the tick.
pub fn compute_prefetch_set(
    visible: &[VisibleRange],
    section_lengths: &[usize],
    config: &PrefetchConfig,
) -> PrefetchSet {
    let mut set: PrefetchSet = HashMap::default();
    let mut push = |section: usize, index: usize| {
        set.entry(section).or_default().push(index);
    };

    for range in visible {
        let Some(&len) = section_lengths.get(range.section) else {
            log::debug!("prefetch: visible range for unknown section {}", range.section);
            continue;
        };
        if len == 0 || range.first > range.last {
            log::debug!("prefetch: degenerate visible range {range:?} skipped");
            continue;
        }
        let first = range.first.min(len - 1);
        let last = range.last.min(len - 1);

        for i in first.saturating_sub(config.lookbehind)..first {
            push(range.section, i);
        }
        for i in (last + 1)..=(last + config.lookahead).min(len - 1) {
            push(range.section, i);
        }
    }

    // Leading boundary: about to scroll backwards into the previous section.
    if let Some(leading) = visible.first() {
        if leading.first < config.lookahead && leading.section > 0 {
            let prev = leading.section - 1;
            if let Some(&prev_len) = section_lengths.get(prev) {
                for i in prev_len.saturating_sub(config.lookahead)..prev_len {
                    push(prev, i);
                }
            }
        }
    }

    // Trailing boundary: about to scroll forwards into the next section.
    if let Some(trailing) = visible.last() {
        if let Some(&len) = section_lengths.get(trailing.section) {
            let next = trailing.section + 1;
            if len > 0
                && len - 1 - trailing.last.min(len - 1) < config.lookahead
                && next < section_lengths.len()
            {
                let next_len = section_lengths[next];
                for i in 0..config.lookahead.min(next_len) {
                    push(next, i);
                }
            }
        }
    }

    // Visible items never prefetch; a multi-section window can otherwise
    // re-add them through the boundary passes.
    for range in visible {
        if let Some(indices) = set.get_mut(&range.section) {
            indices.retain(|&i| i < range.first || i > range.last);
        }
    }

    set.retain(|_, indices| {
        indices.sort_unstable();
        indices.dedup();
        !indices.is_empty()
    });
    set
}
