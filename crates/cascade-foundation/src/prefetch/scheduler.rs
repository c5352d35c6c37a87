//! Background prefetch scheduler.
//!
//! Per active viewport the scheduler runs `Idle → Coalescing → Computing →
//! Idle`: visibility events buffer for a short window and collapse to the
//! latest one, then the prefetch window is computed off the UI thread and the
//! delta against the currently-prefetching set comes back over a channel.
//! The UI thread drains deltas and forwards them to the resource loader.
//!
//! Only the latest coalesced tick matters: a newer visibility event observed
//! during the coalescing window replaces the buffered one outright. Cancels
//! are only ever emitted for ids whose start was emitted by an earlier delta,
//! and deltas apply in emission order, so a cancel can never overtake its
//! start.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use cascade_core::collections::map::HashSet;
use cascade_core::{ElementId, IndexPath, Snapshot};
use web_time::Instant;

use super::{compute_prefetch_set, PrefetchConfig, VisibleRange};

/// External resource loader the scheduler drives. Both calls are
/// fire-and-forget; cancellation must be idempotent and safe against loads
/// that already completed.
pub trait ResourceLoader {
    fn start(&mut self, id: ElementId);
    fn cancel(&mut self, id: ElementId);
}

/// One computed tick's worth of prefetch changes.
#[derive(Clone, Debug, Default)]
pub struct PrefetchDelta {
    pub start: Vec<ElementId>,
    pub cancel: Vec<ElementId>,
}

enum WorkerMessage {
    Visibility {
        snapshot: Snapshot,
        visible: Vec<VisibleRange>,
    },
    Shutdown,
}

/// Owns the background worker for one viewport.
///
/// All methods are called from the UI thread; the worker communicates back
/// exclusively through the result channel (message passing, no shared
/// mutable state).
pub struct PrefetchScheduler {
    tx: mpsc::Sender<WorkerMessage>,
    results: mpsc::Receiver<PrefetchDelta>,
    active: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl PrefetchScheduler {
    pub fn new(config: PrefetchConfig) -> Self {
        let (tx, worker_rx) = mpsc::channel();
        let (result_tx, results) = mpsc::channel();
        let active = Arc::new(AtomicBool::new(true));
        let worker_active = Arc::clone(&active);
        let worker = std::thread::spawn(move || {
            worker_loop(worker_rx, result_tx, config, worker_active);
        });
        Self {
            tx,
            results,
            active,
            worker: Some(worker),
        }
    }

    /// Reports that the visible index window changed.
    ///
    /// Cheap to call on every scroll delta; the worker coalesces bursts and
    /// only the latest event is computed.
    pub fn visibility_changed(&self, snapshot: &Snapshot, visible: Vec<VisibleRange>) {
        let message = WorkerMessage::Visibility {
            snapshot: snapshot.clone(),
            visible,
        };
        if self.tx.send(message).is_err() {
            log::warn!("prefetch: worker gone; visibility event dropped");
        }
    }

    /// Applies every queued delta to `loader`, in emission order. Returns
    /// how many deltas were applied.
    pub fn drain(&self, loader: &mut dyn ResourceLoader) -> usize {
        let mut applied = 0;
        while let Ok(delta) = self.results.try_recv() {
            for id in delta.start {
                loader.start(id);
            }
            for id in delta.cancel {
                loader.cancel(id);
            }
            applied += 1;
        }
        applied
    }
}

impl Drop for PrefetchScheduler {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        let _ = self.tx.send(WorkerMessage::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(
    rx: mpsc::Receiver<WorkerMessage>,
    tx: mpsc::Sender<PrefetchDelta>,
    config: PrefetchConfig,
    active: Arc<AtomicBool>,
) {
    // the authoritative "currently prefetching" set lives here; the UI side
    // only ever sees deltas
    let mut prefetching: HashSet<ElementId> = HashSet::default();

    while active.load(Ordering::SeqCst) {
        let Ok(message) = rx.recv() else { return };
        let mut latest = match message {
            WorkerMessage::Visibility { snapshot, visible } => (snapshot, visible),
            WorkerMessage::Shutdown => return,
        };

        // Coalescing: collapse the burst down to the newest event.
        let deadline = Instant::now() + config.coalesce_window;
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match rx.recv_timeout(deadline - now) {
                Ok(WorkerMessage::Visibility { snapshot, visible }) => {
                    latest = (snapshot, visible);
                }
                Ok(WorkerMessage::Shutdown) => return,
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => return,
            }
        }
        if !active.load(Ordering::SeqCst) {
            return;
        }

        // Computing: window analysis off the UI thread.
        let (snapshot, visible) = latest;
        let lengths: Vec<usize> = snapshot
            .sections()
            .iter()
            .map(|s| s.item_count())
            .collect();
        let window = compute_prefetch_set(&visible, &lengths, &config);

        let mut wanted: HashSet<ElementId> = HashSet::default();
        for (&section, indices) in &window {
            for &item in indices {
                if let Some(id) = snapshot.item_at(IndexPath::new(section, item)) {
                    wanted.insert(id.into());
                }
            }
        }

        let start: Vec<ElementId> = wanted.difference(&prefetching).copied().collect();
        let cancel: Vec<ElementId> = prefetching.difference(&wanted).copied().collect();
        prefetching = wanted;

        if start.is_empty() && cancel.is_empty() {
            continue;
        }
        if tx.send(PrefetchDelta { start, cancel }).is_err() {
            return;
        }
    }
}
