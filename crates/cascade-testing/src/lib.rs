//! Testing utilities and fixtures for Cascade.
//!
//! Provides compact snapshot builders, a changeset replay model that applies
//! staged edits the way a live view hierarchy would, scripted measurable
//! content, and a recording resource loader for prefetch assertions.

use cascade_core::{
    Changeset, ElementId, IndexPath, ItemEdit, ItemId, SectionEdit, SectionKey, Snapshot, Stage,
};
use cascade_foundation::{ContentHandle, RecyclableContent, ResourceLoader};
use cascade_ui_layout::{Constraints, Measurable, Size};

/// Builds a snapshot from `(section key, item keys)` pairs.
pub fn snapshot(sections: &[(&str, &[u32])]) -> Snapshot {
    let mut builder = Snapshot::builder();
    for (key, items) in sections {
        builder.push_section(key);
        for item in *items {
            builder.push_item(item);
        }
    }
    builder.build()
}

/// A model of the on-screen section/item structure that applies changeset
/// stages the way a live view hierarchy would: stage by stage, each stage
/// fully applied before the next.
#[derive(Clone, Debug)]
pub struct ReplayModel {
    sections: Vec<(SectionKey, Vec<ItemId>)>,
    reloaded: Vec<ItemId>,
}

impl ReplayModel {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            sections: snapshot
                .sections()
                .iter()
                .map(|s| (s.id(), s.items().to_vec()))
                .collect(),
            reloaded: Vec::new(),
        }
    }

    /// Ids that received a reload (rebind) while applying stages.
    pub fn reloaded(&self) -> &[ItemId] {
        &self.reloaded
    }

    /// True when the model's structure equals `snapshot`'s, ids and order.
    pub fn matches(&self, snapshot: &Snapshot) -> bool {
        self.sections.len() == snapshot.section_count()
            && self
                .sections
                .iter()
                .zip(snapshot.sections())
                .all(|((key, items), section)| {
                    *key == section.id() && items.as_slice() == section.items()
                })
    }

    /// Applies `changeset` on top of the current structure. Inserted sections
    /// and items are sourced from `new`, the snapshot the changeset targets.
    pub fn apply(&mut self, changeset: &Changeset, new: &Snapshot) {
        if changeset.is_full_reload() {
            *self = Self::from_snapshot(new);
            return;
        }
        for stage in changeset.stages() {
            self.apply_stage(stage, new);
        }
    }

    fn apply_stage(&mut self, stage: &Stage, new: &Snapshot) {
        // reloads and removes first, in the order the differ emitted them
        // (removes arrive descending, so indices never shift under us)
        for edit in &stage.item_edits {
            match *edit {
                ItemEdit::Reload { at } => {
                    let id = self.sections[at.section].1[at.item];
                    self.reloaded.push(id);
                }
                ItemEdit::Remove { at } => {
                    self.sections[at.section].1.remove(at.item);
                }
                ItemEdit::Insert { .. } | ItemEdit::Move { .. } => {}
            }
        }
        for edit in &stage.section_edits {
            if let SectionEdit::Remove { from } = *edit {
                self.sections.remove(from);
            }
        }

        self.arrange_sections(stage, new);
        self.arrange_items(stage, new);
    }

    /// Applies a stage's section inserts and moves as one batch: moved
    /// sections lift out of the post-removal list, then inserted and moved
    /// sections land at their target indices, stationary sections filling
    /// the gaps in order.
    fn arrange_sections(&mut self, stage: &Stage, new: &Snapshot) {
        let mut inserts: Vec<usize> = Vec::new();
        let mut moves: Vec<(usize, usize)> = Vec::new();
        for edit in &stage.section_edits {
            match *edit {
                SectionEdit::Insert { to } => inserts.push(to),
                SectionEdit::Move { from, to } => moves.push((from, to)),
                SectionEdit::Remove { .. } => {}
            }
        }
        if inserts.is_empty() && moves.is_empty() {
            return;
        }

        let mut lifted: Vec<(usize, (SectionKey, Vec<ItemId>))> = Vec::new();
        moves.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        for (from, to) in moves {
            lifted.push((to, self.sections.remove(from)));
        }

        let final_len = self.sections.len() + lifted.len() + inserts.len();
        let mut slots: Vec<Option<(SectionKey, Vec<ItemId>)>> = Vec::new();
        slots.resize_with(final_len, || None);
        for to in inserts {
            let section = new.section(to).expect("insert index within new snapshot");
            slots[to] = Some((section.id(), section.items().to_vec()));
        }
        for (to, entry) in lifted {
            slots[to] = Some(entry);
        }
        let mut stationary = std::mem::take(&mut self.sections).into_iter();
        self.sections = slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| stationary.next().expect("stationary section available"))
            })
            .collect();
        assert!(stationary.next().is_none(), "every section placed");
    }

    /// Applies a stage's item inserts and moves as one batch, mirroring
    /// [`ReplayModel::arrange_sections`] at item granularity.
    fn arrange_items(&mut self, stage: &Stage, new: &Snapshot) {
        let mut placements: Vec<(IndexPath, ItemId)> = Vec::new();
        let mut moves: Vec<(IndexPath, IndexPath)> = Vec::new();
        for edit in &stage.item_edits {
            match *edit {
                ItemEdit::Move { from, to } => moves.push((from, to)),
                ItemEdit::Insert { at } => {
                    let id = new.item_at(at).expect("insert path within new snapshot");
                    placements.push((at, id));
                }
                ItemEdit::Reload { .. } | ItemEdit::Remove { .. } => {}
            }
        }
        if placements.is_empty() && moves.is_empty() {
            return;
        }

        moves.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        for (from, to) in moves {
            let id = self.sections[from.section].1.remove(from.item);
            placements.push((to, id));
        }

        placements.sort_unstable_by_key(|&(path, _)| path);
        for (path, id) in placements {
            self.sections[path.section].1.insert(path.item, id);
        }
    }
}

/// Diffs `old` against `new`, replays the result, and panics with context if
/// the replay does not land exactly on `new`.
pub fn assert_replay_matches(old: &Snapshot, new: &Snapshot, changeset: &Changeset) {
    let mut model = ReplayModel::from_snapshot(old);
    model.apply(changeset, new);
    assert!(
        model.matches(new),
        "replay diverged\n changeset: {changeset:?}\n model: {model:?}\n expected: {new:?}"
    );
}

/// Scripted measurable content for recycling and self-sizing tests.
#[derive(Debug)]
pub struct TestContent {
    natural: Size,
    greedy: bool,
    content_type: Option<u64>,
    bound: Option<ElementId>,
    pub measure_count: usize,
    pub bind_count: usize,
}

impl TestContent {
    pub fn new(natural: Size) -> Self {
        Self {
            natural,
            greedy: false,
            content_type: None,
            bound: None,
            measure_count: 0,
            bind_count: 0,
        }
    }

    /// Makes the content fill whatever constraints it is measured against,
    /// echoing infinity when unbounded.
    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    pub fn with_content_type(mut self, content_type: u64) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn boxed(self) -> ContentHandle {
        Box::new(self)
    }
}

impl Measurable for TestContent {
    fn measure(&mut self, constraints: Constraints) -> Size {
        self.measure_count += 1;
        if self.greedy {
            Size::new(constraints.max_width, constraints.max_height)
        } else {
            let (w, h) = constraints.constrain(self.natural.width, self.natural.height);
            Size::new(w, h)
        }
    }
}

impl RecyclableContent for TestContent {
    fn bind(&mut self, id: ElementId) {
        self.bind_count += 1;
        self.bound = Some(id);
    }

    fn unbind(&mut self) {
        self.bound = None;
    }

    fn bound_id(&self) -> Option<ElementId> {
        self.bound
    }

    fn content_type(&self) -> Option<u64> {
        self.content_type
    }
}

/// What a [`RecordingLoader`] saw, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoaderEvent {
    Start(ElementId),
    Cancel(ElementId),
}

/// Resource loader that records every signal for later assertions.
#[derive(Debug, Default)]
pub struct RecordingLoader {
    events: Vec<LoaderEvent>,
}

impl RecordingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[LoaderEvent] {
        &self.events
    }

    /// Ids with a start that has not been cancelled since.
    pub fn active(&self) -> Vec<ElementId> {
        let mut active: Vec<ElementId> = Vec::new();
        for event in &self.events {
            match *event {
                LoaderEvent::Start(id) => active.push(id),
                LoaderEvent::Cancel(id) => active.retain(|&a| a != id),
            }
        }
        active
    }

    /// True when every cancel for an id comes after a start for it.
    pub fn cancels_follow_starts(&self) -> bool {
        let mut started: Vec<ElementId> = Vec::new();
        for event in &self.events {
            match *event {
                LoaderEvent::Start(id) => started.push(id),
                LoaderEvent::Cancel(id) => {
                    if !started.contains(&id) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

impl ResourceLoader for RecordingLoader {
    fn start(&mut self, id: ElementId) {
        self.events.push(LoaderEvent::Start(id));
    }

    fn cancel(&mut self, id: ElementId) {
        self.events.push(LoaderEvent::Cancel(id));
    }
}
