//! Masonry ("waterfall") layout engine.
//!
//! Balances each section's items across N columns by always placing the next
//! item in the currently shortest column. Item heights are cached per
//! positional index — estimated until a measurement or delegate supplies the
//! real value — and a post-measurement correction invalidates only the
//! elements laid out after the corrected index, not the whole collection:
//! masonry placement is order-dependent, so a height change upstream can
//! shift every downstream column assignment, but nothing upstream of it.

use cascade_core::{IndexPath, Snapshot};
use smallvec::SmallVec;

use crate::attributes::{ElementKind, LayoutAttributes};
use crate::geometry::Rect;

/// Supplementary kind the engine lays out above a section's items.
pub const HEADER_KIND: &str = "header";
/// Supplementary kind the engine lays out below a section's items.
pub const FOOTER_KIND: &str = "footer";

/// How many columns a masonry pass uses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColumnCount {
    /// A fixed number of columns, clamped to at least one.
    Fixed(usize),
    /// As many columns of at least `min_column_width` as fit the content
    /// width, always at least one.
    Adaptive { min_column_width: f32 },
}

/// Immutable configuration for one layout pass.
///
/// Changing any field is a bulk invalidation: call
/// [`MasonryLayout::set_config`] and the next [`MasonryLayout::prepare`]
/// recomputes every section.
#[derive(Clone, Debug)]
pub struct MasonryConfig {
    pub columns: ColumnCount,
    pub content_width: f32,
    /// Vertical gap between items stacked in one column.
    pub item_spacing: f32,
    /// Horizontal gap between columns.
    pub column_spacing: f32,
    /// Gap between consecutive non-empty sections.
    pub section_spacing: f32,
    /// Height assumed for an item until measured.
    pub estimated_item_height: f32,
    /// Height assumed for headers and footers until measured.
    pub estimated_supplementary_height: f32,
}

impl Default for MasonryConfig {
    fn default() -> Self {
        Self {
            columns: ColumnCount::Fixed(2),
            content_width: 0.0,
            item_spacing: 0.0,
            column_spacing: 0.0,
            section_spacing: 0.0,
            estimated_item_height: 48.0,
            estimated_supplementary_height: 48.0,
        }
    }
}

impl MasonryConfig {
    /// The column count this configuration resolves to. Never zero.
    pub fn resolved_column_count(&self) -> usize {
        match self.columns {
            ColumnCount::Fixed(n) => n.max(1),
            ColumnCount::Adaptive { min_column_width } => {
                let slot = min_column_width + self.column_spacing;
                if slot <= 0.0 {
                    1
                } else {
                    let fit = (self.content_width + self.column_spacing) / slot;
                    (fit.floor() as usize).max(1)
                }
            }
        }
    }

    /// Width of a single column under this configuration.
    pub fn column_width(&self) -> f32 {
        let n = self.resolved_column_count() as f32;
        ((self.content_width - (n - 1.0) * self.column_spacing) / n).max(0.0)
    }
}

/// Cached geometry for one section.
#[derive(Clone, Debug, Default)]
struct SectionState {
    origin_y: f32,
    height: f32,
    item_heights: Vec<f32>,
    /// Column index each item was assigned to, parallel to `item_heights`.
    item_columns: Vec<usize>,
    attributes: Vec<LayoutAttributes>,
    header: Option<LayoutAttributes>,
    footer: Option<LayoutAttributes>,
    header_height: f32,
    footer_height: f32,
    has_header: bool,
    has_footer: bool,
}

impl SectionState {
    fn contributes(&self) -> bool {
        self.height > 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Dirty {
    Clean,
    /// Everything at or after this path needs re-layout.
    From(IndexPath),
    All,
}

impl Default for Dirty {
    fn default() -> Self {
        Dirty::All
    }
}

impl Dirty {
    fn merge_from(&mut self, path: IndexPath) {
        *self = match *self {
            Dirty::All => Dirty::All,
            Dirty::Clean => Dirty::From(path),
            Dirty::From(existing) => Dirty::From(existing.min(path)),
        };
    }
}

/// The masonry layout engine.
///
/// Owns per-section cached geometry and recomputes lazily: callers mutate
/// heights or configuration, then run [`MasonryLayout::prepare`] once per
/// layout pass.
#[derive(Debug, Default)]
pub struct MasonryLayout {
    config: MasonryConfig,
    sections: Vec<SectionState>,
    content_height: f32,
    dirty: Dirty,
}

impl MasonryLayout {
    pub fn new(config: MasonryConfig) -> Self {
        Self {
            config,
            sections: Vec::new(),
            content_height: 0.0,
            dirty: Dirty::All,
        }
    }

    pub fn config(&self) -> &MasonryConfig {
        &self.config
    }

    /// Replaces the configuration. Bulk-invalidates every section.
    pub fn set_config(&mut self, config: MasonryConfig) {
        self.config = config;
        self.dirty = Dirty::All;
    }

    /// Marks every section for re-layout without touching cached heights.
    pub fn invalidate_all(&mut self) {
        self.dirty = Dirty::All;
    }

    /// Total height of the laid-out content.
    pub fn content_height(&self) -> f32 {
        self.content_height
    }

    /// Cached height for the item at `path`, if the path is valid.
    pub fn item_height(&self, path: IndexPath) -> Option<f32> {
        self.sections
            .get(path.section)?
            .item_heights
            .get(path.item)
            .copied()
    }

    /// Records a corrected height for the item at `path`, typically the
    /// result of self-sizing after the initial estimated pass.
    ///
    /// Only elements laid out after `path` are invalidated. Returns whether
    /// anything changed.
    pub fn update_item_height(&mut self, path: IndexPath, height: f32) -> bool {
        if !height.is_finite() || height < 0.0 {
            log::warn!("masonry: ignoring anomalous height {height} for {path:?}");
            return false;
        }
        let Some(slot) = self
            .sections
            .get_mut(path.section)
            .and_then(|s| s.item_heights.get_mut(path.item))
        else {
            log::debug!("masonry: height update for out-of-range {path:?} ignored");
            return false;
        };
        if *slot == height {
            return false;
        }
        *slot = height;
        self.dirty.merge_from(path);
        true
    }

    /// Records a corrected header height for `section`.
    pub fn update_header_height(&mut self, section: usize, height: f32) -> bool {
        self.update_supplementary_height(section, ElementKind::Header, height)
    }

    /// Records a corrected footer height for `section`.
    pub fn update_footer_height(&mut self, section: usize, height: f32) -> bool {
        self.update_supplementary_height(section, ElementKind::Footer, height)
    }

    fn update_supplementary_height(
        &mut self,
        section: usize,
        kind: ElementKind,
        height: f32,
    ) -> bool {
        if !height.is_finite() || height < 0.0 {
            log::warn!("masonry: ignoring anomalous {kind:?} height {height}");
            return false;
        }
        let Some(state) = self.sections.get_mut(section) else {
            log::debug!("masonry: {kind:?} height update for out-of-range section {section}");
            return false;
        };
        let (slot, dirty_item) = match kind {
            ElementKind::Header => (&mut state.header_height, 0),
            ElementKind::Footer => (&mut state.footer_height, state.item_heights.len()),
            ElementKind::Item => unreachable!("items go through update_item_height"),
        };
        if *slot == height {
            return false;
        }
        *slot = height;
        self.dirty.merge_from(IndexPath::new(section, dirty_item));
        true
    }

    /// Recomputes geometry for everything invalidated since the last pass.
    ///
    /// `snapshot` supplies the structure (section/item counts and
    /// header/footer declarations). Structural changes are detected here and
    /// invalidate from the first differing section; cached heights are
    /// carried positionally across them.
    pub fn prepare(&mut self, snapshot: &Snapshot) {
        self.sync_structure(snapshot);

        let start_section = match self.dirty {
            Dirty::Clean => return,
            Dirty::All => IndexPath::new(0, 0),
            Dirty::From(path) => path,
        };

        let mut cursor = 0.0f32;
        let mut any_contributed = false;
        for si in 0..self.sections.len() {
            if si < start_section.section {
                // clean prefix: advance the cursor off cached geometry
                let state = &self.sections[si];
                if state.contributes() {
                    cursor = state.origin_y + state.height;
                    any_contributed = true;
                }
                continue;
            }
            let resume_item = if si == start_section.section {
                start_section.item
            } else {
                0
            };
            let contributed = self.layout_section(si, &mut cursor, any_contributed, resume_item);
            any_contributed |= contributed;
        }

        self.content_height = cursor;
        self.dirty = Dirty::Clean;
    }

    /// Attributes for the item at `path`, if laid out.
    pub fn item_attributes(&self, path: IndexPath) -> Option<LayoutAttributes> {
        self.sections
            .get(path.section)?
            .attributes
            .get(path.item)
            .copied()
    }

    /// Attributes for a section's header, if it has one.
    pub fn header_attributes(&self, section: usize) -> Option<LayoutAttributes> {
        self.sections.get(section)?.header
    }

    /// Attributes for a section's footer, if it has one.
    pub fn footer_attributes(&self, section: usize) -> Option<LayoutAttributes> {
        self.sections.get(section)?.footer
    }

    /// Every element whose frame intersects `rect`.
    ///
    /// A full-scan intersection test over the cached frames; fine at
    /// cached-item-count scale.
    pub fn attributes_in_rect(&self, rect: Rect) -> Vec<LayoutAttributes> {
        let mut hits = Vec::new();
        for state in &self.sections {
            if let Some(header) = state.header {
                if header.frame.intersects(&rect) {
                    hits.push(header);
                }
            }
            for attrs in &state.attributes {
                if attrs.frame.intersects(&rect) {
                    hits.push(*attrs);
                }
            }
            if let Some(footer) = state.footer {
                if footer.frame.intersects(&rect) {
                    hits.push(footer);
                }
            }
        }
        hits
    }

    /// Aligns cached section state with the snapshot's structure, carrying
    /// cached heights positionally and invalidating from the first
    /// structural difference.
    fn sync_structure(&mut self, snapshot: &Snapshot) {
        let estimated_item = self.config.estimated_item_height;
        let estimated_supplementary = self.config.estimated_supplementary_height;

        for (si, section) in snapshot.sections().iter().enumerate() {
            let count = section.item_count();
            let has_header = section.has_supplementary(HEADER_KIND);
            let has_footer = section.has_supplementary(FOOTER_KIND);

            if si >= self.sections.len() {
                self.dirty.merge_from(IndexPath::new(si, 0));
                self.sections.push(SectionState {
                    item_heights: vec![estimated_item; count],
                    item_columns: vec![0; count],
                    header_height: estimated_supplementary,
                    footer_height: estimated_supplementary,
                    has_header,
                    has_footer,
                    ..SectionState::default()
                });
                continue;
            }

            let state = &mut self.sections[si];
            if state.item_heights.len() != count
                || state.has_header != has_header
                || state.has_footer != has_footer
            {
                state.item_heights.resize(count, estimated_item);
                state.item_columns.resize(count, 0);
                state.has_header = has_header;
                state.has_footer = has_footer;
                self.dirty.merge_from(IndexPath::new(si, 0));
            }
        }

        if self.sections.len() > snapshot.section_count() {
            self.sections.truncate(snapshot.section_count());
            self.dirty.merge_from(IndexPath::new(snapshot.section_count(), 0));
        }
    }

    /// Lays out one section starting at `resume_item`, advancing `cursor`
    /// past it. Returns whether the section occupies any height.
    ///
    /// When `resume_item > 0` the section's origin, header, and the frames of
    /// items before `resume_item` are trusted as cached; the per-column
    /// running heights are replayed from the cached column assignments.
    fn layout_section(
        &mut self,
        si: usize,
        cursor: &mut f32,
        any_contributed: bool,
        resume_item: usize,
    ) -> bool {
        let column_count = self.config.resolved_column_count();
        let column_width = self.config.column_width();
        let column_stride = column_width + self.config.column_spacing;
        let item_spacing = self.config.item_spacing;
        let content_width = self.config.content_width;

        let state = &mut self.sections[si];
        let item_count = state.item_heights.len();
        let resume_item = resume_item.min(item_count);

        let occupied = item_count > 0 || state.has_header || state.has_footer;
        if !occupied {
            state.origin_y = *cursor;
            state.height = 0.0;
            state.attributes.clear();
            state.header = None;
            state.footer = None;
            return false;
        }

        let origin_y = if resume_item > 0 {
            state.origin_y
        } else {
            let mut y = *cursor;
            if any_contributed {
                y += self.config.section_spacing;
            }
            y
        };
        state.origin_y = origin_y;

        let mut y = origin_y;
        if state.has_header {
            let frame = Rect::new(0.0, y, content_width, state.header_height);
            state.header = Some(LayoutAttributes::supplementary(
                ElementKind::Header,
                si,
                frame,
            ));
            y += state.header_height + if item_count > 0 { item_spacing } else { 0.0 };
        } else {
            state.header = None;
        }
        let items_top = y;

        // Per-column running heights; each entry is the y where the next
        // item in that column would start.
        let mut columns: SmallVec<[f32; 8]> = SmallVec::from_elem(items_top, column_count);
        for i in 0..resume_item {
            let column = state.item_columns[i].min(column_count - 1);
            columns[column] = state.attributes[i].frame.max_y() + item_spacing;
        }

        state.attributes.truncate(resume_item);
        for i in resume_item..item_count {
            let column = shortest_column(&columns);
            let x = column as f32 * column_stride;
            let top = columns[column];
            let height = state.item_heights[i];
            let frame = Rect::new(x, top, column_width, height);
            state.attributes.push(LayoutAttributes::item(
                IndexPath::new(si, i),
                frame,
            ));
            state.item_columns[i] = column;
            columns[column] = top + height + item_spacing;
        }

        // Trailing spacing never counts toward the section's extent.
        let mut bottom = items_top;
        for (column, &next_top) in columns.iter().enumerate() {
            let has_items = state
                .item_columns
                .iter()
                .take(item_count)
                .any(|&c| c == column);
            if has_items {
                bottom = bottom.max(next_top - item_spacing);
            }
        }

        if state.has_footer {
            let footer_top = bottom + if item_count > 0 { item_spacing } else { 0.0 };
            let frame = Rect::new(0.0, footer_top, content_width, state.footer_height);
            state.footer = Some(LayoutAttributes::supplementary(
                ElementKind::Footer,
                si,
                frame,
            ));
            bottom = footer_top + state.footer_height;
        } else {
            state.footer = None;
        }

        state.height = bottom - origin_y;
        *cursor = bottom;
        state.contributes()
    }
}

/// Index of the shortest column; ties break to the lowest index.
fn shortest_column(columns: &[f32]) -> usize {
    let mut best = 0;
    for (i, &h) in columns.iter().enumerate().skip(1) {
        if h < columns[best] {
            best = i;
        }
    }
    best
}
