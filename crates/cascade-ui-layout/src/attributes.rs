//! Layout attributes produced by the layout engine.

use cascade_core::IndexPath;

use crate::geometry::Rect;

/// Which kind of element a set of layout attributes describes.
///
/// The masonry engine positions items plus the header and footer
/// supplementaries; other supplementary kinds are recycled through the same
/// caches but positioned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Item,
    Header,
    Footer,
}

/// Resolved geometry for one element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutAttributes {
    /// Section index, plus item index for [`ElementKind::Item`]. Header and
    /// footer attributes carry an item index of 0.
    pub index_path: IndexPath,
    pub kind: ElementKind,
    pub frame: Rect,
}

impl LayoutAttributes {
    pub fn item(index_path: IndexPath, frame: Rect) -> Self {
        Self {
            index_path,
            kind: ElementKind::Item,
            frame,
        }
    }

    pub fn supplementary(kind: ElementKind, section: usize, frame: Rect) -> Self {
        Self {
            index_path: IndexPath::new(section, 0),
            kind,
            frame,
        }
    }
}
