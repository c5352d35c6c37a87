//! Geometry, measurement constraints, self-sizing negotiation, and the
//! masonry layout engine for Cascade.

mod attributes;
mod axis;
mod constraints;
mod geometry;
mod masonry;
mod self_sizing;

pub use attributes::*;
pub use axis::*;
pub use constraints::*;
pub use geometry::*;
pub use masonry::*;
pub use self_sizing::*;

pub mod prelude {
    pub use crate::attributes::{ElementKind, LayoutAttributes};
    pub use crate::constraints::Constraints;
    pub use crate::geometry::{Point, Rect, Size};
    pub use crate::masonry::{ColumnCount, MasonryConfig, MasonryLayout};
    pub use crate::self_sizing::{negotiate, AxisFit, FittingPriority, Measurable, SizeLimits};
}
