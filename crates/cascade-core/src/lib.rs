//! Identity model, snapshots, and the snapshot differ for Cascade.
//!
//! Everything in this crate is synchronous, bounded, and non-failing: callers
//! hand in identity-keyed data, get back immutable [`Snapshot`] values and
//! staged [`Changeset`]s, and malformed input degrades with a debug
//! diagnostic instead of an error.

pub mod collections;
mod diff;
mod identity;
mod snapshot;

pub use diff::{
    diff, diff_with_reloads, Changeset, DiffOptions, ItemEdit, ItemEditList, SectionEdit,
    SectionEditList, Stage,
};
pub use identity::{digest_key, ElementId, ItemId, ItemKey, SectionKey, SupplementaryId};
pub use snapshot::{IndexPath, SectionSnapshot, Snapshot, SnapshotBuilder};

pub mod prelude {
    pub use crate::diff::{diff, Changeset, DiffOptions};
    pub use crate::identity::{ElementId, ItemId, ItemKey, SectionKey};
    pub use crate::snapshot::{IndexPath, Snapshot};
}
