//! Self-sizing negotiation.
//!
//! Resolves the definitive size of a piece of reusable content against an
//! axis-constrained target. Content is first measured with relaxed
//! (unbounded) constraints on fit-content axes; greedy content that answers
//! "as large as possible" to an unbounded constraint is re-measured against
//! the actual bounding box. Measuring naively against infinity would
//! otherwise echo infinity back.
//!
//! Negotiation is purely functional: no state survives the call.

use crate::axis::Axis;
use crate::constraints::Constraints;
use crate::geometry::Size;

/// The measurement seam to the content renderer. The negotiator never
/// inspects what is behind it.
pub trait Measurable {
    /// Measures the content against `constraints`, returning its size.
    fn measure(&mut self, constraints: Constraints) -> Size;
}

/// How strongly the target size binds one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FittingPriority {
    /// The result must equal the target extent on this axis.
    Exact,
    /// Fill the available extent on this axis.
    AsLargeAsPossible,
    /// Let the content pick its natural extent on this axis.
    FitContent,
}

/// Per-axis fitting priorities for one negotiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisFit {
    pub horizontal: FittingPriority,
    pub vertical: FittingPriority,
}

impl AxisFit {
    /// Exact width, content-sized height. The common cell shape in a
    /// vertically scrolling masonry column.
    pub fn fixed_width() -> Self {
        Self {
            horizontal: FittingPriority::Exact,
            vertical: FittingPriority::FitContent,
        }
    }

    /// Exact height, content-sized width.
    pub fn fixed_height() -> Self {
        Self {
            horizontal: FittingPriority::FitContent,
            vertical: FittingPriority::Exact,
        }
    }

    fn along(&self, axis: Axis) -> FittingPriority {
        match axis {
            Axis::Horizontal => self.horizontal,
            Axis::Vertical => self.vertical,
        }
    }
}

/// Optional caller-imposed bounds on the negotiated result, e.g. "must not
/// exceed the viewport's current content size".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SizeLimits {
    pub min: Option<Size>,
    pub max: Option<Size>,
}

impl SizeLimits {
    pub fn at_most(max: Size) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    fn apply(&self, mut size: Size) -> Size {
        if let Some(max) = self.max {
            size.width = size.width.min(max.width);
            size.height = size.height.min(max.height);
        }
        if let Some(min) = self.min {
            size.width = size.width.max(min.width);
            size.height = size.height.max(min.height);
        }
        size
    }
}

/// Result of a negotiation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizingOutcome {
    pub size: Size,
    /// Set when the content reported an anomalous (NaN or infinite) size
    /// even against bounded constraints. The returned size is the caller's
    /// estimate; re-measure on the next layout pass.
    pub deferred: bool,
}

/// Negotiates the definitive size for `content` against `target`.
///
/// `estimate` substitutes for any axis the content fails to produce a sane
/// extent for. Works on concrete content and on trait objects alike.
pub fn negotiate<M: Measurable + ?Sized>(
    content: &mut M,
    target: Size,
    fit: AxisFit,
    limits: SizeLimits,
    estimate: Size,
) -> SizingOutcome {
    let first_pass = constraints_for(target, fit, true);
    let mut measured = content.measure(first_pass);

    // Greedy content answers an unbounded axis with infinity; ask again
    // against the actual bounding box.
    let greedy_width = fit.along(Axis::Horizontal) == FittingPriority::FitContent
        && !measured.width.is_finite();
    let greedy_height =
        fit.along(Axis::Vertical) == FittingPriority::FitContent && !measured.height.is_finite();
    if greedy_width || greedy_height {
        measured = content.measure(constraints_for(target, fit, false));
    }

    let mut deferred = false;
    let width = resolve_axis(
        measured.width,
        target.width,
        fit.horizontal,
        estimate.width,
        &mut deferred,
    );
    let height = resolve_axis(
        measured.height,
        target.height,
        fit.vertical,
        estimate.height,
        &mut deferred,
    );

    SizingOutcome {
        size: limits.apply(Size::new(width, height)),
        deferred,
    }
}

fn constraints_for(target: Size, fit: AxisFit, relax_fit_content: bool) -> Constraints {
    let mut c = Constraints::tight(target.width, target.height);
    if fit.horizontal == FittingPriority::FitContent {
        c = c.relax_width(if relax_fit_content {
            f32::INFINITY
        } else {
            target.width
        });
    }
    if fit.vertical == FittingPriority::FitContent {
        c = c.relax_height(if relax_fit_content {
            f32::INFINITY
        } else {
            target.height
        });
    }
    c
}

fn resolve_axis(
    measured: f32,
    target: f32,
    priority: FittingPriority,
    estimate: f32,
    deferred: &mut bool,
) -> f32 {
    match priority {
        // The contract pins these axes to the target regardless of what the
        // content reported.
        FittingPriority::Exact | FittingPriority::AsLargeAsPossible => target,
        FittingPriority::FitContent => {
            if measured.is_finite() && measured >= 0.0 {
                measured
            } else {
                log::warn!(
                    "self-sizing: content reported anomalous extent {measured}; \
                     falling back to estimate {estimate}"
                );
                *deferred = true;
                estimate
            }
        }
    }
}
