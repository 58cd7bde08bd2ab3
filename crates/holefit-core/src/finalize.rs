//! Auto-snap finalization: closing gaps once a gesture ends.
//!
//! When manipulation stops, the photo may leave empty margins ("gaps")
//! inside its hole. The finalizer measures them once and picks a target:
//!
//! | gaps  | policy                                    |
//! |-------|-------------------------------------------|
//! | 0     | no-op                                     |
//! | 1 – 2 | move by the gaps, keep scale              |
//! | ≥ 3   | reset to `{ 1, 0.5, 0.5 }`                |
//!
//! A move is simulated with the projection model before it is accepted. If
//! the simulated layout would have three or more gaps, the move is dropped
//! in favour of the reset.
//!
//! # State machine
//!
//! ```text
//! Idle ─▶ Measuring ─▶ Deciding ─┬─▶ NoOp ──────┬─▶ Resolved
//!                                └─▶ Animating ─┘
//! ```
//!
//! [`Finalization`] is polled once per rendering frame. It waits a few
//! frames for layout to settle, measures through a [`GeometryProvider`],
//! decides, then eases towards the target.

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::FinalizerConfig;
use crate::geometry::{GapMeasurement, Rect, Side, Size};
use crate::transform::{project, Transform};

/// Layout measurement was not possible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryUnavailable {
    #[error("Geometry unavailable: container has no area")]
    EmptyContainer,
    #[error("Geometry unavailable: photo has no area")]
    EmptyPhoto,
    #[error("Geometry unavailable: {0}")]
    NotRendered(String),
}

/// On-screen bounds of a photo and its container, in the same space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSnapshot {
    pub photo: Rect,
    pub container: Rect,
}

impl LayoutSnapshot {
    pub fn new(photo: Rect, container: Rect) -> Self {
        Self { photo, container }
    }

    /// Reject layouts that cannot be measured.
    pub fn validate(self) -> Result<Self, GeometryUnavailable> {
        if self.container.is_degenerate() {
            return Err(GeometryUnavailable::EmptyContainer);
        }
        if self.photo.is_degenerate() {
            return Err(GeometryUnavailable::EmptyPhoto);
        }
        Ok(self)
    }

    pub fn gaps(&self) -> GapMeasurement {
        GapMeasurement::between(&self.photo, &self.container)
    }
}

/// Source of the current on-screen layout.
///
/// In the browser this reads element bounds; headless callers use
/// [`ModelGeometry`] or a recorded [`LayoutSnapshot`].
pub trait GeometryProvider {
    fn measure(&self) -> Result<LayoutSnapshot, GeometryUnavailable>;
}

impl GeometryProvider for LayoutSnapshot {
    fn measure(&self) -> Result<LayoutSnapshot, GeometryUnavailable> {
        Ok(*self)
    }
}

impl<G: GeometryProvider + ?Sized> GeometryProvider for &G {
    fn measure(&self) -> Result<LayoutSnapshot, GeometryUnavailable> {
        (**self).measure()
    }
}

/// Geometry computed from the projection model instead of a live layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelGeometry {
    pub transform: Transform,
    pub photo: Size,
    pub container: Size,
}

impl ModelGeometry {
    pub fn new(transform: Transform, photo: Size, container: Size) -> Self {
        Self {
            transform,
            photo,
            container,
        }
    }
}

impl GeometryProvider for ModelGeometry {
    fn measure(&self) -> Result<LayoutSnapshot, GeometryUnavailable> {
        if self.container.is_degenerate() {
            return Err(GeometryUnavailable::EmptyContainer);
        }
        if self.photo.is_degenerate() {
            return Err(GeometryUnavailable::EmptyPhoto);
        }
        let rendered = project(&self.transform, self.photo, self.container);
        Ok(LayoutSnapshot::new(
            rendered.rect,
            Rect::from_size(self.container),
        ))
    }
}

/// Which rule produced the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// No gaps: keep the transform.
    NoOp,
    /// One or two gaps closed by translation.
    MoveByGap,
    /// Three or more gaps measured: reset.
    Reset,
    /// The move was simulated to leave three or more gaps: reset instead.
    ResetAfterValidation,
}

/// Result of the decision step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub policy: Policy,
    /// Gaps measured on the live layout
    pub measured: GapMeasurement,
    /// Gaps the proposed move would leave (move branch only)
    pub simulated: Option<GapMeasurement>,
    pub target: Transform,
}

/// Travel below this many pixels is rounding noise and is not applied.
const MIN_TRAVEL_PX: f64 = 1e-6;

/// Pixels the photo may travel towards a gapped side.
///
/// The full gap, but never so far that the opposite edge comes loose from
/// the container. When the photo is narrower than the container on that
/// axis both sides gap and the photo stays put.
fn travel(gaps: &GapMeasurement, side: Side) -> f64 {
    let gap = gaps.get(side);
    if gap <= 0.0 {
        return 0.0;
    }
    let slack = -gaps.get(side.opposite());
    let travel = gap.min(slack);
    if travel < MIN_TRAVEL_PX {
        0.0
    } else {
        travel
    }
}

/// Choose the finalization target for `current`.
///
/// `layout` is the live measurement, `photo` the photo's pixel size used to
/// simulate the proposed move.
pub fn decide(
    current: &Transform,
    photo: Size,
    layout: &LayoutSnapshot,
) -> Result<Decision, GeometryUnavailable> {
    let layout = layout.validate()?;
    if photo.is_degenerate() {
        return Err(GeometryUnavailable::EmptyPhoto);
    }
    let measured = layout.gaps();

    match measured.gap_count() {
        0 => Ok(Decision {
            policy: Policy::NoOp,
            measured,
            simulated: None,
            target: *current,
        }),
        1 | 2 => {
            // Photo movement in pixels, positive = right / down
            let dx = travel(&measured, Side::Right) - travel(&measured, Side::Left);
            let dy = travel(&measured, Side::Bottom) - travel(&measured, Side::Top);

            let moved = current.with_center(
                current.center_x() - dx / layout.photo.width,
                current.center_y() - dy / layout.photo.height,
            );

            let container = layout.container.size();
            let (target, simulated) = match moved {
                Ok(target) => {
                    let rect = project(&target, photo, container).rect;
                    let gaps = GapMeasurement::between(&rect, &Rect::from_size(container));
                    (target, gaps)
                }
                Err(_) => (Transform::IDENTITY, GapMeasurement::default()),
            };

            if moved.is_err() || simulated.gap_count() >= 3 {
                return Ok(Decision {
                    policy: Policy::ResetAfterValidation,
                    measured,
                    simulated: Some(simulated),
                    target: Transform::IDENTITY,
                });
            }
            Ok(Decision {
                policy: Policy::MoveByGap,
                measured,
                simulated: Some(simulated),
                target,
            })
        }
        _ => Ok(Decision {
            policy: Policy::Reset,
            measured,
            simulated: None,
            target: Transform::IDENTITY,
        }),
    }
}

/// How a finalization ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Measured and decided; the target is the final transform.
    Decided(Decision),
    /// Layout could not be measured; the transform is left untouched.
    GeometryUnavailable {
        transform: Transform,
        error: GeometryUnavailable,
    },
    /// Superseded or aborted before resolving.
    Cancelled { transform: Transform },
}

impl Resolution {
    /// The transform the caller should persist.
    pub fn transform(&self) -> Transform {
        match self {
            Resolution::Decided(decision) => decision.target,
            Resolution::GeometryUnavailable { transform, .. }
            | Resolution::Cancelled { transform } => *transform,
        }
    }

    pub fn policy(&self) -> Option<Policy> {
        match self {
            Resolution::Decided(decision) => Some(decision.policy),
            _ => None,
        }
    }
}

/// Current state of a [`Finalization`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizePhase {
    Idle,
    Measuring,
    Deciding,
    NoOp,
    Animating,
    Resolved,
}

/// What a frame poll produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizePoll {
    /// Still waiting for layout to settle.
    Waiting,
    /// Show this intermediate transform.
    Frame(Transform),
    /// Done.
    Resolved(Resolution),
}

/// Smootherstep easing: zero velocity and acceleration at both ends.
fn smootherstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// One in-flight finalization for one slot.
#[derive(Debug, Clone)]
pub struct Finalization {
    start: Transform,
    photo: Size,
    config: FinalizerConfig,
    phase: FinalizePhase,
    frames_waited: u32,
    decision: Option<Decision>,
    animation_start_ms: f64,
    shown: Transform,
    resolution: Option<Resolution>,
}

impl Finalization {
    /// Start finalizing `start`, the transform a gesture ended on.
    pub fn new(start: Transform, photo: Size, config: FinalizerConfig) -> Self {
        Self {
            start,
            photo,
            config,
            phase: FinalizePhase::Idle,
            frames_waited: 0,
            decision: None,
            animation_start_ms: 0.0,
            shown: start,
            resolution: None,
        }
    }

    pub fn phase(&self) -> FinalizePhase {
        self.phase
    }

    pub fn is_resolved(&self) -> bool {
        self.phase == FinalizePhase::Resolved
    }

    /// Transform most recently handed to the preview.
    pub fn shown(&self) -> Transform {
        self.shown
    }

    /// Advance by one rendering frame at time `now_ms`.
    pub fn poll(&mut self, now_ms: f64, geometry: &dyn GeometryProvider) -> FinalizePoll {
        loop {
            match self.phase {
                FinalizePhase::Idle => {
                    self.phase = FinalizePhase::Measuring;
                }
                FinalizePhase::Measuring => {
                    if self.frames_waited < self.config.settle_frames {
                        self.frames_waited += 1;
                        return FinalizePoll::Waiting;
                    }
                    match geometry.measure().and_then(|layout| {
                        decide(&self.start, self.photo, &layout)
                    }) {
                        Ok(decision) => {
                            self.decision = Some(decision);
                            self.phase = FinalizePhase::Deciding;
                        }
                        Err(error) => {
                            warn!(%error, "finalization skipped");
                            return self.resolve(Resolution::GeometryUnavailable {
                                transform: self.start,
                                error,
                            });
                        }
                    }
                }
                FinalizePhase::Deciding => {
                    let Some(decision) = self.decision else {
                        self.phase = FinalizePhase::Measuring;
                        continue;
                    };
                    debug!(
                        policy = ?decision.policy,
                        gaps = decision.measured.gap_count(),
                        "finalization decided"
                    );
                    if decision.target == self.start {
                        self.phase = FinalizePhase::NoOp;
                    } else if self.config.animation_ms > 0.0 {
                        self.phase = FinalizePhase::Animating;
                        self.animation_start_ms = now_ms;
                        return FinalizePoll::Frame(self.shown);
                    } else {
                        return self.resolve(Resolution::Decided(decision));
                    }
                }
                FinalizePhase::NoOp => {
                    let Some(decision) = self.decision else {
                        return self.resolve(Resolution::Cancelled {
                            transform: self.start,
                        });
                    };
                    return self.resolve(Resolution::Decided(decision));
                }
                FinalizePhase::Animating => {
                    let Some(decision) = self.decision else {
                        return self.resolve(Resolution::Cancelled {
                            transform: self.start,
                        });
                    };
                    let elapsed = now_ms - self.animation_start_ms;
                    let t = elapsed / self.config.animation_ms;
                    if t >= 1.0 || t.is_nan() {
                        return self.resolve(Resolution::Decided(decision));
                    }
                    self.shown = Transform::lerp(&self.start, &decision.target, smootherstep(t));
                    return FinalizePoll::Frame(self.shown);
                }
                FinalizePhase::Resolved => {
                    return match &self.resolution {
                        Some(resolution) => FinalizePoll::Resolved(resolution.clone()),
                        None => FinalizePoll::Resolved(Resolution::Cancelled {
                            transform: self.start,
                        }),
                    };
                }
            }
        }
    }

    /// Abort, resolving with the pre-finalization transform.
    pub fn cancel(&mut self) -> Resolution {
        if let Some(resolution) = &self.resolution {
            return resolution.clone();
        }
        let resolution = Resolution::Cancelled {
            transform: self.start,
        };
        self.resolve(resolution.clone());
        resolution
    }

    fn resolve(&mut self, resolution: Resolution) -> FinalizePoll {
        self.shown = resolution.transform();
        self.phase = FinalizePhase::Resolved;
        self.resolution = Some(resolution.clone());
        FinalizePoll::Resolved(resolution)
    }
}

/// Measure and decide in one go, without settle frames or animation.
pub fn finalize_now(
    current: &Transform,
    photo: Size,
    geometry: &dyn GeometryProvider,
) -> Resolution {
    match geometry
        .measure()
        .and_then(|layout| decide(current, photo, &layout))
    {
        Ok(decision) => Resolution::Decided(decision),
        Err(error) => Resolution::GeometryUnavailable {
            transform: *current,
            error,
        },
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn size_strategy() -> impl Strategy<Value = Size> {
        (100.0f64..=4000.0, 100.0f64..=4000.0).prop_map(|(w, h)| Size::new(w.round(), h.round()))
    }

    fn transform_strategy() -> impl Strategy<Value = Transform> {
        (0.2f64..=4.0, -0.5f64..=1.5, -0.5f64..=1.5)
            .prop_map(|(s, x, y)| Transform::new(s, x, y).unwrap())
    }

    fn finalize(t: &Transform, photo: Size, container: Size) -> Resolution {
        finalize_now(t, photo, &ModelGeometry::new(*t, photo, container))
    }

    fn gaps(t: &Transform, photo: Size, container: Size) -> GapMeasurement {
        let rect = project(t, photo, container).rect;
        GapMeasurement::between(&rect, &Rect::from_size(container))
    }

    fn gap_count(t: &Transform, photo: Size, container: Size) -> usize {
        gaps(t, photo, container).gap_count()
    }

    /// Gap count ignoring floating-point residue on closed edges.
    fn visible_gap_count(t: &Transform, photo: Size, container: Size) -> usize {
        gaps(t, photo, container)
            .sides()
            .iter()
            .filter(|(_, gap)| *gap > 1e-6)
            .count()
    }

    fn close(a: &Transform, b: &Transform) -> bool {
        (a.scale() - b.scale()).abs() < 1e-9
            && (a.center_x() - b.center_x()).abs() < 1e-9
            && (a.center_y() - b.center_y()).abs() < 1e-9
    }

    proptest! {
        /// Property: A gap-free transform is returned unchanged.
        #[test]
        fn prop_no_gap_fixed_point(
            photo in size_strategy(),
            container in size_strategy(),
            t in transform_strategy(),
        ) {
            prop_assume!(gap_count(&t, photo, container) == 0);
            let out = finalize(&t, photo, container);
            prop_assert_eq!(out.policy(), Some(Policy::NoOp));
            prop_assert_eq!(out.transform(), t);
        }

        /// Property: Three or more gaps always converge to the reset target.
        #[test]
        fn prop_severe_gaps_reset(
            photo in size_strategy(),
            container in size_strategy(),
            t in transform_strategy(),
        ) {
            prop_assume!(gap_count(&t, photo, container) >= 3);
            let out = finalize(&t, photo, container);
            prop_assert_eq!(out.transform(), Transform::IDENTITY);
        }

        /// Property: An accepted move never leaves three or more simulated gaps.
        #[test]
        fn prop_accepted_move_is_validated(
            photo in size_strategy(),
            container in size_strategy(),
            t in transform_strategy(),
        ) {
            let out = finalize(&t, photo, container);
            if let Resolution::Decided(decision) = out {
                if decision.policy == Policy::MoveByGap {
                    prop_assert!(decision.simulated.unwrap().gap_count() < 3);
                    prop_assert_eq!(decision.target.scale(), t.scale());
                }
            }
        }

        /// Property: Moving never adds gaps.
        #[test]
        fn prop_move_does_not_add_gaps(
            photo in size_strategy(),
            container in size_strategy(),
            t in transform_strategy(),
        ) {
            prop_assume!((1..=2).contains(&gap_count(&t, photo, container)));
            let before = visible_gap_count(&t, photo, container);
            let out = finalize(&t, photo, container);
            if out.policy() == Some(Policy::MoveByGap) {
                prop_assert!(visible_gap_count(&out.transform(), photo, container) <= before);
            }
        }

        /// Property: Finalizing a finalized transform changes nothing.
        #[test]
        fn prop_idempotent(
            photo in size_strategy(),
            container in size_strategy(),
            t in transform_strategy(),
        ) {
            let once = finalize(&t, photo, container).transform();
            let twice = finalize(&once, photo, container).transform();
            prop_assert!(close(&once, &twice), "{:?} != {:?}", once, twice);
        }
    }
}
