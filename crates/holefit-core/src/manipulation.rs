//! Live gesture handling for one photo in one hole.
//!
//! A [`GestureSession`] turns pointer input into new transforms, one step
//! at a time. Each step is applied immediately and reported to the
//! listener, so the preview follows the finger without batching.
//!
//! # Lifecycle
//!
//! ```text
//! start ─▶ Active ──pan/pinch/wheel──▶ Active ─┬─ end ────▶ Ended      (finalize)
//!                                              └─ cancel ─▶ Cancelled  (no finalize)
//! ```
//!
//! Steps sent after the session left `Active` are ignored.
//!
//! # Pan normalization
//!
//! A drag is divided by the rendered photo size (`fit_size * scale`) on
//! each axis, so the photo tracks the pointer exactly on both axes. On the
//! flush axis this equals dividing by the container size and the scale; on
//! a letterboxed axis the rendered photo is shorter than the container and
//! the centre moves further per pixel.

use crate::config::ManipulationConfig;
use crate::geometry::Size;
use crate::transform::{fit_size, Transform};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Active,
    Ended,
    Cancelled,
}

/// Notification sent to the preview for every session step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ManipulationEvent {
    /// Interaction began; the preview may show its "interacting" state.
    Started(Transform),
    /// A step produced a new transform.
    Changed(Transform),
    /// Interaction finished normally; finalization follows.
    Ended(Transform),
    /// Interaction was interrupted; no finalization.
    Cancelled(Transform),
}

impl ManipulationEvent {
    pub fn transform(&self) -> Transform {
        match *self {
            ManipulationEvent::Started(t)
            | ManipulationEvent::Changed(t)
            | ManipulationEvent::Ended(t)
            | ManipulationEvent::Cancelled(t) => t,
        }
    }

    /// True while the user is touching the photo.
    pub fn is_interacting(&self) -> bool {
        matches!(
            self,
            ManipulationEvent::Started(_) | ManipulationEvent::Changed(_)
        )
    }
}

/// Receiver of manipulation events.
pub trait TransformListener {
    fn on_event(&mut self, event: &ManipulationEvent);
}

impl<F> TransformListener for F
where
    F: FnMut(&ManipulationEvent),
{
    fn on_event(&mut self, event: &ManipulationEvent) {
        self(event)
    }
}

/// How a session finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionOutcome {
    /// Normal end: run the finalizer on this transform.
    Finished(Transform),
    /// Interrupted: keep this transform as-is, skip the finalizer.
    Cancelled(Transform),
}

impl SessionOutcome {
    pub fn transform(&self) -> Transform {
        match *self {
            SessionOutcome::Finished(t) | SessionOutcome::Cancelled(t) => t,
        }
    }
}

/// One manipulation session.
pub struct GestureSession {
    transform: Transform,
    photo: Size,
    container: Size,
    config: ManipulationConfig,
    phase: GesturePhase,
    pinch_distance: Option<f64>,
    listener: Option<Box<dyn TransformListener>>,
}

impl std::fmt::Debug for GestureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureSession")
            .field("transform", &self.transform)
            .field("photo", &self.photo)
            .field("container", &self.container)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl GestureSession {
    /// Begin a session from the currently displayed transform.
    pub fn start(
        transform: Transform,
        photo: Size,
        container: Size,
        config: ManipulationConfig,
    ) -> Self {
        Self {
            transform,
            photo,
            container,
            config,
            phase: GesturePhase::Active,
            pinch_distance: None,
            listener: None,
        }
    }

    /// Attach a listener and immediately report `Started` to it.
    pub fn with_listener(mut self, listener: impl TransformListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self.emit(ManipulationEvent::Started(self.transform));
        self
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == GesturePhase::Active
    }

    /// Rendered photo size in container pixels for the current scale.
    pub fn rendered_size(&self) -> Size {
        fit_size(self.photo, self.container).scaled(self.transform.scale())
    }

    /// Drag by `(dx, dy)` container pixels. The photo follows the pointer.
    pub fn pan(&mut self, dx: f64, dy: f64) -> Option<Transform> {
        if !self.is_active() || self.container.is_degenerate() || self.photo.is_degenerate() {
            return None;
        }
        let rendered = self.rendered_size();
        let next = self.transform.with_center(
            self.transform.center_x() - dx / rendered.width,
            self.transform.center_y() - dy / rendered.height,
        );
        self.apply(next.ok())
    }

    /// Multiply the scale by `ratio`, keeping the centre point.
    pub fn pinch(&mut self, ratio: f64) -> Option<Transform> {
        if !self.is_active() || !ratio.is_finite() || ratio <= 0.0 {
            return None;
        }
        let next = Transform::with_limits(
            self.transform.scale() * ratio,
            self.transform.center_x(),
            self.transform.center_y(),
            &self.config,
        );
        self.apply(next.ok())
    }

    /// Feed the two contact points of a pinch. The first call only records
    /// the finger distance; later calls zoom by the distance ratio.
    pub fn pinch_points(&mut self, a: (f64, f64), b: (f64, f64)) -> Option<Transform> {
        if !self.is_active() {
            return None;
        }
        let distance = (a.0 - b.0).hypot(a.1 - b.1);
        if !distance.is_finite() || distance <= 0.0 {
            return None;
        }
        match self.pinch_distance.replace(distance) {
            Some(previous) => self.pinch(distance / previous),
            None => None,
        }
    }

    /// Forget the pinch distance, e.g. when a finger lifts.
    pub fn pinch_release(&mut self) {
        self.pinch_distance = None;
    }

    /// One wheel tick. Negative `delta_y` (scroll up) zooms in.
    pub fn wheel(&mut self, delta_y: f64) -> Option<Transform> {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return None;
        }
        let step = self.config.wheel_factor();
        let ratio = if delta_y < 0.0 { step } else { 1.0 / step };
        self.pinch(ratio)
    }

    /// The container changed size mid-session (viewport resize, rotation).
    pub fn resize_container(&mut self, container: Size) {
        self.container = container;
    }

    /// Finish normally. The returned outcome should be finalized.
    pub fn end(&mut self) -> Option<SessionOutcome> {
        if !self.is_active() {
            return None;
        }
        self.phase = GesturePhase::Ended;
        self.pinch_distance = None;
        self.emit(ManipulationEvent::Ended(self.transform));
        Some(SessionOutcome::Finished(self.transform))
    }

    /// Abort. The last applied transform stays, finalization is skipped.
    pub fn cancel(&mut self) -> Option<SessionOutcome> {
        if !self.is_active() {
            return None;
        }
        self.phase = GesturePhase::Cancelled;
        self.pinch_distance = None;
        self.emit(ManipulationEvent::Cancelled(self.transform));
        Some(SessionOutcome::Cancelled(self.transform))
    }

    fn apply(&mut self, next: Option<Transform>) -> Option<Transform> {
        let next = next?;
        self.transform = next;
        self.emit(ManipulationEvent::Changed(next));
        Some(next)
    }

    fn emit(&mut self, event: ManipulationEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_event(&event);
        }
    }
}
