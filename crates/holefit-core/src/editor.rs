//! Per-slot editing: gesture sessions and their finalization.
//!
//! A [`SlotEditor`] is the single mutator of one slot's transform. At most
//! one gesture session and at most one finalization exist at a time;
//! starting a new gesture while a finalization is still animating drops
//! the finalization and picks up from whatever frame was last shown.

use thiserror::Error;
use tracing::debug;

use crate::config::HolefitConfig;
use crate::finalize::{
    finalize_now, Finalization, FinalizePoll, GeometryProvider, ModelGeometry, Resolution,
};
use crate::geometry::Size;
use crate::manipulation::{GestureSession, SessionOutcome, TransformListener};
use crate::slot::{Slot, SlotId, SlotRecord};
use crate::transform::{Transform, TransformError};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Slot {0} has no photo to edit")]
    EmptySlot(SlotId),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Result of advancing the editor by one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Nothing is being finalized.
    Idle,
    /// Finalization is waiting for layout to settle.
    Waiting,
    /// Show this transform for the current frame.
    Frame(Transform),
    /// Finalization finished and the slot was updated; persist `record`.
    Committed {
        record: SlotRecord,
        resolution: Resolution,
    },
}

/// Editing state of one slot.
#[derive(Debug)]
pub struct SlotEditor {
    slot: Slot,
    photo: Size,
    container: Size,
    config: HolefitConfig,
    session: Option<GestureSession>,
    finalization: Option<Finalization>,
}

impl SlotEditor {
    /// Edit `slot`, whose photo is `photo` pixels, shown in a container of
    /// `container` pixels.
    ///
    /// # Errors
    ///
    /// `EditorError::EmptySlot` if the slot holds no photo.
    pub fn new(
        slot: Slot,
        photo: Size,
        container: Size,
        config: HolefitConfig,
    ) -> Result<Self, EditorError> {
        if slot.is_empty() {
            return Err(EditorError::EmptySlot(slot.id().clone()));
        }
        Ok(Self {
            slot,
            photo,
            container,
            config,
            session: None,
            finalization: None,
        })
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub fn into_slot(self) -> Slot {
        self.slot
    }

    /// The transform currently on screen.
    pub fn transform(&self) -> Transform {
        if let Some(session) = &self.session {
            return session.transform();
        }
        if let Some(finalization) = &self.finalization {
            return finalization.shown();
        }
        self.slot.transform().unwrap_or_default()
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn is_manipulating(&self) -> bool {
        self.session.is_some()
    }

    pub fn pending_finalization(&self) -> Option<&Finalization> {
        self.finalization.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut GestureSession> {
        self.session.as_mut()
    }

    /// Geometry derived from the projection model for the transform on
    /// screen. Stands in for a live layout when there is none.
    pub fn model_geometry(&self) -> ModelGeometry {
        ModelGeometry::new(self.transform(), self.photo, self.container)
    }

    /// The container was resized.
    pub fn set_container(&mut self, container: Size) {
        self.container = container;
        if let Some(session) = self.session.as_mut() {
            session.resize_container(container);
        }
    }

    /// Start (or continue) a gesture.
    pub fn begin_gesture(&mut self) -> &mut GestureSession {
        let session = match self.session.take() {
            Some(running) => running,
            None => self.new_session(),
        };
        self.session.insert(session)
    }

    /// Start a gesture whose every step is reported to `listener`.
    ///
    /// An already running session is replaced.
    pub fn begin_gesture_with(
        &mut self,
        listener: impl TransformListener + 'static,
    ) -> &mut GestureSession {
        let session = match self.session.take() {
            Some(running) => GestureSession::start(
                running.transform(),
                self.photo,
                self.container,
                self.config.manipulation,
            ),
            None => self.new_session(),
        };
        self.session.insert(session.with_listener(listener))
    }

    fn new_session(&mut self) -> GestureSession {
        let start = match self.finalization.take() {
            Some(mut pending) => {
                let shown = pending.shown();
                pending.cancel();
                debug!(slot = %self.slot.id(), "pending finalization superseded");
                shown
            }
            None => self.transform(),
        };
        debug!(slot = %self.slot.id(), scale = start.scale(), "gesture started");
        GestureSession::start(start, self.photo, self.container, self.config.manipulation)
    }

    /// End the gesture normally and start finalizing.
    pub fn end_gesture(&mut self) -> Option<&Finalization> {
        let mut session = self.session.take()?;
        let end = session.end()?.transform();
        debug!(slot = %self.slot.id(), scale = end.scale(), "gesture ended");
        self.finalization = Some(Finalization::new(end, self.photo, self.config.finalizer));
        self.finalization.as_ref()
    }

    /// Abort the gesture. The last applied transform is committed as is.
    pub fn cancel_gesture(&mut self) -> Result<Option<SlotRecord>, EditorError> {
        let Some(mut session) = self.session.take() else {
            return Ok(None);
        };
        match session.cancel() {
            Some(SessionOutcome::Cancelled(transform)) => {
                debug!(slot = %self.slot.id(), "gesture cancelled");
                Ok(Some(self.slot.commit(transform)?))
            }
            _ => Ok(None),
        }
    }

    /// Advance a pending finalization by one rendering frame.
    pub fn frame(
        &mut self,
        now_ms: f64,
        geometry: &dyn GeometryProvider,
    ) -> Result<FrameOutcome, EditorError> {
        let Some(finalization) = self.finalization.as_mut() else {
            return Ok(FrameOutcome::Idle);
        };
        match finalization.poll(now_ms, geometry) {
            FinalizePoll::Waiting => Ok(FrameOutcome::Waiting),
            FinalizePoll::Frame(transform) => Ok(FrameOutcome::Frame(transform)),
            FinalizePoll::Resolved(resolution) => {
                self.finalization = None;
                let record = self.slot.commit(resolution.transform())?;
                debug!(
                    slot = %self.slot.id(),
                    policy = ?resolution.policy(),
                    scale = record.transform.scale(),
                    "finalization committed"
                );
                Ok(FrameOutcome::Committed { record, resolution })
            }
        }
    }

    /// Finalize immediately and commit, e.g. on an explicit save.
    ///
    /// A running gesture is ended first; a pending finalization is replaced
    /// by the synchronous one.
    pub fn commit(&mut self, geometry: &dyn GeometryProvider) -> Result<SlotRecord, EditorError> {
        let current = match (self.session.take(), self.finalization.take()) {
            (Some(mut session), _) => {
                session.end();
                session.transform()
            }
            (None, Some(mut pending)) => pending.cancel().transform(),
            (None, None) => self.transform(),
        };
        let resolution = finalize_now(&current, self.photo, geometry);
        let record = self.slot.commit(resolution.transform())?;
        debug!(
            slot = %self.slot.id(),
            policy = ?resolution.policy(),
            "explicit commit"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalize::{FinalizePhase, Policy};
    use crate::manipulation::ManipulationEvent;
    use crate::slot::PhotoId;
    use std::cell::RefCell;
    use std::rc::Rc;

    const PHOTO: Size = Size {
        width: 4000.0,
        height: 6000.0,
    };
    const CONTAINER: Size = Size {
        width: 400.0,
        height: 600.0,
    };

    fn editor() -> SlotEditor {
        let mut slot = Slot::new("slot-0", 0);
        slot.assign(PhotoId::from("p"));
        SlotEditor::new(slot, PHOTO, CONTAINER, HolefitConfig::default()).unwrap()
    }

    /// Poll until the finalization commits, using the model as layout.
    fn run_to_commit(editor: &mut SlotEditor, mut now: f64) -> (SlotRecord, Resolution) {
        for _ in 0..100 {
            let geometry = editor.model_geometry();
            if let FrameOutcome::Committed { record, resolution } =
                editor.frame(now, &geometry).unwrap()
            {
                return (record, resolution);
            }
            now += 16.0;
        }
        panic!("finalization did not resolve");
    }

    #[test]
    fn test_empty_slot_is_rejected() {
        let result = SlotEditor::new(
            Slot::new("x", 0),
            PHOTO,
            CONTAINER,
            HolefitConfig::default(),
        );
        assert!(matches!(result, Err(EditorError::EmptySlot(_))));
    }

    #[test]
    fn test_pan_off_edge_snaps_back() {
        let mut editor = editor();
        editor.begin_gesture().pan(30.0, 0.0);
        assert!(editor.is_manipulating());
        assert!(editor.end_gesture().is_some());

        let (record, resolution) = run_to_commit(&mut editor, 0.0);
        // Scale 1 pan leaves a left gap and a right overhang: moved back
        assert_eq!(resolution.policy(), Some(Policy::MoveByGap));
        assert!((record.transform.center_x() - 0.5).abs() < 1e-9);
        assert_eq!(editor.slot().transform(), Some(record.transform));
        assert!(editor.pending_finalization().is_none());
    }

    #[test]
    fn test_zoom_out_resets() {
        let mut editor = editor();
        editor.begin_gesture().pinch(0.5);
        editor.end_gesture();
        let (record, resolution) = run_to_commit(&mut editor, 0.0);
        assert_eq!(resolution.policy(), Some(Policy::Reset));
        assert_eq!(record.transform, Transform::IDENTITY);
    }

    #[test]
    fn test_zoomed_in_without_gaps_is_kept() {
        let mut editor = editor();
        editor.begin_gesture().pinch(2.0);
        editor.end_gesture();
        let (record, resolution) = run_to_commit(&mut editor, 0.0);
        assert_eq!(resolution.policy(), Some(Policy::NoOp));
        assert_eq!(record.transform.scale(), 2.0);
    }

    #[test]
    fn test_cancel_commits_without_finalizing() {
        let mut editor = editor();
        editor.begin_gesture().pinch(0.5);
        let record = editor.cancel_gesture().unwrap().unwrap();
        assert_eq!(record.transform.scale(), 0.5);
        assert!(editor.pending_finalization().is_none());
        assert_eq!(editor.frame(0.0, &editor.model_geometry()).unwrap(), FrameOutcome::Idle);
    }

    #[test]
    fn test_new_gesture_supersedes_finalization() {
        let mut editor = editor();
        editor.begin_gesture().pinch(0.5);
        editor.end_gesture();

        // Settle, decide, then get halfway into the animation
        let mut now = 0.0;
        let mut shown = None;
        for _ in 0..10 {
            let geometry = editor.model_geometry();
            if let FrameOutcome::Frame(t) = editor.frame(now, &geometry).unwrap() {
                if t.scale() > 0.5 {
                    shown = Some(t);
                    break;
                }
            }
            now += 100.0;
        }
        let shown = shown.unwrap();
        assert_eq!(
            editor.pending_finalization().map(|f| f.phase()),
            Some(FinalizePhase::Animating)
        );

        let session = editor.begin_gesture();
        assert_eq!(session.transform(), shown);
        assert!(editor.pending_finalization().is_none());
        // Slot was never written by the dropped finalization
        assert_eq!(editor.slot().transform(), Some(Transform::IDENTITY));
    }

    #[test]
    fn test_listener_sees_every_step() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut editor = editor();
        let session = editor.begin_gesture_with(move |e: &ManipulationEvent| {
            sink.borrow_mut().push(*e)
        });
        session.pan(5.0, 0.0);
        session.wheel(-1.0);
        editor.end_gesture();

        let events = events.borrow();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], ManipulationEvent::Started(_)));
        assert!(matches!(events[3], ManipulationEvent::Ended(_)));
    }

    #[test]
    fn test_explicit_commit_finalizes_synchronously() {
        let mut editor = editor();
        editor.begin_gesture().pan(-40.0, 25.0);
        let geometry = editor.model_geometry();
        let record = editor.commit(&geometry).unwrap();
        assert!(!editor.is_manipulating());
        assert!((record.transform.center_x() - 0.5).abs() < 1e-9);
        assert!((record.transform.center_y() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_geometry_failure_keeps_transform() {
        let mut editor = editor();
        editor.begin_gesture().pinch(0.5);
        editor.end_gesture();
        let broken = ModelGeometry::new(editor.transform(), PHOTO, Size::new(0.0, 0.0));
        let mut outcome = FrameOutcome::Idle;
        for frame in 0..5 {
            outcome = editor.frame(frame as f64 * 16.0, &broken).unwrap();
            if matches!(outcome, FrameOutcome::Committed { .. }) {
                break;
            }
        }
        let FrameOutcome::Committed { record, resolution } = outcome else {
            panic!("expected a commit");
        };
        assert!(matches!(resolution, Resolution::GeometryUnavailable { .. }));
        assert_eq!(record.transform.scale(), 0.5);
    }

    #[test]
    fn test_resize_mid_gesture() {
        let mut editor = editor();
        editor.begin_gesture();
        editor.set_container(Size::new(200.0, 300.0));
        let t = editor.session_mut().unwrap().pan(10.0, 0.0).unwrap();
        // 200px wide rendered photo: 10px is 5%
        assert!((t.center_x() - 0.45).abs() < 1e-12);
        assert_eq!(editor.container(), Size::new(200.0, 300.0));
    }
}
