//! Slot editor bindings for the interactive preview.
//!
//! The page owns the pointer listeners and the animation loop. It forwards
//! gesture steps to [`JsSlotEditor`] and, once a gesture ends, calls
//! `frame()` from `requestAnimationFrame` with the measured layout until a
//! `committed` outcome comes back.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const editor = new JsSlotEditor(slotId, photoId, saved, pw, ph, cw, ch, null);
//! editor.begin_gesture((e) => { img.style.transform = css(e.transform); });
//! editor.pan(dx, dy);
//! editor.end_gesture();
//!
//! const tick = (now: number) => {
//!   const out = editor.frame(now, measure(img, hole));
//!   if (out.kind === 'frame') img.style.transform = editor.css_transform();
//!   if (out.kind === 'committed') return save(out.record);
//!   requestAnimationFrame(tick);
//! };
//! requestAnimationFrame(tick);
//! ```

use holefit_core::config::HolefitConfig;
use holefit_core::editor::{EditorError, FrameOutcome, SlotEditor};
use holefit_core::finalize::{
    GeometryProvider, GeometryUnavailable, LayoutSnapshot, Policy, Resolution,
};
use holefit_core::geometry::{Rect, Size};
use holefit_core::manipulation::ManipulationEvent;
use holefit_core::slot::{PhotoId, Slot, SlotId, SlotRecord};
use holefit_core::transform::{IncomingTransform, Transform};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::transform::{css_transform, JsTransform};
use crate::types::{from_js_or_default, js_error};

/// Bounds measured with `getBoundingClientRect()`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct LayoutJs {
    pub photo: Rect,
    pub container: Rect,
}

/// Layout as measured by the page for one frame.
///
/// `None` means the page could not find the elements (unmounted, hidden).
#[derive(Debug, Clone, Copy)]
pub(crate) struct DomGeometry(pub Option<LayoutSnapshot>);

impl From<Option<LayoutJs>> for DomGeometry {
    fn from(layout: Option<LayoutJs>) -> Self {
        DomGeometry(layout.map(|l| LayoutSnapshot::new(l.photo, l.container)))
    }
}

impl GeometryProvider for DomGeometry {
    fn measure(&self) -> Result<LayoutSnapshot, GeometryUnavailable> {
        match self.0 {
            Some(snapshot) => snapshot.validate(),
            None => Err(GeometryUnavailable::NotRendered(
                "photo or container is not in the document".to_string(),
            )),
        }
    }
}

fn layout_from_js(value: JsValue) -> Result<DomGeometry, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(DomGeometry(None));
    }
    let layout: LayoutJs = serde_wasm_bindgen::from_value(value).map_err(js_error)?;
    Ok(DomGeometry::from(Some(layout)))
}

fn policy_name(policy: Policy) -> &'static str {
    match policy {
        Policy::NoOp => "noOp",
        Policy::MoveByGap => "moveByGap",
        Policy::Reset => "reset",
        Policy::ResetAfterValidation => "resetAfterValidation",
    }
}

/// `frame()` result as seen by JavaScript, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub(crate) enum FrameJs {
    Idle,
    Waiting,
    #[serde(rename_all = "camelCase")]
    Frame { transform: Transform, css: String },
    #[serde(rename_all = "camelCase")]
    Committed {
        record: SlotRecord,
        css: String,
        policy: Option<&'static str>,
        geometry_error: Option<String>,
    },
}

impl From<FrameOutcome> for FrameJs {
    fn from(outcome: FrameOutcome) -> Self {
        match outcome {
            FrameOutcome::Idle => FrameJs::Idle,
            FrameOutcome::Waiting => FrameJs::Waiting,
            FrameOutcome::Frame(transform) => FrameJs::Frame {
                css: css_transform(&transform),
                transform,
            },
            FrameOutcome::Committed { record, resolution } => FrameJs::Committed {
                css: css_transform(&record.transform),
                policy: resolution.policy().map(policy_name),
                geometry_error: match resolution {
                    Resolution::GeometryUnavailable { error, .. } => Some(error.to_string()),
                    _ => None,
                },
                record,
            },
        }
    }
}

/// Manipulation event forwarded to a JavaScript listener.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventJs {
    kind: &'static str,
    interacting: bool,
    transform: Transform,
    css: String,
}

impl From<&ManipulationEvent> for EventJs {
    fn from(event: &ManipulationEvent) -> Self {
        let kind = match event {
            ManipulationEvent::Started(_) => "started",
            ManipulationEvent::Changed(_) => "changed",
            ManipulationEvent::Ended(_) => "ended",
            ManipulationEvent::Cancelled(_) => "cancelled",
        };
        let transform = event.transform();
        EventJs {
            kind,
            interacting: event.is_interacting(),
            css: css_transform(&transform),
            transform,
        }
    }
}

fn notify(callback: &js_sys::Function, event: &ManipulationEvent) {
    let payload = match serde_wasm_bindgen::to_value(&EventJs::from(event)) {
        Ok(payload) => payload,
        Err(e) => {
            web_sys::console::warn_1(&js_error(e));
            return;
        }
    };
    if let Err(e) = callback.call1(&JsValue::NULL, &payload) {
        web_sys::console::warn_1(&e);
    }
}

/// Editor for a slot that already holds a photo.
pub(crate) fn build_editor(
    slot_id: &str,
    photo_id: &str,
    transform: Option<Transform>,
    photo: Size,
    container: Size,
    config: HolefitConfig,
) -> Result<SlotEditor, EditorError> {
    let mut slot = Slot::new(SlotId::from(slot_id), 0);
    slot.assign(PhotoId::from(photo_id));
    if let Some(transform) = transform {
        slot.commit(transform)?;
    }
    SlotEditor::new(slot, photo, container, config)
}

/// Editing state of one slot, owned by JavaScript.
#[wasm_bindgen]
pub struct JsSlotEditor {
    inner: SlotEditor,
}

#[wasm_bindgen]
impl JsSlotEditor {
    /// Create an editor.
    ///
    /// # Arguments
    ///
    /// * `transform` - Stored transform in any known shape, or `null` for
    ///   the fit-size default
    /// * `photo_width`, `photo_height` - Photo size in pixels
    /// * `container_width`, `container_height` - Hole size on screen
    /// * `config` - Partial `HolefitConfig` object, or `null`
    #[allow(clippy::too_many_arguments)]
    #[wasm_bindgen(constructor)]
    pub fn new(
        slot_id: &str,
        photo_id: &str,
        transform: JsValue,
        photo_width: f64,
        photo_height: f64,
        container_width: f64,
        container_height: f64,
        config: JsValue,
    ) -> Result<JsSlotEditor, JsValue> {
        let transform = if transform.is_null() || transform.is_undefined() {
            None
        } else {
            let incoming: IncomingTransform =
                serde_wasm_bindgen::from_value(transform).map_err(js_error)?;
            Some(Transform::try_from(incoming).map_err(js_error)?)
        };
        let config: HolefitConfig = from_js_or_default(config)?;
        build_editor(
            slot_id,
            photo_id,
            transform,
            Size::new(photo_width, photo_height),
            Size::new(container_width, container_height),
            config,
        )
        .map(|inner| JsSlotEditor { inner })
        .map_err(js_error)
    }

    /// Start a gesture. `listener`, if given, receives every step as
    /// `{ kind, interacting, transform, css }`.
    pub fn begin_gesture(&mut self, listener: Option<js_sys::Function>) {
        match listener {
            Some(callback) => {
                self.inner
                    .begin_gesture_with(move |event: &ManipulationEvent| notify(&callback, event));
            }
            None => {
                self.inner.begin_gesture();
            }
        }
    }

    /// Drag by `(dx, dy)` container pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) -> Option<JsTransform> {
        self.inner.session_mut()?.pan(dx, dy).map(JsTransform::from)
    }

    /// Zoom by the ratio of the current to the previous pinch distance.
    pub fn pinch(&mut self, ratio: f64) -> Option<JsTransform> {
        self.inner.session_mut()?.pinch(ratio).map(JsTransform::from)
    }

    /// Zoom from two raw touch points.
    pub fn pinch_points(&mut self, ax: f64, ay: f64, bx: f64, by: f64) -> Option<JsTransform> {
        self.inner
            .session_mut()?
            .pinch_points((ax, ay), (bx, by))
            .map(JsTransform::from)
    }

    /// A finger was lifted; the next two-finger touch starts a new pinch.
    pub fn pinch_release(&mut self) {
        if let Some(session) = self.inner.session_mut() {
            session.pinch_release();
        }
    }

    /// One wheel tick; negative `delta_y` zooms in.
    pub fn wheel(&mut self, delta_y: f64) -> Option<JsTransform> {
        self.inner.session_mut()?.wheel(delta_y).map(JsTransform::from)
    }

    /// End the gesture. Returns `true` when finalization started.
    pub fn end_gesture(&mut self) -> bool {
        self.inner.end_gesture().is_some()
    }

    /// Abort the gesture without finalizing. Returns the record to
    /// persist, or `null` when no gesture was running.
    pub fn cancel_gesture(&mut self) -> Result<JsValue, JsValue> {
        let record = self.inner.cancel_gesture().map_err(js_error)?;
        serde_wasm_bindgen::to_value(&record).map_err(js_error)
    }

    /// The hole was resized on screen.
    pub fn set_container(&mut self, width: f64, height: f64) {
        self.inner.set_container(Size::new(width, height));
    }

    /// Transform currently on screen.
    pub fn transform(&self) -> JsTransform {
        self.inner.transform().into()
    }

    /// CSS `transform` value for the transform currently on screen.
    pub fn css_transform(&self) -> String {
        css_transform(&self.inner.transform())
    }

    #[wasm_bindgen(getter)]
    pub fn is_manipulating(&self) -> bool {
        self.inner.is_manipulating()
    }

    #[wasm_bindgen(getter)]
    pub fn is_finalizing(&self) -> bool {
        self.inner.pending_finalization().is_some()
    }

    /// Advance finalization by one animation frame.
    ///
    /// `layout` is `{ photo, container }` with `{ x, y, width, height }`
    /// each, or `null` when the elements cannot be measured.
    pub fn frame(&mut self, now_ms: f64, layout: JsValue) -> Result<JsValue, JsValue> {
        let geometry = layout_from_js(layout)?;
        let outcome = self.inner.frame(now_ms, &geometry).map_err(js_error)?;
        serde_wasm_bindgen::to_value(&FrameJs::from(outcome)).map_err(js_error)
    }

    /// Finalize immediately and return the record to persist.
    ///
    /// Without a layout the projection model stands in for the DOM.
    pub fn commit(&mut self, layout: JsValue) -> Result<JsValue, JsValue> {
        let record = match layout_from_js(layout)? {
            DomGeometry(None) => {
                let model = self.inner.model_geometry();
                self.inner.commit(&model)
            }
            dom => self.inner.commit(&dom),
        }
        .map_err(js_error)?;
        serde_wasm_bindgen::to_value(&record).map_err(js_error)
    }

    /// The slot's persisted `{ slotId, photoId, transform }`.
    pub fn record(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.slot().record()).map_err(js_error)
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn editor() -> JsSlotEditor {
        JsSlotEditor::new(
            "slot-a",
            "photo-1",
            JsValue::NULL,
            4000.0,
            6000.0,
            400.0,
            600.0,
            JsValue::UNDEFINED,
        )
        .unwrap()
    }

    #[wasm_bindgen_test]
    fn test_gesture_without_session_is_ignored() {
        let mut editor = editor();
        assert!(editor.pan(10.0, 0.0).is_none());
        assert!(!editor.end_gesture());
    }

    #[wasm_bindgen_test]
    fn test_wheel_zooms_in() {
        let mut editor = editor();
        editor.begin_gesture(None);
        let t = editor.wheel(-1.0).unwrap();
        assert!(t.scale() > 1.0);
        assert!(editor.is_manipulating());
    }

    #[wasm_bindgen_test]
    fn test_commit_without_layout_uses_model() {
        let mut editor = editor();
        editor.begin_gesture(None);
        editor.pan(30.0, 0.0);
        let record = editor.commit(JsValue::NULL).unwrap();
        assert!(record.is_object());
        assert!(!editor.is_manipulating());
    }

    #[wasm_bindgen_test]
    fn test_cancel_without_gesture_is_null() {
        let mut editor = editor();
        assert!(editor.cancel_gesture().unwrap().is_null());
    }
}
