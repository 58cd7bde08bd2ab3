//! Transform bindings and the CSS preview string.
//!
//! The preview applies `scale(s) translate(x%, y%)` to a photo that is
//! already contain-fitted and centred in its hole. With scale first, the
//! percentage resolves against the scaled photo, which is exactly what
//! the print rasterizer does.

use holefit_core::geometry::Size;
use holefit_core::transform::{project, IncomingTransform, PersistedTransform, Transform};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::types::js_error;

/// CSS `transform` value for the preview of `transform`.
pub fn css_transform(transform: &Transform) -> String {
    let (x, y) = transform.translate_percent();
    format!(
        "scale({}) translate({}%, {}%)",
        transform.scale(),
        x,
        y
    )
}

/// Photo bounds inside a container, as handed to JavaScript.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct RenderedJs {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub(crate) fn rendered(
    transform: &Transform,
    photo_width: f64,
    photo_height: f64,
    container_width: f64,
    container_height: f64,
) -> RenderedJs {
    let r = project(
        transform,
        Size::new(photo_width, photo_height),
        Size::new(container_width, container_height),
    )
    .rect;
    RenderedJs {
        x: r.x,
        y: r.y,
        width: r.width,
        height: r.height,
    }
}

/// A validated slot transform.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const t = JsTransform.from_json(saved ?? null);
/// img.style.transform = t.css_transform();
/// await db.put({ slotId, transform: t.to_json() });
/// ```
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsTransform {
    inner: Transform,
}

#[wasm_bindgen]
impl JsTransform {
    /// Create a transform. The scale is clamped to `[0.01, 10]`.
    ///
    /// # Errors
    ///
    /// Non-finite values or a non-positive scale.
    #[wasm_bindgen(constructor)]
    pub fn new(scale: f64, center_x: f64, center_y: f64) -> Result<JsTransform, JsValue> {
        Transform::new(scale, center_x, center_y)
            .map(JsTransform::from)
            .map_err(js_error)
    }

    /// Fit size, centred.
    pub fn identity() -> JsTransform {
        Transform::IDENTITY.into()
    }

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f64 {
        self.inner.scale()
    }

    #[wasm_bindgen(getter)]
    pub fn center_x(&self) -> f64 {
        self.inner.center_x()
    }

    #[wasm_bindgen(getter)]
    pub fn center_y(&self) -> f64 {
        self.inner.center_y()
    }

    /// Tagged record for storage: `{ kind: "center", scale, centerX, centerY }`.
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&PersistedTransform::from(self.inner)).map_err(js_error)
    }

    /// Parse a stored record in any known shape. `null` and `undefined`
    /// give the identity transform.
    pub fn from_json(value: JsValue) -> Result<JsTransform, JsValue> {
        if value.is_null() || value.is_undefined() {
            return Ok(Self::identity());
        }
        let incoming: IncomingTransform = serde_wasm_bindgen::from_value(value).map_err(js_error)?;
        Transform::try_from(incoming)
            .map(JsTransform::from)
            .map_err(js_error)
    }

    /// CSS `transform` value for the preview.
    pub fn css_transform(&self) -> String {
        css_transform(&self.inner)
    }

    /// Photo bounds `{ x, y, width, height }` inside a container.
    pub fn project(
        &self,
        photo_width: f64,
        photo_height: f64,
        container_width: f64,
        container_height: f64,
    ) -> Result<JsValue, JsValue> {
        let rect = rendered(
            &self.inner,
            photo_width,
            photo_height,
            container_width,
            container_height,
        );
        serde_wasm_bindgen::to_value(&rect).map_err(js_error)
    }
}

impl From<Transform> for JsTransform {
    fn from(inner: Transform) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_identity() {
        assert_eq!(
            css_transform(&Transform::IDENTITY),
            "scale(1) translate(0%, 0%)"
        );
    }

    #[test]
    fn test_css_translate_sign() {
        // Moving the centre point right shifts the photo left
        let t = Transform::new(2.0, 0.75, 0.25).unwrap();
        assert_eq!(css_transform(&t), "scale(2) translate(-25%, 25%)");
    }

    #[test]
    fn test_identity_binding() {
        let t = JsTransform::identity();
        assert_eq!(t.scale(), 1.0);
        assert_eq!(t.center_x(), 0.5);
        assert_eq!(t, JsTransform::from(Transform::IDENTITY));
    }

    #[test]
    fn test_rendered_rect() {
        let t = Transform::new(2.0, 0.5, 0.5).unwrap();
        let r = rendered(&t, 100.0, 100.0, 200.0, 100.0);
        assert_eq!(
            r,
            RenderedJs {
                x: 0.0,
                y: -50.0,
                width: 200.0,
                height: 200.0
            }
        );
    }
}
