//! Print composite bindings.
//!
//! Photo bytes are registered once with a [`JsPhotoLibrary`]; a composite
//! then decodes each photo at most once and redraws every slot at the
//! template's native resolution.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const library = new JsPhotoLibrary();
//! library.add('p1', new Uint8Array(await file.arrayBuffer()));
//!
//! const jpeg = export_template({
//!   width: 1200, height: 1800,
//!   holes: [{ x: 0, y: 0, width: 1200, height: 1800 }],
//!   slots: [{ holeIndex: 0, photoId: 'p1', transform: saved }],
//! }, library, { jpegQuality: 95 });
//! ```

use std::rc::Rc;

use futures_util::FutureExt;
use holefit_core::config::RasterConfig;
use holefit_core::encode::encode_image;
use holefit_core::geometry::Hole;
use holefit_core::raster::{render_template, CompositeReport, RasterError, RgbCanvas};
use holefit_core::slot::{PhotoId, TemplateInstance};
use holefit_core::source::{FallbackSource, MemorySource, PhotoCache};
use holefit_core::transform::Transform;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

use crate::types::{from_js_or_default, js_error, JsDecodedImage};

/// One filled slot as sent from JavaScript.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SlotJs {
    pub hole_index: usize,
    pub photo_id: PhotoId,
    /// Stored transform in any known shape; absent means fit size
    #[serde(default)]
    pub transform: Option<Transform>,
}

/// A template with its filled slots.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TemplateJs {
    pub width: u32,
    pub height: u32,
    pub holes: Vec<Hole>,
    #[serde(default)]
    pub slots: Vec<SlotJs>,
}

pub(crate) fn build_template(template: TemplateJs) -> Result<TemplateInstance, String> {
    let mut instance = TemplateInstance::new(template.width, template.height, template.holes);
    for slot in template.slots {
        let target = instance
            .slot_for_hole_mut(slot.hole_index)
            .ok_or_else(|| format!("Slot refers to missing hole {}", slot.hole_index))?;
        target.replace(slot.photo_id);
        if let Some(transform) = slot.transform {
            target.commit(transform).map_err(|e| e.to_string())?;
        }
    }
    Ok(instance)
}

/// Encoded photos available to composites, plus their decoded cache.
#[wasm_bindgen]
#[derive(Debug)]
pub struct JsPhotoLibrary {
    photos: Rc<MemorySource>,
    cache: PhotoCache,
}

#[wasm_bindgen]
impl JsPhotoLibrary {
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsPhotoLibrary {
        JsPhotoLibrary {
            photos: Rc::new(MemorySource::new("library")),
            cache: PhotoCache::new(),
        }
    }

    /// Register (or replace) the encoded bytes of a photo.
    pub fn add(&mut self, photo_id: &str, bytes: Vec<u8>) {
        let id = PhotoId::from(photo_id);
        self.cache.release(&id);
        Rc::make_mut(&mut self.photos).insert(id, bytes);
    }

    pub fn has(&self, photo_id: &str) -> bool {
        self.photos.contains(&PhotoId::from(photo_id))
    }

    /// Forget a photo and its decoded pixels.
    pub fn remove(&mut self, photo_id: &str) -> bool {
        let id = PhotoId::from(photo_id);
        self.cache.release(&id);
        Rc::make_mut(&mut self.photos).remove(&id).is_some()
    }

    /// Drop all decoded pixels; encoded bytes stay registered.
    pub fn clear_cache(&mut self) {
        self.cache = PhotoCache::new();
    }

    #[wasm_bindgen(getter)]
    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    #[wasm_bindgen(getter)]
    pub fn decoded_count(&self) -> usize {
        self.cache.len()
    }
}

impl Default for JsPhotoLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl JsPhotoLibrary {
    /// Render `template` from the registered photos.
    ///
    /// Every source here is in memory, so the composite finishes within a
    /// single poll.
    pub(crate) fn render(
        &mut self,
        template: &TemplateInstance,
        config: &RasterConfig,
    ) -> Result<(RgbCanvas, CompositeReport), RasterError> {
        let sources = FallbackSource::new().with_source(Rc::clone(&self.photos));
        render_template(template, &mut self.cache, &sources, config)
            .now_or_never()
            .unwrap_or_else(|| {
                Err(RasterError::Surface(
                    "composite did not complete synchronously".to_string(),
                ))
            })
    }
}

fn report_failures(report: &CompositeReport) {
    for (slot, error) in &report.failed {
        web_sys::console::warn_1(&JsValue::from_str(&format!("slot {slot} skipped: {error}")));
    }
}

fn render_from_js(
    template: JsValue,
    library: &mut JsPhotoLibrary,
    config: JsValue,
) -> Result<(RgbCanvas, RasterConfig), JsValue> {
    let template: TemplateJs = serde_wasm_bindgen::from_value(template).map_err(js_error)?;
    let template = build_template(template).map_err(js_error)?;
    let config: RasterConfig = from_js_or_default(config)?;
    let (canvas, report) = library.render(&template, &config).map_err(js_error)?;
    report_failures(&report);
    Ok((canvas, config))
}

/// Composite a template at its native resolution.
///
/// Slots whose photo is missing or undecodable are left as background
/// and reported on the console; the rest are still drawn.
///
/// # Arguments
///
/// * `template` - `{ width, height, holes, slots: [{ holeIndex, photoId, transform }] }`
/// * `library` - Registered photo bytes
/// * `config` - Partial `RasterConfig` (`filter`, `background`, `jpegQuality`), or `null`
#[wasm_bindgen]
pub fn composite_template(
    template: JsValue,
    library: &mut JsPhotoLibrary,
    config: JsValue,
) -> Result<JsDecodedImage, JsValue> {
    let (canvas, _) = render_from_js(template, library, config)?;
    Ok(JsDecodedImage::from_decoded(canvas.into_image()))
}

/// Composite a template and encode it as JPEG with `config.jpegQuality`.
#[wasm_bindgen]
pub fn export_template(
    template: JsValue,
    library: &mut JsPhotoLibrary,
    config: JsValue,
) -> Result<Vec<u8>, JsValue> {
    let (canvas, config) = render_from_js(template, library, config)?;
    encode_image(canvas.image(), config.jpeg_quality).map_err(js_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use holefit_core::decode::FilterType;
    use holefit_core::encode::encode_jpeg;
    use holefit_core::slot::SlotId;

    fn solid_jpeg(rgb: [u8; 3]) -> Vec<u8> {
        encode_jpeg(&rgb.repeat(16 * 16), 16, 16, 95).unwrap()
    }

    fn template_js(slots: Vec<SlotJs>) -> TemplateJs {
        TemplateJs {
            width: 100,
            height: 50,
            holes: vec![
                Hole::new(0.0, 0.0, 50.0, 50.0),
                Hole::new(50.0, 0.0, 50.0, 50.0),
            ],
            slots,
        }
    }

    fn slot(hole_index: usize, photo: &str, transform: Option<Transform>) -> SlotJs {
        SlotJs {
            hole_index,
            photo_id: PhotoId::from(photo),
            transform,
        }
    }

    #[test]
    fn test_build_template_fills_slots() {
        let t = Transform::new(2.0, 0.3, 0.5).unwrap();
        let instance =
            build_template(template_js(vec![slot(1, "p", Some(t)), slot(0, "q", None)])).unwrap();
        let filled = instance.slot_for_hole(1).unwrap();
        assert_eq!(filled.photo(), Some(&PhotoId::from("p")));
        assert_eq!(filled.transform(), Some(t));
        assert_eq!(
            instance.slot_for_hole(0).unwrap().transform(),
            Some(Transform::IDENTITY)
        );
    }

    #[test]
    fn test_build_template_rejects_unknown_hole() {
        let err = build_template(template_js(vec![slot(5, "p", None)])).unwrap_err();
        assert!(err.contains('5'));
    }

    #[test]
    fn test_library_add_and_remove() {
        let mut library = JsPhotoLibrary::new();
        library.add("a", vec![1, 2, 3]);
        assert!(library.has("a"));
        assert_eq!(library.photo_count(), 1);
        assert!(library.remove("a"));
        assert!(!library.remove("a"));
        assert!(!library.has("a"));
    }

    #[test]
    fn test_render_draws_and_caches() {
        let mut library = JsPhotoLibrary::new();
        library.add("red", solid_jpeg([250, 0, 0]));
        let template = build_template(template_js(vec![slot(0, "red", None)])).unwrap();
        let config = RasterConfig {
            filter: FilterType::Nearest,
            ..Default::default()
        };

        let (canvas, report) = library.render(&template, &config).unwrap();
        assert_eq!(report.drawn, vec![SlotId::from("slot-0")]);
        assert_eq!(report.empty, vec![SlotId::from("slot-1")]);
        let [r, g, b] = canvas.pixel(25, 25).unwrap();
        assert!(r > 200 && g < 40 && b < 40);
        assert_eq!(canvas.pixel(75, 25), Some([255, 255, 255]));
        assert_eq!(library.decoded_count(), 1);

        // Replacing the bytes drops the stale decode
        library.add("red", solid_jpeg([0, 0, 250]));
        assert_eq!(library.decoded_count(), 0);
    }

    #[test]
    fn test_render_missing_photo_is_reported() {
        let mut library = JsPhotoLibrary::new();
        let template = build_template(template_js(vec![slot(0, "gone", None)])).unwrap();
        let (_, report) = library.render(&template, &RasterConfig::default()).unwrap();
        assert!(!report.is_complete());
        assert_eq!(report.failed.len(), 1);
    }
}
