//! Image decoding WASM bindings.
//!
//! # Functions
//!
//! - [`decode_photo`] - Decode JPEG or PNG bytes to upright RGB
//! - [`probe_photo`] - Read display dimensions without decoding pixels
//! - [`resize`] - Resize an image to exact dimensions
//! - [`resize_to_fit`] - Downscale to a maximum edge for the preview
//!
//! # Example
//!
//! ```typescript
//! import { probe_photo, decode_photo, resize_to_fit } from '@holefit/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const { width, height } = probe_photo(bytes);
//! const preview = resize_to_fit(decode_photo(bytes), 2048, 1);
//! ```

use holefit_core::decode::{self, PhotoInfo};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::types::{filter_from_u8, js_error, JsDecodedImage};

/// Decode photo bytes, applying EXIF orientation.
///
/// # Errors
///
/// Unrecognised formats and corrupted or truncated data.
#[wasm_bindgen]
pub fn decode_photo(bytes: &[u8]) -> Result<JsDecodedImage, JsValue> {
    decode::decode_photo(bytes)
        .map(JsDecodedImage::from_decoded)
        .map_err(js_error)
}

/// Display dimensions of a photo, after orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct ProbeJs {
    pub width: u32,
    pub height: u32,
    /// EXIF orientation value (1-8)
    pub orientation: u8,
}

impl From<PhotoInfo> for ProbeJs {
    fn from(info: PhotoInfo) -> Self {
        let (width, height) = info.oriented_dimensions();
        ProbeJs {
            width,
            height,
            orientation: info.orientation as u8,
        }
    }
}

/// Read `{ width, height, orientation }` from the header. Width and height
/// are as displayed, so they can be handed straight to `JsSlotEditor`.
#[wasm_bindgen]
pub fn probe_photo(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = decode::probe_photo(bytes).map_err(js_error)?;
    serde_wasm_bindgen::to_value(&ProbeJs::from(info)).map_err(js_error)
}

/// Resize an image to exact dimensions.
///
/// * `filter` - 0 = Nearest, 1 = Bilinear, 2 = Lanczos3
#[wasm_bindgen]
pub fn resize(
    image: &JsDecodedImage,
    width: u32,
    height: u32,
    filter: u8,
) -> Result<JsDecodedImage, JsValue> {
    decode::resize(&image.to_decoded(), width, height, filter_from_u8(filter))
        .map(JsDecodedImage::from_decoded)
        .map_err(js_error)
}

/// Downscale so the longest edge is at most `max_edge`.
///
/// * `filter` - 0 = Nearest, 1 = Bilinear, 2 = Lanczos3
#[wasm_bindgen]
pub fn resize_to_fit(
    image: &JsDecodedImage,
    max_edge: u32,
    filter: u8,
) -> Result<JsDecodedImage, JsValue> {
    decode::resize_to_fit(&image.to_decoded(), max_edge, filter_from_u8(filter))
        .map(JsDecodedImage::from_decoded)
        .map_err(js_error)
}
