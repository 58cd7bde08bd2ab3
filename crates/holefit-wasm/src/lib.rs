//! Holefit WASM - browser bindings for photo placement
//!
//! Exposes `holefit-core` to the template editor page.
//!
//! # Module Structure
//!
//! - `editor` - [`JsSlotEditor`], gestures and auto-snap finalization for one slot
//! - `transform` - [`JsTransform`], stored transform shapes and the CSS preview string
//! - `composite` - [`JsPhotoLibrary`] and print-resolution template export
//! - `decode` / `encode` - photo decoding, preview resizing, JPEG encoding
//! - `types` - [`JsDecodedImage`] pixel buffer wrapper
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsSlotEditor, probe_photo } from '@holefit/wasm';
//!
//! await init();
//! const { width, height } = probe_photo(bytes);
//! const editor = new JsSlotEditor(slotId, photoId, saved, width, height,
//!                                 hole.clientWidth, hole.clientHeight, null);
//! ```

use wasm_bindgen::prelude::*;

mod composite;
mod decode;
mod editor;
mod encode;
mod transform;
mod types;

pub use composite::{composite_template, export_template, JsPhotoLibrary};
pub use decode::{decode_photo, probe_photo, resize, resize_to_fit};
pub use editor::JsSlotEditor;
pub use encode::{encode_jpeg, encode_jpeg_from_image};
pub use transform::{css_transform, JsTransform};
pub use types::JsDecodedImage;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
