//! Photo decoding.
//!
//! Photos arrive as encoded bytes (JPEG or PNG) and are decoded to RGB8
//! with their EXIF orientation applied, so the pixel size seen by the
//! rasterizer matches what the browser shows.

mod photo;
mod resize;
mod types;

pub use photo::{decode_photo, probe_photo, read_orientation};
pub use resize::{resize, resize_to_fit};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation, PhotoInfo};
