//! Decoded photo types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for photo decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a recognised image format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The decoder gave up part way.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// Reading the byte stream failed.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A resize target had a zero dimension.
    #[error("Invalid target size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// Resampling filter for resize operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Nearest neighbour (fastest, blocky).
    Nearest,
    /// Bilinear (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Lanczos3 (slowest, sharpest).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    /// Flip horizontal + rotate 270 CW
    Transpose = 5,
    Rotate90CW = 6,
    /// Flip horizontal + rotate 90 CW
    Transverse = 7,
    Rotate270CW = 8,
}

impl Orientation {
    /// True for the quarter-turn orientations, which swap width and height.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90CW
                | Orientation::Transverse
                | Orientation::Rotate270CW
        )
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// Header information of an encoded photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhotoInfo {
    /// Stored width, before orientation
    pub width: u32,
    /// Stored height, before orientation
    pub height: u32,
    pub orientation: Orientation,
}

impl PhotoInfo {
    /// Dimensions as displayed, after orientation.
    pub fn oriented_dimensions(&self) -> (u32, u32) {
        if self.orientation.swaps_dimensions() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

/// A decoded image with RGB pixel data.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 3,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_type_conversion() {
        assert!(matches!(
            FilterType::Bilinear.to_image_filter(),
            image::imageops::FilterType::Triangle
        ));
        assert!(matches!(
            FilterType::Lanczos3.to_image_filter(),
            image::imageops::FilterType::Lanczos3
        ));
    }

    #[test]
    fn test_filter_type_deserializes_by_name() {
        let filter: FilterType = serde_json::from_str(r#""Nearest""#).unwrap();
        assert_eq!(filter, FilterType::Nearest);
    }

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(Orientation::from(1), Orientation::Normal);
        assert_eq!(Orientation::from(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from(99), Orientation::Normal);
    }

    #[test]
    fn test_oriented_dimensions() {
        let mut info = PhotoInfo {
            width: 6000,
            height: 4000,
            ..Default::default()
        };
        assert_eq!(info.oriented_dimensions(), (6000, 4000));
        info.orientation = Orientation::Transverse;
        assert_eq!(info.oriented_dimensions(), (4000, 6000));
    }

    #[test]
    fn test_decoded_image_empty() {
        assert!(DecodedImage::new(0, 0, vec![]).is_empty());
        assert!(!DecodedImage::new(1, 1, vec![0, 0, 0]).is_empty());
    }
}
