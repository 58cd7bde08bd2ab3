//! Format-sniffing decode with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{DecodeError, DecodedImage, Orientation, PhotoInfo};

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::IoError(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }
    Ok(reader)
}

/// Decode photo bytes to upright RGB8.
///
/// # Errors
///
/// `DecodeError::InvalidFormat` for unrecognised bytes,
/// `DecodeError::CorruptedFile` when the decoder fails.
pub fn decode_photo(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let orientation = read_orientation(bytes);
    let img = reader(bytes)?
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    let upright = apply_orientation(img, orientation);
    Ok(DecodedImage::from_rgb_image(upright.into_rgb8()))
}

/// Read dimensions and orientation from the header without decoding pixels.
pub fn probe_photo(bytes: &[u8]) -> Result<PhotoInfo, DecodeError> {
    let orientation = read_orientation(bytes);
    let (width, height) = reader(bytes)?
        .into_dimensions()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    Ok(PhotoInfo {
        width,
        height,
        orientation,
    })
}

/// EXIF orientation of the photo, `Normal` when absent or unreadable.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from)
        .unwrap_or_default()
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_jpeg;

    /// 4x2 JPEG, left half red, right half blue.
    fn landscape_jpeg() -> Vec<u8> {
        let mut pixels = Vec::new();
        for _ in 0..2 {
            for x in 0..4 {
                pixels.extend_from_slice(if x < 2 { &[255, 0, 0] } else { &[0, 0, 255] });
            }
        }
        encode_jpeg(&pixels, 4, 2, 100).unwrap()
    }

    /// Insert a minimal EXIF APP1 segment carrying `orientation`.
    fn with_orientation(jpeg: &[u8], orientation: u8) -> Vec<u8> {
        let mut app1 = vec![0xFF, 0xE1, 0x00, 0x22];
        app1.extend_from_slice(b"Exif\0\0");
        // Little-endian TIFF header, IFD at offset 8
        app1.extend_from_slice(&[b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00]);
        // One entry: Orientation (0x0112), SHORT, count 1
        app1.extend_from_slice(&[0x01, 0x00]);
        app1.extend_from_slice(&[0x12, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00]);
        app1.extend_from_slice(&[orientation, 0x00, 0x00, 0x00]);
        app1.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_decode_jpeg() {
        let img = decode_photo(&landscape_jpeg()).unwrap();
        assert_eq!((img.width, img.height), (4, 2));
        assert_eq!(img.pixels.len(), 4 * 2 * 3);
    }

    #[test]
    fn test_decode_png() {
        let img = image::RgbImage::from_pixel(3, 5, image::Rgb([1, 2, 3]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        let decoded = decode_photo(bytes.get_ref()).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 5));
        assert_eq!(&decoded.pixels[0..3], &[1, 2, 3]);
    }

    #[test]
    fn test_decode_applies_exif_rotation() {
        let bytes = with_orientation(&landscape_jpeg(), 6);
        assert_eq!(read_orientation(&bytes), Orientation::Rotate90CW);
        let img = decode_photo(&bytes).unwrap();
        assert_eq!((img.width, img.height), (2, 4));
    }

    #[test]
    fn test_probe_reports_oriented_size() {
        let info = probe_photo(&with_orientation(&landscape_jpeg(), 8)).unwrap();
        assert_eq!((info.width, info.height), (4, 2));
        assert_eq!(info.orientation, Orientation::Rotate270CW);
        assert_eq!(info.oriented_dimensions(), (2, 4));
    }

    #[test]
    fn test_no_exif_is_normal() {
        assert_eq!(read_orientation(&landscape_jpeg()), Orientation::Normal);
        assert_eq!(read_orientation(&[0, 1, 2]), Orientation::Normal);
    }

    #[test]
    fn test_decode_empty_bytes() {
        assert!(matches!(decode_photo(&[]), Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_unknown_format() {
        assert!(matches!(
            decode_photo(&[0x00, 0x11, 0x22, 0x33, 0x44]),
            Err(DecodeError::InvalidFormat)
        ));
    }

    #[test]
    fn test_decode_truncated_jpeg() {
        let bytes = landscape_jpeg();
        let result = decode_photo(&bytes[..20]);
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))));
    }

    #[test]
    fn test_apply_orientation_rotate180() {
        let rgb = image::RgbImage::from_raw(2, 1, vec![255, 0, 0, 0, 255, 0]).unwrap();
        let out = apply_orientation(DynamicImage::ImageRgb8(rgb), Orientation::Rotate180).into_rgb8();
        assert_eq!(out.get_pixel(0, 0).0, [0, 255, 0]);
        assert_eq!(out.get_pixel(1, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_apply_orientation_flip_horizontal() {
        let rgb = image::RgbImage::from_raw(2, 1, vec![255, 0, 0, 0, 255, 0]).unwrap();
        let out =
            apply_orientation(DynamicImage::ImageRgb8(rgb), Orientation::FlipHorizontal).into_rgb8();
        assert_eq!(out.get_pixel(0, 0).0, [0, 255, 0]);
    }
}
