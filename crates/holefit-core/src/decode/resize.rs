//! Resampling for hole patches and preview-sized photos.

use super::{DecodeError, DecodedImage, FilterType};

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// `DecodeError::InvalidSize` for a zero target dimension.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidSize { width, height });
    }
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgb_image = image
        .to_rgb_image()
        .ok_or_else(|| DecodeError::CorruptedFile("pixel buffer does not match size".to_string()))?;
    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());
    Ok(DecodedImage::from_rgb_image(resized))
}

/// Downscale so the longest edge is at most `max_edge`, keeping the aspect
/// ratio. Smaller images are returned unchanged.
///
/// Used to hand the browser preview a photo no larger than it can show.
pub fn resize_to_fit(
    image: &DecodedImage,
    max_edge: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::InvalidSize {
            width: 0,
            height: 0,
        });
    }
    if image.width <= max_edge && image.height <= max_edge {
        return Ok(image.clone());
    }
    let (width, height) = fit_within(image.width, image.height, max_edge);
    resize(image, width, height, filter)
}

fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let long = width.max(height) as f64;
    let factor = max_edge as f64 / long;
    let scale = |v: u32| ((v as f64 * factor).round() as u32).max(1);
    (scale(width), scale(height))
}
