//! Drawing surfaces for the composite.
//!
//! Only the part of a photo that ends up inside the clip is cropped and
//! resampled, so a photo zoomed to 10x never materialises at full size.
//! Nearest sampling reads the source pixel under each destination pixel
//! centre. Other filters resample the visible source pixels plus the
//! kernel's reach at the draw scale.

use crate::decode::{resize, DecodedImage, FilterType};
use crate::geometry::Rect;

use super::RasterError;

/// Target of slot drawing.
pub trait DrawingSurface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Draw `image` stretched to `draw`, painting only inside `clip`.
    /// Both rectangles are in surface pixels.
    fn draw_image(
        &mut self,
        image: &DecodedImage,
        draw: &Rect,
        clip: &Rect,
        filter: FilterType,
    ) -> Result<(), RasterError>;
}

/// Crop an image to a region given in fractions of its size.
///
/// The pixel region is widened outwards to whole pixels so the result
/// always covers the requested area. Regions reaching past the image are
/// clamped; the result is at least 1x1.
pub fn crop_region(image: &DecodedImage, region: &Rect) -> DecodedImage {
    if region.x <= 0.0 && region.y <= 0.0 && region.right() >= 1.0 && region.bottom() >= 1.0 {
        return image.clone();
    }

    let src_w = image.width as f64;
    let src_h = image.height as f64;

    let px_left = (region.x.clamp(0.0, 1.0) * src_w).floor() as u32;
    let px_top = (region.y.clamp(0.0, 1.0) * src_h).floor() as u32;
    let px_right = (region.right().clamp(0.0, 1.0) * src_w).ceil() as u32;
    let px_bottom = (region.bottom().clamp(0.0, 1.0) * src_h).ceil() as u32;

    let px_left = px_left.min(image.width.saturating_sub(1));
    let px_top = px_top.min(image.height.saturating_sub(1));
    let px_right = px_right.min(image.width).max(px_left + 1);
    let px_bottom = px_bottom.min(image.height).max(px_top + 1);

    crop_pixels(image, px_left, px_top, px_right - px_left, px_bottom - px_top)
}

/// Copy the `width x height` block at `(x, y)`. The block must lie inside
/// the image.
fn crop_pixels(image: &DecodedImage, x: u32, y: u32, width: u32, height: u32) -> DecodedImage {
    if x == 0 && y == 0 && width == image.width && height == image.height {
        return image.clone();
    }
    let mut output = Vec::with_capacity((width * height * 3) as usize);
    let row_bytes = (width * 3) as usize;
    for row in y..y + height {
        let start = ((row * image.width + x) * 3) as usize;
        output.extend_from_slice(&image.pixels[start..start + row_bytes]);
    }
    DecodedImage::new(width, height, output)
}

/// Source pixel whose area covers the centre of destination pixel `dest`,
/// for a source of `len` pixels stretched over `[origin, origin + extent)`.
fn nearest_index(dest: u32, origin: f64, extent: f64, len: u32) -> u32 {
    let src = ((dest as f64 + 0.5 - origin) / extent * len as f64).floor();
    src.clamp(0.0, (len - 1) as f64) as u32
}

/// Source pixels the filter reads beyond a sample point, in source pixels.
fn filter_margin(filter: FilterType, scale: f64) -> u32 {
    let support = match filter {
        FilterType::Nearest => 0.0,
        FilterType::Bilinear => 1.0,
        FilterType::Lanczos3 => 3.0,
    };
    (support * (1.0 / scale).max(1.0)).ceil() as u32
}

/// One axis of a filtered draw: which source pixels to crop, how large to
/// resample them, and where the visible pixels start in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AxisWindow {
    start: u32,
    len: u32,
    resized: u32,
    offset: u32,
}

impl AxisWindow {
    fn new(
        dest: u32,
        dest_len: u32,
        origin: f64,
        extent: f64,
        src_len: u32,
        filter: FilterType,
    ) -> Self {
        // Destination pixels per source pixel
        let scale = extent / src_len as f64;
        let margin = filter_margin(filter, scale) as f64;
        let from = (dest as f64 - origin) / scale;
        let to = ((dest + dest_len) as f64 - origin) / scale;

        let start = ((from.floor() - margin).max(0.0) as u32).min(src_len - 1);
        let end = ((to.ceil() + margin).min(src_len as f64) as u32).max(start + 1);
        let len = end - start;

        let offset = ((dest as f64 - origin) - start as f64 * scale).round().max(0.0) as u32;
        let resized = ((len as f64 * scale).round() as u32).max(offset + dest_len);
        Self {
            start,
            len,
            resized,
            offset,
        }
    }
}

/// In-memory RGB8 surface backed by a [`DecodedImage`].
#[derive(Debug, Clone)]
pub struct RgbCanvas {
    image: DecodedImage,
}

impl RgbCanvas {
    /// A canvas filled with `background`.
    ///
    /// # Errors
    ///
    /// `RasterError::ClipDegenerate` for a zero-sized canvas.
    pub fn new(width: u32, height: u32, background: [u8; 3]) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::ClipDegenerate {
                width: width as f64,
                height: height as f64,
            });
        }
        let pixels = background
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * 3)
            .collect();
        Ok(Self {
            image: DecodedImage::new(width, height, pixels),
        })
    }

    pub fn image(&self) -> &DecodedImage {
        &self.image
    }

    pub fn into_image(self) -> DecodedImage {
        self.image
    }

    /// RGB value at `(x, y)`, `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.image.width || y >= self.image.height {
            return None;
        }
        let idx = ((y * self.image.width + x) * 3) as usize;
        let p = &self.image.pixels[idx..idx + 3];
        Some([p[0], p[1], p[2]])
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.image.width as f64, self.image.height as f64)
    }
}

impl DrawingSurface for RgbCanvas {
    fn width(&self) -> u32 {
        self.image.width
    }

    fn height(&self) -> u32 {
        self.image.height
    }

    fn draw_image(
        &mut self,
        image: &DecodedImage,
        draw: &Rect,
        clip: &Rect,
        filter: FilterType,
    ) -> Result<(), RasterError> {
        if draw.is_degenerate() {
            return Err(RasterError::ClipDegenerate {
                width: draw.width,
                height: draw.height,
            });
        }
        if image.width == 0 || image.height == 0 {
            return Err(RasterError::Surface("source image is empty".to_string()));
        }

        let visible = match draw
            .intersect(clip)
            .and_then(|r| r.intersect(&self.bounds()))
        {
            Some(visible) => visible,
            None => return Ok(()),
        };

        // Snap to whole destination pixels
        let x0 = visible.x.round().max(0.0) as u32;
        let y0 = visible.y.round().max(0.0) as u32;
        let x1 = (visible.right().round() as u32).min(self.image.width);
        let y1 = (visible.bottom().round() as u32).min(self.image.height);
        if x1 <= x0 || y1 <= y0 {
            return Ok(());
        }
        let out_w = x1 - x0;
        let out_h = y1 - y0;

        match filter {
            FilterType::Nearest => self.blit_nearest(image, draw, (x0, y0), (out_w, out_h)),
            _ => self.blit_filtered(image, draw, (x0, y0), (out_w, out_h), filter)?,
        }
        Ok(())
    }
}

impl RgbCanvas {
    fn blit_nearest(
        &mut self,
        image: &DecodedImage,
        draw: &Rect,
        (x0, y0): (u32, u32),
        (out_w, out_h): (u32, u32),
    ) {
        let columns: Vec<u32> = (x0..x0 + out_w)
            .map(|x| nearest_index(x, draw.x, draw.width, image.width))
            .collect();
        for y in y0..y0 + out_h {
            let sy = nearest_index(y, draw.y, draw.height, image.height);
            let src_row = (sy * image.width) as usize;
            let dst_row = (y * self.image.width) as usize;
            for (x, &sx) in (x0..).zip(&columns) {
                let src = (src_row + sx as usize) * 3;
                let dst = (dst_row + x as usize) * 3;
                self.image.pixels[dst..dst + 3].copy_from_slice(&image.pixels[src..src + 3]);
            }
        }
    }

    /// Resample the visible source pixels plus a filter margin at the draw
    /// scale, then copy out the part that lands inside the visible area.
    fn blit_filtered(
        &mut self,
        image: &DecodedImage,
        draw: &Rect,
        (x0, y0): (u32, u32),
        (out_w, out_h): (u32, u32),
        filter: FilterType,
    ) -> Result<(), RasterError> {
        let wx = AxisWindow::new(x0, out_w, draw.x, draw.width, image.width, filter);
        let wy = AxisWindow::new(y0, out_h, draw.y, draw.height, image.height, filter);

        let cropped = crop_pixels(image, wx.start, wy.start, wx.len, wy.len);
        let patch = resize(&cropped, wx.resized, wy.resized, filter)
            .map_err(|e| RasterError::Surface(e.to_string()))?;

        let row_bytes = (out_w * 3) as usize;
        for row in 0..out_h {
            let src = (((wy.offset + row) * patch.width + wx.offset) * 3) as usize;
            let dst = (((y0 + row) * self.image.width + x0) * 3) as usize;
            self.image.pixels[dst..dst + row_bytes]
                .copy_from_slice(&patch.pixels[src..src + row_bytes]);
        }
        Ok(())
    }
}
