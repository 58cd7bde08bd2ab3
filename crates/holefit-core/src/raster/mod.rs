//! Print rasterization of slot transforms.
//!
//! The preview positions photos with CSS; the export redraws them at the
//! template's native resolution. [`place`] derives the draw rectangle in
//! the same order as the preview so the relative framing is identical:
//!
//! 1. (a) fit the photo into the hole along its fitting axis
//! 2. (b) multiply both dimensions by `scale`
//! 3. (c) translate by `(0.5 - center) * 100%`
//! 4. (d) resolve that percentage against the *scaled* photo, not the hole
//! 5. (e) centre the translated photo on the hole
//! 6. (f) clip to the hole
//!
//! Resolving the percentage against the hole instead of the scaled photo
//! gives a visibly different crop.

mod composite;
mod surface;

use thiserror::Error;

use crate::geometry::{Hole, Rect, Size};
use crate::transform::{fit_size, RelativeCrop, Transform};

pub use composite::{composite_template, render_template, CompositeError, CompositeReport};
pub use surface::{crop_region, DrawingSurface, RgbCanvas};

/// Errors raised while drawing a slot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RasterError {
    /// The hole or the computed draw rect has no area.
    #[error("Degenerate clip region: {width}x{height}")]
    ClipDegenerate { width: f64, height: f64 },

    /// The drawing surface rejected the operation.
    #[error("Drawing surface error: {0}")]
    Surface(String),
}

/// Where one photo is drawn, and what part of it is kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Photo rectangle
    pub draw: Rect,
    /// Hole bounds; nothing outside this is painted
    pub clip: Rect,
}

impl Placement {
    /// The same placement moved from hole-local to template coordinates.
    pub fn in_template(&self, hole: &Hole) -> Placement {
        Placement {
            draw: self.draw.translate(hole.x, hole.y),
            clip: self.clip.translate(hole.x, hole.y),
        }
    }

    /// Relative framing, comparable with the preview's `RenderRect::crop`.
    pub fn relative_crop(&self) -> Option<RelativeCrop> {
        RelativeCrop::between(&self.draw, &self.clip)
    }
}

/// Compute the hole-local placement of a photo.
///
/// # Errors
///
/// `RasterError::ClipDegenerate` when the hole or the photo has no area.
pub fn place(transform: &Transform, photo: Size, hole: &Hole) -> Result<Placement, RasterError> {
    let hole_size = hole.size();
    if hole_size.is_degenerate() {
        return Err(RasterError::ClipDegenerate {
            width: hole_size.width,
            height: hole_size.height,
        });
    }

    // (a) fitting-axis baseline
    let base = fit_size(photo, hole_size);
    // (b) uniform scale
    let scaled = base.scaled(transform.scale());
    // (c) translate as a percentage
    let (percent_x, percent_y) = transform.translate_percent();
    // (d) percentage of the scaled photo
    let translate_x = percent_x / 100.0 * scaled.width;
    let translate_y = percent_y / 100.0 * scaled.height;
    // (e) photo centre on hole centre, then translate
    let draw = Rect::new(
        hole_size.width / 2.0 - scaled.width / 2.0 + translate_x,
        hole_size.height / 2.0 - scaled.height / 2.0 + translate_y,
        scaled.width,
        scaled.height,
    );
    if draw.is_degenerate() {
        return Err(RasterError::ClipDegenerate {
            width: draw.width,
            height: draw.height,
        });
    }

    // (f) clip
    Ok(Placement {
        draw,
        clip: Rect::from_size(hole_size),
    })
}
