//! The normalized photo placement and its projection into a container.
//!
//! # Model
//!
//! A [`Transform`] is `{ scale, center_x, center_y }`:
//!
//! - `scale = 1.0` is the contain-fit size: the whole photo is visible, one
//!   axis is flush with the container, the other may leave a margin.
//! - `(center_x, center_y)` is the point of the photo, as a fraction of the
//!   photo's own width/height, that sits on the container's centre.
//!   Centres are unbounded.
//!
//! # Projection order
//!
//! [`project`] reproduces the preview's CSS model step by step:
//! 1. contain-fit the photo into the container
//! 2. multiply both dimensions by `scale`
//! 3. translate by `(0.5 - center) * 100%` of the *scaled photo* size
//! 4. centre the translated photo on the container
//!
//! The translate percentage is relative to the scaled photo, never to the
//! container. Getting this wrong shifts every crop.

mod persisted;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ManipulationConfig;
use crate::geometry::{Rect, Size};

pub use persisted::{IncomingTransform, PersistedTransform};

/// Smallest scale the model accepts.
pub const MIN_SCALE: f64 = 0.01;
/// Largest scale the model accepts.
pub const MAX_SCALE: f64 = 10.0;

/// Errors raised when building a transform.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// Scale or centre could not be turned into a valid transform.
    #[error("Invalid transform: {reason}")]
    InvalidTransform { reason: String },
}

impl TransformError {
    fn invalid(reason: impl Into<String>) -> Self {
        TransformError::InvalidTransform {
            reason: reason.into(),
        }
    }
}

/// Clamp a scale into `[MIN_SCALE, MAX_SCALE]`.
///
/// `NaN` maps to `1.0`; infinities map to the nearest bound.
pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Normalized placement of a photo inside a hole.
///
/// Only constructible through validating constructors, so every value in
/// circulation has a finite, clamped scale and finite centres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "PersistedTransform", try_from = "IncomingTransform")]
pub struct Transform {
    scale: f64,
    center_x: f64,
    center_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Fit size, centred. Also the reset target of the finalizer.
    pub const IDENTITY: Transform = Transform {
        scale: 1.0,
        center_x: 0.5,
        center_y: 0.5,
    };

    /// Build a transform, clamping the scale into the model limits.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidTransform` for non-finite input or a
    /// non-positive scale.
    pub fn new(scale: f64, center_x: f64, center_y: f64) -> Result<Self, TransformError> {
        Self::with_range(scale, center_x, center_y, (MIN_SCALE, MAX_SCALE))
    }

    /// Build a transform, clamping the scale into the gesture limits of
    /// `config` (which never exceed the model limits).
    pub fn with_limits(
        scale: f64,
        center_x: f64,
        center_y: f64,
        config: &ManipulationConfig,
    ) -> Result<Self, TransformError> {
        Self::with_range(scale, center_x, center_y, config.scale_range())
    }

    fn with_range(
        scale: f64,
        center_x: f64,
        center_y: f64,
        (min, max): (f64, f64),
    ) -> Result<Self, TransformError> {
        if !scale.is_finite() {
            return Err(TransformError::invalid(format!("scale {scale} is not finite")));
        }
        if scale <= 0.0 {
            return Err(TransformError::invalid(format!("scale {scale} is not positive")));
        }
        if !center_x.is_finite() || !center_y.is_finite() {
            return Err(TransformError::invalid(format!(
                "center ({center_x}, {center_y}) is not finite"
            )));
        }
        let scale = clamp_scale(scale).clamp(min.max(MIN_SCALE), max.min(MAX_SCALE));
        Ok(Self {
            scale,
            center_x,
            center_y,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn center_x(&self) -> f64 {
        self.center_x
    }

    pub fn center_y(&self) -> f64 {
        self.center_y
    }

    /// Same centre, new scale.
    pub fn with_scale(&self, scale: f64) -> Result<Self, TransformError> {
        Self::new(scale, self.center_x, self.center_y)
    }

    /// Same scale, new centre.
    pub fn with_center(&self, center_x: f64, center_y: f64) -> Result<Self, TransformError> {
        Self::new(self.scale, center_x, center_y)
    }

    /// Linear interpolation between two transforms, `t` in `[0, 1]`.
    pub fn lerp(from: &Transform, to: &Transform, t: f64) -> Transform {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 1.0 };
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Transform::new(
            mix(from.scale, to.scale),
            mix(from.center_x, to.center_x),
            mix(from.center_y, to.center_y),
        )
        .unwrap_or(*to)
    }

    /// Translate of the preview in percent of the scaled photo size, as
    /// used in a CSS `translate(x%, y%)`.
    pub fn translate_percent(&self) -> (f64, f64) {
        (
            (0.5 - self.center_x) * 100.0,
            (0.5 - self.center_y) * 100.0,
        )
    }
}

/// The photo size at `scale = 1.0`: contain-fit into `container`.
///
/// The flush axis takes the container dimension exactly; the other axis is
/// derived by cross-multiplication, so equal aspect ratios give an exact
/// fit for integral pixel sizes.
pub fn fit_size(photo: Size, container: Size) -> Size {
    if photo.width * container.height >= photo.height * container.width {
        // Photo is relatively wider: width is flush
        Size::new(
            container.width,
            container.width * photo.height / photo.width,
        )
    } else {
        Size::new(
            container.height * photo.width / photo.height,
            container.height,
        )
    }
}

/// Where a photo ends up inside its container, plus its relative crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRect {
    /// Photo bounds in container-local coordinates
    pub rect: Rect,
    /// Visible part of the photo, `None` if the photo is entirely outside
    pub crop: Option<RelativeCrop>,
}

/// Resolution-independent description of what a container shows of a photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeCrop {
    /// Visible region of the photo in photo fractions (0..1)
    pub visible: Rect,
    /// Container centre expressed in photo fractions
    pub frame_center: (f64, f64),
}

impl RelativeCrop {
    /// Relative crop of `photo` framed by `container`. Both rects must be in
    /// the same coordinate space.
    pub fn between(photo: &Rect, container: &Rect) -> Option<Self> {
        if photo.is_degenerate() {
            return None;
        }
        let (cx, cy) = container.center();
        let frame_center = (
            (cx - photo.x) / photo.width,
            (cy - photo.y) / photo.height,
        );
        let overlap = photo.intersect(container)?;
        let visible = Rect::new(
            (overlap.x - photo.x) / photo.width,
            (overlap.y - photo.y) / photo.height,
            overlap.width / photo.width,
            overlap.height / photo.height,
        );
        Some(Self {
            visible,
            frame_center,
        })
    }
}

/// Project a transform into a container of the given size.
///
/// Returns the photo rectangle in container-local coordinates (the
/// container spans `(0, 0)..(container.width, container.height)`).
pub fn project(transform: &Transform, photo: Size, container: Size) -> RenderRect {
    // 1. Contain-fit baseline
    let fit = fit_size(photo, container);
    // 2. Uniform scale
    let scaled = fit.scaled(transform.scale);
    // 3. Translate relative to the scaled photo itself
    let translate_x = (0.5 - transform.center_x) * scaled.width;
    let translate_y = (0.5 - transform.center_y) * scaled.height;
    // 4. Centre on the container
    let x = container.width / 2.0 + translate_x - scaled.width / 2.0;
    let y = container.height / 2.0 + translate_y - scaled.height / 2.0;

    let rect = Rect::new(x, y, scaled.width, scaled.height);
    let crop = RelativeCrop::between(&rect, &Rect::from_size(container));
    RenderRect { rect, crop }
}
