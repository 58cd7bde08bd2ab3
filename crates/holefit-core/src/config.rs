//! Tunable settings for manipulation, finalization and rasterization.
//!
//! Every struct deserializes from a partial camelCase object: missing
//! fields take the default value, so callers only spell out what they
//! change.

use serde::{Deserialize, Serialize};

use crate::decode::FilterType;
use crate::transform::{MAX_SCALE, MIN_SCALE};

/// Limits and step sizes for interactive gestures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManipulationConfig {
    /// Smallest scale a gesture may reach (never below 0.01)
    pub min_scale: f64,
    /// Largest scale a gesture may reach (never above 10.0)
    pub max_scale: f64,
    /// Zoom factor applied per wheel tick (1.1 = 10%)
    pub wheel_step: f64,
}

impl Default for ManipulationConfig {
    fn default() -> Self {
        Self {
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            wheel_step: 1.1,
        }
    }
}

impl ManipulationConfig {
    /// Scale limits intersected with the hard model limits.
    pub fn scale_range(&self) -> (f64, f64) {
        let min = if self.min_scale.is_finite() {
            self.min_scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            MIN_SCALE
        };
        let max = if self.max_scale.is_finite() {
            self.max_scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            MAX_SCALE
        };
        if min <= max {
            (min, max)
        } else {
            (max, min)
        }
    }

    /// Wheel factor, falling back to the default for unusable values.
    pub fn wheel_factor(&self) -> f64 {
        if self.wheel_step.is_finite() && self.wheel_step > 1.0 {
            self.wheel_step
        } else {
            Self::default().wheel_step
        }
    }
}

/// Timing of the auto-snap finalizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinalizerConfig {
    /// Frames to wait for layout to settle before measuring
    pub settle_frames: u32,
    /// Duration of the snap animation in milliseconds
    pub animation_ms: f64,
}

impl Default for FinalizerConfig {
    fn default() -> Self {
        Self {
            settle_frames: 2,
            animation_ms: 350.0,
        }
    }
}

/// Output settings for print composites.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RasterConfig {
    /// Resampling filter used when scaling photos into holes
    pub filter: FilterType,
    /// Canvas fill for areas no photo covers (RGB)
    pub background: [u8; 3],
    /// JPEG quality for the encoded composite (1-100)
    pub jpeg_quality: u8,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
            background: [255, 255, 255],
            jpeg_quality: 92,
        }
    }
}

/// All settings in one place.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HolefitConfig {
    pub manipulation: ManipulationConfig,
    pub finalizer: FinalizerConfig,
    pub raster: RasterConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HolefitConfig::default();
        assert_eq!(config.manipulation.scale_range(), (0.01, 10.0));
        assert_eq!(config.finalizer.settle_frames, 2);
        assert_eq!(config.finalizer.animation_ms, 350.0);
        assert_eq!(config.raster.filter, FilterType::Lanczos3);
    }

    #[test]
    fn test_scale_range_never_exceeds_hard_limits() {
        let config = ManipulationConfig {
            min_scale: 0.0001,
            max_scale: 100.0,
            ..Default::default()
        };
        assert_eq!(config.scale_range(), (0.01, 10.0));
    }

    #[test]
    fn test_scale_range_swapped_bounds() {
        let config = ManipulationConfig {
            min_scale: 4.0,
            max_scale: 2.0,
            ..Default::default()
        };
        assert_eq!(config.scale_range(), (2.0, 4.0));
    }

    #[test]
    fn test_wheel_factor_fallback() {
        let mut config = ManipulationConfig::default();
        config.wheel_step = 0.5;
        assert_eq!(config.wheel_factor(), 1.1);
        config.wheel_step = f64::NAN;
        assert_eq!(config.wheel_factor(), 1.1);
        config.wheel_step = 1.25;
        assert_eq!(config.wheel_factor(), 1.25);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: HolefitConfig =
            serde_json::from_str(r#"{ "finalizer": { "animationMs": 200 } }"#).unwrap();
        assert_eq!(config.finalizer.animation_ms, 200.0);
        assert_eq!(config.finalizer.settle_frames, 2);
        assert_eq!(config.manipulation, ManipulationConfig::default());
    }

    #[test]
    fn test_raster_filter_from_json() {
        let config: RasterConfig = serde_json::from_str(r#"{ "filter": "Bilinear" }"#).unwrap();
        assert_eq!(config.filter, FilterType::Bilinear);
        assert_eq!(config.jpeg_quality, 92);
    }
}
