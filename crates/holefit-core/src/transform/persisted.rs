//! Stored and incoming transform shapes.
//!
//! Two record shapes exist in saved layouts:
//!
//! - `center`: `{ scale, centerX, centerY }` (current)
//! - `translate`: `{ scale, translateX, translateY }` (legacy), where the
//!   translate is the CSS percentage of the scaled photo size
//!
//! [`IncomingTransform`] is the only place that looks at field names to
//! tell them apart. Everything it produces carries an explicit `kind` tag,
//! and everything downstream only ever sees a validated [`Transform`].

use serde::{Deserialize, Serialize};

use super::{Transform, TransformError};

fn default_scale() -> f64 {
    1.0
}

/// Tagged transform record as written to storage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersistedTransform {
    /// Current shape: photo point placed on the hole centre
    #[serde(rename_all = "camelCase")]
    Center {
        scale: f64,
        center_x: f64,
        center_y: f64,
    },
    /// Legacy shape: CSS translate in percent of the scaled photo
    #[serde(rename_all = "camelCase")]
    Translate {
        #[serde(default = "default_scale")]
        scale: f64,
        translate_x: f64,
        translate_y: f64,
    },
}

impl From<Transform> for PersistedTransform {
    fn from(t: Transform) -> Self {
        PersistedTransform::Center {
            scale: t.scale,
            center_x: t.center_x,
            center_y: t.center_y,
        }
    }
}

impl TryFrom<PersistedTransform> for Transform {
    type Error = TransformError;

    fn try_from(record: PersistedTransform) -> Result<Self, Self::Error> {
        match record {
            PersistedTransform::Center {
                scale,
                center_x,
                center_y,
            } => Transform::new(scale, center_x, center_y),
            // translate = (0.5 - center) * 100%
            PersistedTransform::Translate {
                scale,
                translate_x,
                translate_y,
            } => Transform::new(
                scale,
                0.5 - translate_x / 100.0,
                0.5 - translate_y / 100.0,
            ),
        }
    }
}

/// Transform data as it arrives from storage or the browser.
///
/// Untagged on the wire; the variant is decided once here.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IncomingTransform {
    Tagged(PersistedTransform),
    #[serde(rename_all = "camelCase")]
    Center {
        scale: f64,
        center_x: f64,
        center_y: f64,
    },
    #[serde(rename_all = "camelCase")]
    Translate {
        #[serde(default = "default_scale")]
        scale: f64,
        translate_x: f64,
        translate_y: f64,
    },
}

impl IncomingTransform {
    /// The explicitly tagged form of this record.
    pub fn into_persisted(self) -> PersistedTransform {
        match self {
            IncomingTransform::Tagged(record) => record,
            IncomingTransform::Center {
                scale,
                center_x,
                center_y,
            } => PersistedTransform::Center {
                scale,
                center_x,
                center_y,
            },
            IncomingTransform::Translate {
                scale,
                translate_x,
                translate_y,
            } => PersistedTransform::Translate {
                scale,
                translate_x,
                translate_y,
            },
        }
    }
}

impl TryFrom<IncomingTransform> for Transform {
    type Error = TransformError;

    fn try_from(incoming: IncomingTransform) -> Result<Self, Self::Error> {
        Transform::try_from(incoming.into_persisted())
    }
}
