//! Slots bind a photo to a hole and own its transform.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Hole;
use crate::transform::{Transform, TransformError};

/// Identifier of a slot within a template instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub String);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlotId {
    fn from(value: &str) -> Self {
        SlotId(value.to_string())
    }
}

/// Identity of a photo. Pixel data is fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(pub String);

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoId {
    fn from(value: &str) -> Self {
        PhotoId(value.to_string())
    }
}

/// The `{ slotId, transform }` payload handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRecord {
    pub slot_id: SlotId,
    pub photo_id: PhotoId,
    pub transform: Transform,
}

/// A hole instance bound to at most one photo and one transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    id: SlotId,
    hole_index: usize,
    photo: Option<PhotoId>,
    transform: Option<Transform>,
}

impl Slot {
    /// Create an empty slot for the hole at `hole_index`.
    pub fn new(id: impl Into<SlotId>, hole_index: usize) -> Self {
        Self {
            id: id.into(),
            hole_index,
            photo: None,
            transform: None,
        }
    }

    pub fn id(&self) -> &SlotId {
        &self.id
    }

    pub fn hole_index(&self) -> usize {
        self.hole_index
    }

    pub fn photo(&self) -> Option<&PhotoId> {
        self.photo.as_ref()
    }

    pub fn transform(&self) -> Option<Transform> {
        self.transform
    }

    pub fn is_empty(&self) -> bool {
        self.photo.is_none()
    }

    /// Put a photo into the slot with the default fit transform.
    ///
    /// Assigning the photo that is already there keeps its transform.
    pub fn assign(&mut self, photo: PhotoId) {
        if self.photo.as_ref() == Some(&photo) {
            return;
        }
        self.photo = Some(photo);
        self.transform = Some(Transform::IDENTITY);
    }

    /// Swap in a different photo; the old placement is discarded.
    pub fn replace(&mut self, photo: PhotoId) {
        self.photo = Some(photo);
        self.transform = Some(Transform::IDENTITY);
    }

    /// Remove the photo and its transform.
    pub fn clear(&mut self) {
        self.photo = None;
        self.transform = None;
    }

    /// Store a new transform.
    ///
    /// # Errors
    ///
    /// `InvalidTransform` when the slot holds no photo, or when the
    /// transform does not pass validation again.
    pub fn commit(&mut self, transform: Transform) -> Result<SlotRecord, TransformError> {
        let photo = self.photo.clone().ok_or_else(|| TransformError::InvalidTransform {
            reason: format!("slot {} has no photo", self.id),
        })?;
        let checked = Transform::new(
            transform.scale(),
            transform.center_x(),
            transform.center_y(),
        )?;
        if checked != transform {
            return Err(TransformError::InvalidTransform {
                reason: format!("scale {} outside model limits", transform.scale()),
            });
        }
        self.transform = Some(checked);
        Ok(SlotRecord {
            slot_id: self.id.clone(),
            photo_id: photo,
            transform: checked,
        })
    }

    /// The persisted form of this slot, if it holds a photo.
    pub fn record(&self) -> Option<SlotRecord> {
        Some(SlotRecord {
            slot_id: self.id.clone(),
            photo_id: self.photo.clone()?,
            transform: self.transform?,
        })
    }

    /// Restore a slot from a stored record.
    pub fn restore(&mut self, record: &SlotRecord) -> Result<(), TransformError> {
        self.photo = Some(record.photo_id.clone());
        self.commit(record.transform).map(|_| ())
    }
}

/// One filled-in template: authored holes plus their slots.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateInstance {
    /// Template canvas width in native pixels
    pub width: u32,
    /// Template canvas height in native pixels
    pub height: u32,
    holes: Vec<Hole>,
    slots: Vec<Slot>,
}

impl TemplateInstance {
    /// Create an instance with one empty slot per hole, ids `slot-<index>`.
    pub fn new(width: u32, height: u32, holes: Vec<Hole>) -> Self {
        let slots = (0..holes.len())
            .map(|i| Slot::new(SlotId(format!("slot-{i}")), i))
            .collect();
        Self {
            width,
            height,
            holes,
            slots,
        }
    }

    pub fn holes(&self) -> &[Hole] {
        &self.holes
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn hole(&self, index: usize) -> Option<&Hole> {
        self.holes.get(index)
    }

    pub fn slot_for_hole(&self, hole_index: usize) -> Option<&Slot> {
        self.slots.iter().find(|s| s.hole_index == hole_index)
    }

    pub fn slot_for_hole_mut(&mut self, hole_index: usize) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.hole_index == hole_index)
    }

    pub fn slot_mut(&mut self, id: &SlotId) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| &s.id == id)
    }

    /// Assign a photo to the slot of `hole_index`. Returns `false` for an
    /// unknown hole.
    pub fn assign(&mut self, hole_index: usize, photo: PhotoId) -> bool {
        match self.slot_for_hole_mut(hole_index) {
            Some(slot) => {
                slot.assign(photo);
                true
            }
            None => false,
        }
    }

    /// Same template at `factor` times the native resolution.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            width: (self.width as f64 * factor).round() as u32,
            height: (self.height as f64 * factor).round() as u32,
            holes: self.holes.iter().map(|h| h.scaled(factor)).collect(),
            slots: self.slots.clone(),
        }
    }
}
