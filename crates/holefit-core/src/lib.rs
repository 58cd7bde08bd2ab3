//! Holefit Core - photo placement for template holes
//!
//! This crate holds the geometry behind placing photos into the fixed
//! holes of a print template:
//!
//! - the normalized [`Transform`] model and its projection into a hole
//! - gesture sessions (pan, pinch, wheel) that edit a transform
//! - the auto-snap finalizer that closes gaps once a gesture ends
//! - the fidelity rasterizer that redraws every slot at print resolution
//!
//! Nothing here touches the DOM. Live layout comes in through
//! [`GeometryProvider`], photo bytes through [`PhotoSource`].

pub mod config;
pub mod decode;
pub mod editor;
pub mod encode;
pub mod finalize;
pub mod geometry;
pub mod manipulation;
pub mod raster;
pub mod slot;
pub mod source;
pub mod transform;

pub use config::{FinalizerConfig, HolefitConfig, ManipulationConfig, RasterConfig};
pub use editor::{EditorError, FrameOutcome, SlotEditor};
pub use finalize::{
    decide, finalize_now, Decision, Finalization, FinalizePhase, FinalizePoll, GeometryProvider,
    GeometryUnavailable, LayoutSnapshot, ModelGeometry, Policy, Resolution,
};
pub use geometry::{GapMeasurement, Hole, Rect, Side, Size};
pub use manipulation::{GesturePhase, GestureSession, ManipulationEvent, SessionOutcome, TransformListener};
pub use raster::{composite_template, place, render_template, Placement, RasterError};
pub use slot::{PhotoId, Slot, SlotId, SlotRecord, TemplateInstance};
pub use source::{FallbackSource, PhotoCache, PhotoSource, SourceError, SourceExhausted};
pub use transform::{project, RenderRect, Transform, TransformError};
