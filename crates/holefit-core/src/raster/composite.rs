//! Drawing a whole template.

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::RasterConfig;
use crate::decode::DecodeError;
use crate::geometry::{Hole, Size};
use crate::slot::{PhotoId, SlotId, TemplateInstance};
use crate::source::{FallbackSource, LoadError, PhotoCache, SourceExhausted};
use crate::transform::Transform;

use super::surface::{DrawingSurface, RgbCanvas};
use super::{place, RasterError};

/// Why one slot could not be drawn.
#[derive(Debug, Error)]
pub enum CompositeError {
    #[error(transparent)]
    Source(#[from] SourceExhausted),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("Slot refers to missing hole {0}")]
    MissingHole(usize),
}

impl From<LoadError> for CompositeError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Exhausted(e) => CompositeError::Source(e),
            LoadError::Decode { source, .. } => CompositeError::Decode(source),
        }
    }
}

/// Outcome of a composite run.
#[derive(Debug, Default)]
pub struct CompositeReport {
    /// Slots drawn, in template order
    pub drawn: Vec<SlotId>,
    /// Slots without a photo
    pub empty: Vec<SlotId>,
    pub failed: Vec<(SlotId, CompositeError)>,
}

impl CompositeReport {
    /// True when every assigned slot was drawn.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One slot's state, copied before drawing starts.
struct SlotJob {
    slot: SlotId,
    photo: PhotoId,
    transform: Transform,
    hole_index: usize,
}

async fn draw_slot<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    job: &SlotJob,
    hole: Option<&Hole>,
    cache: &mut PhotoCache,
    source: &FallbackSource,
    config: &RasterConfig,
) -> Result<(), CompositeError> {
    let hole = hole.ok_or(CompositeError::MissingHole(job.hole_index))?;
    let image = cache.load(&job.photo, source).await?;
    let photo = Size::from((image.width, image.height));
    let placement = place(&job.transform, photo, hole)?.in_template(hole);
    surface.draw_image(image, &placement.draw, &placement.clip, config.filter)?;
    Ok(())
}

/// Draw every assigned slot of `template` onto `surface`.
///
/// Slot state is snapshotted up front, so later edits to the template do
/// not affect a running composite. A failing slot is recorded in the report
/// and the remaining slots are still drawn.
#[instrument(skip_all, fields(width = template.width, height = template.height))]
pub async fn composite_template<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    template: &TemplateInstance,
    cache: &mut PhotoCache,
    source: &FallbackSource,
    config: &RasterConfig,
) -> CompositeReport {
    let mut report = CompositeReport::default();
    let mut jobs = Vec::new();
    for slot in template.slots() {
        match (slot.photo(), slot.transform()) {
            (Some(photo), Some(transform)) => jobs.push(SlotJob {
                slot: slot.id().clone(),
                photo: photo.clone(),
                transform,
                hole_index: slot.hole_index(),
            }),
            _ => report.empty.push(slot.id().clone()),
        }
    }

    for job in &jobs {
        let hole = template.hole(job.hole_index);
        match draw_slot(surface, job, hole, cache, source, config).await {
            Ok(()) => {
                debug!(slot = %job.slot, photo = %job.photo, "slot drawn");
                report.drawn.push(job.slot.clone());
            }
            Err(e) => {
                warn!(slot = %job.slot, photo = %job.photo, error = %e, "slot skipped");
                report.failed.push((job.slot.clone(), e));
            }
        }
    }
    report
}

/// Composite `template` onto a fresh canvas of its native size.
///
/// # Errors
///
/// `RasterError::ClipDegenerate` when the template has no area. Per-slot
/// failures are in the report.
pub async fn render_template(
    template: &TemplateInstance,
    cache: &mut PhotoCache,
    source: &FallbackSource,
    config: &RasterConfig,
) -> Result<(RgbCanvas, CompositeReport), RasterError> {
    let mut canvas = RgbCanvas::new(template.width, template.height, config.background)?;
    let report = composite_template(&mut canvas, template, cache, source, config).await;
    Ok((canvas, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{DecodedImage, FilterType};
    use crate::encode::encode_jpeg;
    use crate::source::MemorySource;

    fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn config() -> RasterConfig {
        RasterConfig {
            filter: FilterType::Nearest,
            ..Default::default()
        }
    }

    fn two_hole_template() -> TemplateInstance {
        TemplateInstance::new(
            100,
            50,
            vec![Hole::new(0.0, 0.0, 50.0, 50.0), Hole::new(50.0, 0.0, 50.0, 50.0)],
        )
    }

    #[test]
    fn test_composite_draws_each_slot_in_its_hole() {
        let mut template = two_hole_template();
        template.assign(0, PhotoId::from("red"));
        template.assign(1, PhotoId::from("blue"));
        let source = FallbackSource::new().with_source(
            MemorySource::new("mem")
                .with_photo(PhotoId::from("red"), png_bytes(10, 10, [255, 0, 0]))
                .with_photo(PhotoId::from("blue"), png_bytes(10, 10, [0, 0, 255])),
        );
        let mut cache = PhotoCache::new();

        let (canvas, report) =
            pollster::block_on(render_template(&template, &mut cache, &source, &config())).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.drawn.len(), 2);
        assert_eq!(canvas.pixel(10, 10), Some([255, 0, 0]));
        assert_eq!(canvas.pixel(49, 49), Some([255, 0, 0]));
        assert_eq!(canvas.pixel(50, 0), Some([0, 0, 255]));
        assert_eq!(canvas.pixel(99, 49), Some([0, 0, 255]));
    }

    #[test]
    fn test_composite_failure_does_not_stop_siblings() {
        let mut template = two_hole_template();
        template.assign(0, PhotoId::from("missing"));
        template.assign(1, PhotoId::from("blue"));
        let source = FallbackSource::new().with_source(
            MemorySource::new("mem").with_photo(PhotoId::from("blue"), png_bytes(4, 4, [0, 0, 255])),
        );
        let mut cache = PhotoCache::new();

        let (canvas, report) =
            pollster::block_on(render_template(&template, &mut cache, &source, &config())).unwrap();
        assert!(!report.is_complete());
        assert_eq!(report.drawn, vec![SlotId::from("slot-1")]);
        assert!(matches!(report.failed[0].1, CompositeError::Source(_)));
        // Failed hole keeps the background
        assert_eq!(canvas.pixel(10, 10), Some([255, 255, 255]));
        assert_eq!(canvas.pixel(75, 25), Some([0, 0, 255]));
    }

    #[test]
    fn test_composite_reports_empty_and_undecodable() {
        let mut template = two_hole_template();
        template.assign(0, PhotoId::from("garbage"));
        let source = FallbackSource::new().with_source(
            MemorySource::new("mem").with_photo(PhotoId::from("garbage"), vec![1, 2, 3, 4]),
        );
        let mut cache = PhotoCache::new();

        let (_, report) =
            pollster::block_on(render_template(&template, &mut cache, &source, &config())).unwrap();
        assert_eq!(report.empty, vec![SlotId::from("slot-1")]);
        assert!(matches!(report.failed[0].1, CompositeError::Decode(_)));
    }

    #[test]
    fn test_composite_uses_cached_photo() {
        let mut template = two_hole_template();
        template.assign(0, PhotoId::from("pre"));
        let mut cache = PhotoCache::new();
        cache.insert(
            PhotoId::from("pre"),
            DecodedImage::new(2, 2, vec![0, 255, 0].repeat(4)),
        );
        let mut canvas = RgbCanvas::new(100, 50, [0, 0, 0]).unwrap();
        let report = pollster::block_on(composite_template(
            &mut canvas,
            &template,
            &mut cache,
            &FallbackSource::new(),
            &config(),
        ));
        assert_eq!(report.drawn.len(), 1);
        assert_eq!(canvas.pixel(25, 25), Some([0, 255, 0]));
    }

    #[test]
    fn test_composite_zoomed_slot_stays_inside_hole() {
        let mut template = two_hole_template();
        template.assign(0, PhotoId::from("red"));
        let id = SlotId::from("slot-0");
        template
            .slot_mut(&id)
            .unwrap()
            .commit(Transform::new(3.0, 0.9, 0.5).unwrap())
            .unwrap();
        let jpeg = encode_jpeg(&[250u8, 0, 0].repeat(64), 8, 8, 95).unwrap();
        let source = FallbackSource::new()
            .with_source(MemorySource::new("mem").with_photo(PhotoId::from("red"), jpeg));
        let mut cache = PhotoCache::new();

        let (canvas, report) =
            pollster::block_on(render_template(&template, &mut cache, &source, &config())).unwrap();
        assert!(report.is_complete());
        // Right hole untouched
        assert_eq!(canvas.pixel(60, 25), Some([255, 255, 255]));
    }
}
