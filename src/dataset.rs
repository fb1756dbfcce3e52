//! Caller-supplied data sources and the face-window preparation pipeline.
//!
//! The alignment core has no notion of file paths or directory layouts;
//! datasets reach it through the two traits below, handing over
//! already-decoded images, ground-truth landmarks, and face boxes keyed by an
//! opaque identifier. [`collect_samples`] turns those into training samples:
//! expand the annotated face box to a square window, crop and resize, and
//! rescale the landmarks into the window's coordinate system.

use crate::cascade::TrainingSample;
use crate::error::{Error, Result};
use crate::image::{crop_and_resize, GrayImage, ImageAccess};
use crate::types::{BoundingBox, Point, Shape};

/// Produces a decoded grayscale image for an opaque identifier.
pub trait ImageSource {
    type Image: ImageAccess;

    fn image(&self, id: &str) -> Result<Self::Image>;
}

/// Produces ground-truth annotations for the same identifiers an
/// [`ImageSource`] understands.
pub trait GroundTruthSource {
    /// True landmark coordinates, in the source image's pixel space.
    fn landmarks(&self, id: &str) -> Result<Shape>;

    /// Annotated face box, in the source image's pixel space.
    fn bounding_box(&self, id: &str) -> Result<BoundingBox>;
}

/// Expand a face box toward a square window, clamped to the image.
///
/// The longer side grows by `expand_rate` at each end; the shorter side is
/// then padded symmetrically to match. Corners are floored to whole pixels.
/// Clamping can leave the result non-square when the box sits near an image
/// border.
pub fn expand_region(
    image_width: u32,
    image_height: u32,
    region: &BoundingBox,
    expand_rate: f64,
) -> Result<BoundingBox> {
    if !expand_rate.is_finite() || expand_rate < 0.0 {
        return Err(Error::Config(format!(
            "expand_rate must be finite and non-negative, got {}",
            expand_rate
        )));
    }
    if region.width <= 0.0 || region.height <= 0.0 {
        return Err(Error::Shape(format!(
            "face box must have positive extent, got {}x{}",
            region.width, region.height
        )));
    }

    let (x0, y0) = (region.x, region.y);
    let (x1, y1) = (region.x + region.width, region.y + region.height);
    let max_x = image_width as f64;
    let max_y = image_height as f64;

    let (nx0, ny0, nx1, ny1) = if region.width >= region.height {
        let delta = expand_rate * region.width;
        let nx0 = (x0 - delta).max(0.0).floor();
        let nx1 = (x1 + delta).min(max_x).floor();
        let pad = ((nx1 - nx0) - region.height) / 2.0;
        let ny0 = (y0 - pad).max(0.0).floor();
        let ny1 = (y1 + pad).min(max_y).floor();
        (nx0, ny0, nx1, ny1)
    } else {
        let delta = expand_rate * region.height;
        let ny0 = (y0 - delta).max(0.0).floor();
        let ny1 = (y1 + delta).min(max_y).floor();
        let pad = ((ny1 - ny0) - region.width) / 2.0;
        let nx0 = (x0 - pad).max(0.0).floor();
        let nx1 = (x1 + pad).min(max_x).floor();
        (nx0, ny0, nx1, ny1)
    };

    Ok(BoundingBox::from_corners(nx0, ny0, nx1, ny1))
}

/// Map landmarks from source-image coordinates into the coordinate system of
/// a `region` crop resized to `out_width` x `out_height`.
pub fn rescale_landmarks(
    shape: &Shape,
    region: &BoundingBox,
    out_width: u32,
    out_height: u32,
) -> Shape {
    debug_assert!(region.width > 0.0 && region.height > 0.0);
    let sx = out_width as f64 / region.width;
    let sy = out_height as f64 / region.height;
    Shape::new(
        shape
            .points
            .iter()
            .map(|p| Point::new((p.x - region.x) * sx, (p.y - region.y) * sy))
            .collect(),
    )
}

/// Assemble training samples for `ids`: for each identifier, expand its face
/// box, crop and resize the image to `face_size`, and rescale the landmarks
/// to match.
pub fn collect_samples<IS, GS, ID>(
    ids: &[ID],
    images: &IS,
    truths: &GS,
    face_size: (u32, u32),
    expand_rate: f64,
) -> Result<Vec<TrainingSample<GrayImage>>>
where
    IS: ImageSource,
    GS: GroundTruthSource,
    ID: AsRef<str>,
{
    let mut samples = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.as_ref();
        let image = images.image(id)?;
        let landmarks = truths.landmarks(id)?;
        let face_box = truths.bounding_box(id)?;

        let window = expand_region(image.width(), image.height(), &face_box, expand_rate)?;
        let cropped = crop_and_resize(&image, &window, face_size.0, face_size.1)?;
        let rescaled = rescale_landmarks(&landmarks, &window, face_size.0, face_size.1);
        samples.push(TrainingSample::new(cropped, rescaled));
    }
    Ok(samples)
}
