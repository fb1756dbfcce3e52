//! Grayscale image access and the face-window crop used to prepare
//! training samples.

use crate::error::{Error, Result};
use crate::types::BoundingBox;

/// Trait for accessing pixel intensities from an image.
///
/// The alignment core only ever reads images through this trait; the caller
/// owns the pixels and is free to back it with any storage.
pub trait ImageAccess {
    /// Get the grayscale intensity at (x, y). Returns 0 for out-of-bounds
    /// pixels. Coordinates are in image space (not normalized).
    fn get_pixel(&self, x: i32, y: i32) -> u8;

    /// Image dimensions.
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// A simple grayscale image buffer implementing ImageAccess.
#[derive(Debug, Clone)]
pub struct GrayImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl GrayImage {
    /// Create an image from a row-major intensity buffer.
    ///
    /// Fails if the buffer length disagrees with `width * height`.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::Shape(format!(
                "buffer of {} bytes cannot hold a {}x{} image ({} expected)",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Create an image from an interleaved buffer with a channel count.
    ///
    /// Only single-channel data is supported; anything else is rejected so
    /// that multi-channel input never silently degrades to garbage.
    pub fn from_interleaved(data: Vec<u8>, width: u32, height: u32, channels: u32) -> Result<Self> {
        if channels != 1 {
            return Err(Error::Shape(format!(
                "only single-channel images are supported, got {} channels",
                channels
            )));
        }
        Self::new(data, width, height)
    }

    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> u8,
    {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }
}

impl ImageAccess for GrayImage {
    fn get_pixel(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.data[(y as u32 * self.width + x as u32) as usize]
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// Sample a pixel with bilinear interpolation for sub-pixel accuracy.
#[inline]
pub(crate) fn sample_bilinear<I: ImageAccess>(image: &I, x: f64, y: f64) -> f64 {
    // Get integer coordinates of the four surrounding pixels
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    // Compute fractional parts
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    // Get the four surrounding pixel values
    let p00 = image.get_pixel(x0, y0) as f64;
    let p10 = image.get_pixel(x1, y0) as f64;
    let p01 = image.get_pixel(x0, y1) as f64;
    let p11 = image.get_pixel(x1, y1) as f64;

    // Bilinear interpolation
    let top = p00 * (1.0 - fx) + p10 * fx;
    let bottom = p01 * (1.0 - fx) + p11 * fx;
    top * (1.0 - fy) + bottom * fy
}

/// Crop `region` out of an image and resize it to `out_width` x `out_height`
/// with bilinear resampling.
///
/// The region must have positive extent and the output dimensions must be
/// non-zero. The region may extend past the image edges; out-of-bounds reads
/// follow the `ImageAccess` zero convention, so callers that want clean crops
/// should clamp the region first (see [`crate::expand_region`]).
pub fn crop_and_resize<I: ImageAccess>(
    image: &I,
    region: &BoundingBox,
    out_width: u32,
    out_height: u32,
) -> Result<GrayImage> {
    if region.width <= 0.0 || region.height <= 0.0 {
        return Err(Error::Shape(format!(
            "crop region must have positive extent, got {}x{}",
            region.width, region.height
        )));
    }
    if out_width == 0 || out_height == 0 {
        return Err(Error::Shape(format!(
            "output size must be non-zero, got {}x{}",
            out_width, out_height
        )));
    }

    let sx = region.width / out_width as f64;
    let sy = region.height / out_height as f64;

    let mut data = Vec::with_capacity((out_width * out_height) as usize);
    for oy in 0..out_height {
        for ox in 0..out_width {
            let src_x = region.x + ox as f64 * sx;
            let src_y = region.y + oy as f64 * sy;
            let v = sample_bilinear(image, src_x, src_y);
            data.push(v.round().clamp(0.0, 255.0) as u8);
        }
    }

    GrayImage::new(data, out_width, out_height)
}
