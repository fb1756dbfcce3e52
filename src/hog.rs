//! Gradient-histogram descriptors sampled at landmark locations.
//!
//! For every requested landmark this engine pools gradient magnitudes into
//! orientation-binned spatial cells around the landmark and flattens the
//! block-normalized result into one fixed-length feature vector. Descriptor
//! layout and normalization follow the classic windowed-HOG construction,
//! including its block-sum-squared normalization.

use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::gradient::{box_filter, gradients, intensity_plane, magnitude_orientation};
use crate::image::ImageAccess;
use crate::types::Point;

/// Keeps degenerate (all-zero) blocks finite during normalization.
const BLOCK_NORM_EPS: f64 = 1e-5;

/// Descriptor engine parameters.
///
/// All values are plain counts validated by [`HogConfig::validate`]; the
/// resulting descriptor length is fully determined by this configuration and
/// the number of landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HogConfig {
    /// Number of equal-width angular bins spanning 360 degrees.
    pub orientations: usize,
    /// Spatial pooling window, in pixels; also the box-filter size.
    pub pixels_per_cell: usize,
    /// Half-width of the sampling window around each landmark, in cells.
    pub cells_per_side: usize,
    /// Block size, in cells, for joint normalization.
    pub cells_per_block: usize,
}

impl Default for HogConfig {
    fn default() -> Self {
        Self {
            orientations: 9,
            pixels_per_cell: 3,
            cells_per_side: 1,
            cells_per_block: 1,
        }
    }
}

impl HogConfig {
    pub fn validate(&self) -> Result<()> {
        if self.orientations == 0 {
            return Err(Error::Config("orientations must be positive".into()));
        }
        if self.pixels_per_cell == 0 {
            return Err(Error::Config("pixels_per_cell must be positive".into()));
        }
        if self.cells_per_side == 0 {
            return Err(Error::Config("cells_per_side must be positive".into()));
        }
        if self.cells_per_block == 0 || self.cells_per_block > self.grid_side() {
            return Err(Error::Config(format!(
                "cells_per_block must be in 1..={}, got {}",
                self.grid_side(),
                self.cells_per_block
            )));
        }
        Ok(())
    }

    /// Side of the square spatial grid sampled around each landmark.
    pub fn grid_side(&self) -> usize {
        2 * self.cells_per_side
    }

    /// Number of overlapping normalization blocks per grid side.
    pub fn blocks_per_side(&self) -> usize {
        self.grid_side() - self.cells_per_block + 1
    }

    /// Pixel radius of the sampling window around a landmark.
    pub fn window_radius(&self) -> usize {
        self.pixels_per_cell * self.cells_per_side
    }

    /// Descriptor length for `num_locations` landmarks.
    pub fn descriptor_len(&self, num_locations: usize) -> usize {
        num_locations
            * self.blocks_per_side()
            * self.blocks_per_side()
            * self.cells_per_block
            * self.cells_per_block
            * self.orientations
    }
}

/// Compute one flat descriptor covering all `locations` of an image.
///
/// Pure and deterministic: identical inputs produce bit-identical output.
/// Every location must keep its full sampling window (radius
/// `pixels_per_cell * cells_per_side`) inside the image; the engine rejects
/// violations instead of clipping.
pub fn compute_descriptors<I: ImageAccess>(
    image: &I,
    locations: &[Point],
    config: &HogConfig,
) -> Result<Array1<f64>> {
    config.validate()?;

    let width = image.width();
    let height = image.height();
    if width == 0 || height == 0 {
        return Err(Error::Shape(format!(
            "cannot compute descriptors on an empty {}x{} image",
            width, height
        )));
    }

    let plane = intensity_plane(image);
    let (gx, gy) = gradients(&plane);
    let (magnitude, orientation) = magnitude_orientation(&gx, &gy);

    // The filtered planes depend only on the image and the bin, so they are
    // shared across all locations.
    let bin_width = 360.0 / config.orientations as f64;
    let filtered: Vec<Array2<f64>> = (0..config.orientations)
        .map(|bin| {
            let low = bin_width * bin as f64;
            let high = bin_width * (bin + 1) as f64;
            let masked = Array2::from_shape_fn(magnitude.dim(), |idx| {
                let angle = orientation[idx];
                if angle > low && angle <= high {
                    magnitude[idx]
                } else {
                    0.0
                }
            });
            box_filter(&masked, config.pixels_per_cell)
        })
        .collect();

    let radius = config.window_radius();
    let pc = config.pixels_per_cell;
    let half = pc / 2;
    let grid = config.grid_side();
    let blocks = config.blocks_per_side();
    let cb = config.cells_per_block;

    let mut out = Vec::with_capacity(config.descriptor_len(locations.len()));
    let mut histogram = Array3::<f64>::zeros((grid, grid, config.orientations));

    for location in locations {
        // Landmarks are real-valued between stages; sampling truncates them
        // to pixel indices.
        let x = location.x.trunc() as i64;
        let y = location.y.trunc() as i64;
        let r = radius as i64;
        if x < r || y < r || x + r >= width as i64 || y + r >= height as i64 {
            return Err(Error::OutOfBounds {
                x,
                y,
                radius,
                width,
                height,
            });
        }

        // Regular grid of filtered samples centered at the landmark, spaced
        // one cell apart.
        let row0 = (y - r) as usize + half;
        let col0 = (x - r) as usize + half;
        for cell_row in 0..grid {
            for cell_col in 0..grid {
                let row = row0 + cell_row * pc;
                let col = col0 + cell_col * pc;
                for (bin, pooled) in filtered.iter().enumerate() {
                    histogram[[cell_row, cell_col, bin]] = pooled[[row, col]];
                }
            }
        }

        // Overlapping blocks stepping one cell at a time, each normalized by
        // the square of its joint sum.
        for block_row in 0..blocks {
            for block_col in 0..blocks {
                let mut sum = 0.0;
                for cell_row in 0..cb {
                    for cell_col in 0..cb {
                        for bin in 0..config.orientations {
                            sum += histogram[[block_row + cell_row, block_col + cell_col, bin]];
                        }
                    }
                }
                let norm = (sum * sum + BLOCK_NORM_EPS).sqrt();
                for cell_row in 0..cb {
                    for cell_col in 0..cb {
                        for bin in 0..config.orientations {
                            out.push(
                                histogram[[block_row + cell_row, block_col + cell_col, bin]]
                                    / norm,
                            );
                        }
                    }
                }
            }
        }
    }

    Ok(Array1::from_vec(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::GrayImage;

    fn ramp_image(width: u32, height: u32) -> GrayImage {
        // Linear intensity ramp along x.
        GrayImage::from_fn(width, height, |x, _| (x * 12).min(255) as u8)
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = HogConfig::default();
        assert_eq!(config.orientations, 9);
        assert_eq!(config.pixels_per_cell, 3);
        assert_eq!(config.cells_per_side, 1);
        assert_eq!(config.cells_per_block, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn descriptor_length_formula() {
        let config = HogConfig::default();
        // blocks_per_side = 2*1 - 1 + 1 = 2, so 2*2*1*1*9 = 36 per landmark.
        assert_eq!(config.descriptor_len(1), 36);
        assert_eq!(config.descriptor_len(68), 68 * 36);

        let config = HogConfig {
            orientations: 9,
            pixels_per_cell: 3,
            cells_per_side: 2,
            cells_per_block: 2,
        };
        // grid 4, blocks 3: 3*3 * 2*2 * 9 = 324 per landmark.
        assert_eq!(config.descriptor_len(1), 324);
    }

    #[test]
    fn config_validation_rejects_bad_values() {
        let mut config = HogConfig::default();
        config.orientations = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = HogConfig::default();
        config.pixels_per_cell = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = HogConfig::default();
        config.cells_per_block = 3; // grid side is only 2
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn descriptors_are_deterministic() {
        let image = ramp_image(24, 24);
        let locations = vec![Point::new(10.0, 10.0), Point::new(14.0, 12.0)];
        let config = HogConfig::default();

        let a = compute_descriptors(&image, &locations, &config).unwrap();
        let b = compute_descriptors(&image, &locations, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn ramp_image_descriptor_end_to_end() {
        let image = ramp_image(20, 20);
        let config = HogConfig {
            orientations: 4,
            pixels_per_cell: 2,
            cells_per_side: 1,
            cells_per_block: 1,
        };
        let descriptor =
            compute_descriptors(&image, &[Point::new(10.0, 10.0)], &config).unwrap();

        assert_eq!(descriptor.len(), 16);
        assert_eq!(descriptor.len(), config.descriptor_len(1));
        for &v in descriptor.iter() {
            assert!(v.is_finite());
            assert!(v >= 0.0);
        }
        // Each single-cell block sums to at most 1 after normalization, and
        // there are 4 blocks.
        let total: f64 = descriptor.sum();
        assert!(total <= 4.0 + 1e-9);
        assert!(total > 0.0);
    }

    #[test]
    fn pure_x_gradient_lands_in_one_orientation_bin() {
        let image = ramp_image(20, 20);
        let config = HogConfig {
            orientations: 4,
            pixels_per_cell: 2,
            cells_per_side: 1,
            cells_per_block: 1,
        };
        let descriptor =
            compute_descriptors(&image, &[Point::new(10.0, 10.0)], &config).unwrap();

        // A ramp along x has orientation exactly 180 degrees everywhere, which
        // falls in bin 1 of four. Bins are the fastest-varying axis.
        for (i, &v) in descriptor.iter().enumerate() {
            if i % 4 == 1 {
                assert!(v > 0.0, "bin 1 should carry the ramp energy at {}", i);
            } else {
                assert_eq!(v, 0.0, "bin {} should be empty at {}", i % 4, i);
            }
        }
    }

    #[test]
    fn locations_concatenate_in_order() {
        let image = ramp_image(30, 30);
        let config = HogConfig::default();
        let a = Point::new(10.0, 10.0);
        let b = Point::new(20.0, 15.0);

        let joint = compute_descriptors(&image, &[a, b], &config).unwrap();
        let first = compute_descriptors(&image, &[a], &config).unwrap();
        let second = compute_descriptors(&image, &[b], &config).unwrap();

        assert_eq!(joint.len(), first.len() + second.len());
        assert_eq!(joint.slice(ndarray::s![..first.len()]), first);
        assert_eq!(joint.slice(ndarray::s![first.len()..]), second);
    }

    #[test]
    fn rejects_windows_near_every_edge() {
        let image = ramp_image(20, 20);
        let config = HogConfig::default(); // radius 3

        for bad in [
            Point::new(2.0, 10.0),  // left
            Point::new(10.0, 2.0),  // top
            Point::new(17.0, 10.0), // right
            Point::new(10.0, 17.0), // bottom
        ] {
            let err = compute_descriptors(&image, &[bad], &config).unwrap_err();
            assert!(matches!(err, Error::OutOfBounds { .. }), "{:?}", bad);
        }

        // Exactly radius away from the edge is still inside.
        assert!(compute_descriptors(&image, &[Point::new(3.0, 3.0)], &config).is_ok());
    }

    #[test]
    fn uniform_image_yields_zero_descriptor() {
        let image = GrayImage::from_fn(20, 20, |_, _| 100);
        let config = HogConfig::default();
        let descriptor =
            compute_descriptors(&image, &[Point::new(10.0, 10.0)], &config).unwrap();

        // No gradients anywhere: every block is degenerate and divides by the
        // epsilon floor, staying exactly zero and finite.
        for &v in descriptor.iter() {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn rejects_empty_image() {
        let image = GrayImage::from_fn(0, 0, |_, _| 0);
        let err = compute_descriptors(&image, &[], &HogConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }
}
