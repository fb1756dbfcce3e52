//! # sdm-align
//!
//! Pure Rust face alignment by the Supervised Descent Method (SDM).
//!
//! This crate provides:
//! - **Landmark descriptors**: gradient-histogram (HOG-style) feature vectors
//!   sampled in windows around landmark locations
//! - **Cascade training**: a sequence of L1-regularized linear regressors
//!   that iteratively pull an initial landmark estimate toward ground truth
//! - **Inference**: applying a trained cascade to refine landmark estimates
//!   on new images
//!
//! ## Algorithm Overview
//!
//! 1. Start every training sample from the same initial shape estimate
//! 2. For each cascade stage:
//!    - Compute one descriptor per sample at its *current* estimate
//!    - Fit a sparse linear model from descriptors to the remaining
//!      coordinate error
//!    - Apply the learned correction, producing the estimate the next stage
//!      conditions on
//! 3. Refinement replays the fitted stages in order on new images
//!
//! ## Quick Start
//!
//! ```rust
//! use sdm_align::{
//!     compute_descriptors, train, GrayImage, HogConfig, LassoSolver, Point, Shape,
//!     TrainingConfig, TrainingSample,
//! };
//!
//! // One descriptor for one landmark of a synthetic image.
//! let image = GrayImage::from_fn(32, 32, |x, y| ((x * 7 + y * 3) % 256) as u8);
//! let config = HogConfig::default();
//! let descriptor = compute_descriptors(&image, &[Point::new(16.0, 16.0)], &config).unwrap();
//! assert_eq!(descriptor.len(), config.descriptor_len(1));
//!
//! // Train a small cascade on samples sharing a constant correction.
//! let initial = Shape::new(vec![Point::new(12.0, 12.0), Point::new(20.0, 20.0)]);
//! let samples: Vec<_> = (0..4u32)
//!     .map(|seed| {
//!         let image = GrayImage::from_fn(32, 32, move |x, y| ((x * 5 + y * (seed + 3)) % 256) as u8);
//!         let mut truth = initial.clone();
//!         truth.add_delta(&Shape::new(vec![Point::new(1.0, 0.5); 2]));
//!         TrainingSample::new(image, truth)
//!     })
//!     .collect();
//!
//! let config = TrainingConfig {
//!     stage_count: 2,
//!     l1_penalty: 0.0,
//!     hog: HogConfig::default(),
//! };
//! let cascade = train(&samples, &initial, &config, &LassoSolver::default()).unwrap();
//! assert_eq!(cascade.num_stages(), 2);
//!
//! // Refine a fresh estimate.
//! let refined = cascade.refine(&samples[0].image, &initial).unwrap();
//! assert_eq!(refined.num_landmarks(), 2);
//! ```
//!
//! ## Custom Image Types
//!
//! Implement the [`ImageAccess`] trait for your own image types:
//!
//! ```rust
//! use sdm_align::ImageAccess;
//!
//! struct MyImage { /* ... */ }
//!
//! impl ImageAccess for MyImage {
//!     fn get_pixel(&self, x: i32, y: i32) -> u8 {
//!         // Return grayscale intensity at (x, y)
//!         // Return 0 for out-of-bounds
//!         0
//!     }
//!     fn width(&self) -> u32 { 640 }
//!     fn height(&self) -> u32 { 480 }
//! }
//! ```
//!
//! ## Custom Solvers
//!
//! Training is generic over the [`RegressionSolver`] contract, so the
//! bundled coordinate-descent [`LassoSolver`] can be swapped for any other
//! L1-regularized least-squares implementation.

mod cascade;
mod dataset;
mod error;
mod gradient;
mod hog;
mod image;
mod lasso;
mod regression;
mod types;

pub use cascade::{train, train_with_estimates, Cascade, TrainingConfig, TrainingSample};
pub use dataset::{
    collect_samples, expand_region, rescale_landmarks, GroundTruthSource, ImageSource,
};
pub use error::{Error, Result};
pub use hog::{compute_descriptors, HogConfig};
pub use image::{crop_and_resize, GrayImage, ImageAccess};
pub use lasso::LassoSolver;
pub use regression::{RegressionSolver, RegressorStage};
pub use types::{BoundingBox, Point, Shape};
