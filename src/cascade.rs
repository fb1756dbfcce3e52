//! Cascaded linear-regression training and inference.
//!
//! Training follows the supervised descent scheme: at every stage the
//! descriptor engine is evaluated at each sample's *current* landmark
//! estimate, a regularized linear model is fitted from those descriptors to
//! the remaining coordinate error, and the learned correction is applied
//! before the next stage. Stages are strictly sequential; each one corrects
//! the estimate the previous stage produced.

use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hog::{compute_descriptors, HogConfig};
use crate::image::ImageAccess;
use crate::regression::{RegressionSolver, RegressorStage};
use crate::types::Shape;

/// One image paired with its ground-truth landmarks.
#[derive(Debug, Clone)]
pub struct TrainingSample<I> {
    pub image: I,
    pub landmarks: Shape,
}

impl<I> TrainingSample<I> {
    pub fn new(image: I, landmarks: Shape) -> Self {
        Self { image, landmarks }
    }
}

/// Cascade training parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of regression stages to train.
    pub stage_count: usize,
    /// Sparsity strength handed to the regression solver.
    pub l1_penalty: f64,
    /// Descriptor engine configuration shared by every stage.
    pub hog: HogConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            stage_count: 5,
            l1_penalty: 0.1,
            hog: HogConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stage_count == 0 {
            return Err(Error::Config("stage_count must be positive".into()));
        }
        if !self.l1_penalty.is_finite() || self.l1_penalty < 0.0 {
            return Err(Error::Config(format!(
                "l1_penalty must be finite and non-negative, got {}",
                self.l1_penalty
            )));
        }
        self.hog.validate()
    }
}

/// An ordered sequence of fitted regression stages, together with the
/// descriptor configuration and landmark count it was trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cascade {
    stages: Vec<RegressorStage>,
    hog: HogConfig,
    num_landmarks: usize,
}

impl Cascade {
    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn stages(&self) -> &[RegressorStage] {
        &self.stages
    }

    pub fn num_landmarks(&self) -> usize {
        self.num_landmarks
    }

    pub fn hog_config(&self) -> &HogConfig {
        &self.hog
    }

    /// Refine an initial landmark estimate by applying every stage in order,
    /// recomputing the descriptor at the current estimate before each stage.
    pub fn refine<I: ImageAccess>(&self, image: &I, initial: &Shape) -> Result<Shape> {
        if initial.num_landmarks() != self.num_landmarks {
            return Err(Error::Shape(format!(
                "initial estimate has {} landmarks but the cascade was trained with {}",
                initial.num_landmarks(),
                self.num_landmarks
            )));
        }

        let mut current = initial.clone();
        for stage in &self.stages {
            let descriptor = compute_descriptors(image, &current.points, &self.hog)?;
            let correction = stage.apply(descriptor.view())?;
            current.add_delta(&Shape::from_flat_vec(&correction.to_vec()));
        }
        Ok(current)
    }
}

/// Train a cascade, returning only the fitted stages.
pub fn train<I, S>(
    samples: &[TrainingSample<I>],
    initial: &Shape,
    config: &TrainingConfig,
    solver: &S,
) -> Result<Cascade>
where
    I: ImageAccess,
    S: RegressionSolver,
{
    train_with_estimates(samples, initial, config, solver).map(|(cascade, _)| cascade)
}

/// Train a cascade and also return the final per-sample estimates, which are
/// useful for judging convergence on the training set.
pub fn train_with_estimates<I, S>(
    samples: &[TrainingSample<I>],
    initial: &Shape,
    config: &TrainingConfig,
    solver: &S,
) -> Result<(Cascade, Vec<Shape>)>
where
    I: ImageAccess,
    S: RegressionSolver,
{
    config.validate()?;
    if samples.is_empty() {
        return Err(Error::Config("training set is empty".into()));
    }

    let num_landmarks = initial.num_landmarks();
    if num_landmarks == 0 {
        return Err(Error::Shape("initial estimate has no landmarks".into()));
    }
    for (index, sample) in samples.iter().enumerate() {
        if sample.landmarks.num_landmarks() != num_landmarks {
            return Err(Error::Shape(format!(
                "sample {} has {} landmarks but the initial estimate has {}",
                index,
                sample.landmarks.num_landmarks(),
                num_landmarks
            )));
        }
    }

    let descriptor_len = config.hog.descriptor_len(num_landmarks);
    let num_outputs = 2 * num_landmarks;

    // Every sample conditions on the same starting estimate before stage 0.
    let mut estimates = vec![initial.clone(); samples.len()];
    let mut stages = Vec::with_capacity(config.stage_count);

    for stage_index in 0..config.stage_count {
        // Residual targets: ground truth minus current estimate, one row per
        // sample, aligned with the feature matrix below.
        let mut targets = Array2::<f64>::zeros((samples.len(), num_outputs));
        for (row, (sample, estimate)) in samples.iter().zip(&estimates).enumerate() {
            let truth = sample.landmarks.to_flat_vec();
            let current = estimate.to_flat_vec();
            for col in 0..num_outputs {
                targets[[row, col]] = truth[col] - current[col];
            }
        }

        // Descriptors at the current estimates, never the ground truth: the
        // model learns corrections conditioned on the current error regime.
        let mut features = Array2::<f64>::zeros((samples.len(), descriptor_len));
        for (row, (sample, estimate)) in samples.iter().zip(&estimates).enumerate() {
            let descriptor = compute_descriptors(&sample.image, &estimate.points, &config.hog)?;
            debug_assert_eq!(descriptor.len(), descriptor_len);
            features.row_mut(row).assign(&descriptor);
        }

        // A solver error aborts the whole run; later stages would condition
        // on a correction that was never learned.
        let stage = solver.fit(features.view(), targets.view(), config.l1_penalty)?;
        if stage.num_features() != descriptor_len || stage.num_outputs() != num_outputs {
            return Err(Error::Solver(format!(
                "solver returned a {}x{} stage for a {}x{} problem",
                stage.num_features(),
                stage.num_outputs(),
                descriptor_len,
                num_outputs
            )));
        }

        for (row, estimate) in estimates.iter_mut().enumerate() {
            let correction = stage.apply(features.row(row))?;
            estimate.add_delta(&Shape::from_flat_vec(&correction.to_vec()));
        }

        let mean_error: f64 = estimates
            .iter()
            .zip(samples)
            .map(|(estimate, sample)| estimate.mean_squared_error(&sample.landmarks))
            .sum::<f64>()
            / samples.len() as f64;
        debug!(
            "stage {}: mean squared landmark error {:.6}",
            stage_index, mean_error
        );

        stages.push(stage);
    }

    let cascade = Cascade {
        stages,
        hog: config.hog,
        num_landmarks,
    };
    Ok((cascade, estimates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::GrayImage;
    use crate::lasso::LassoSolver;
    use crate::types::Point;

    fn textured_image(seed: u32) -> GrayImage {
        GrayImage::from_fn(20, 20, move |x, y| {
            ((x * (7 + seed) + y * 13 + seed * 31) % 256) as u8
        })
    }

    fn offset_dataset(offset: Point, count: u32) -> (Vec<TrainingSample<GrayImage>>, Shape) {
        let initial = Shape::new(vec![Point::new(8.0, 8.0), Point::new(12.0, 12.0)]);
        let samples = (0..count)
            .map(|seed| {
                let mut truth = initial.clone();
                truth.add_delta(&Shape::new(vec![offset; 2]));
                TrainingSample::new(textured_image(seed), truth)
            })
            .collect();
        (samples, initial)
    }

    #[test]
    fn cascade_has_requested_stage_count() {
        let (samples, initial) = offset_dataset(Point::new(1.0, -0.5), 4);
        let config = TrainingConfig {
            stage_count: 3,
            l1_penalty: 0.0,
            hog: HogConfig::default(),
        };

        let cascade = train(&samples, &initial, &config, &LassoSolver::default()).unwrap();
        assert_eq!(cascade.num_stages(), 3);
        assert_eq!(cascade.num_landmarks(), 2);
    }

    #[test]
    fn constant_offset_is_learned_in_one_stage() {
        let offset = Point::new(1.5, -1.0);
        let (samples, initial) = offset_dataset(offset, 6);
        let config = TrainingConfig {
            stage_count: 2,
            l1_penalty: 0.0,
            hog: HogConfig::default(),
        };

        let (_, estimates) =
            train_with_estimates(&samples, &initial, &config, &LassoSolver::default()).unwrap();

        // The shared offset is fully explained by the intercept, so every
        // estimate lands on its ground truth.
        for (estimate, sample) in estimates.iter().zip(&samples) {
            assert!(estimate.mean_squared_error(&sample.landmarks) < 1e-18);
        }
    }

    #[test]
    fn refine_replays_the_training_trajectory() {
        let (samples, initial) = offset_dataset(Point::new(1.0, 0.5), 5);
        let config = TrainingConfig {
            stage_count: 2,
            l1_penalty: 0.0,
            hog: HogConfig::default(),
        };

        let (cascade, estimates) =
            train_with_estimates(&samples, &initial, &config, &LassoSolver::default()).unwrap();

        for (sample, expected) in samples.iter().zip(&estimates) {
            let refined = cascade.refine(&sample.image, &initial).unwrap();
            for (a, b) in refined.points.iter().zip(&expected.points) {
                assert!((a.x - b.x).abs() < 1e-12);
                assert!((a.y - b.y).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn refine_rejects_wrong_landmark_count() {
        let (samples, initial) = offset_dataset(Point::new(1.0, 0.0), 3);
        let config = TrainingConfig {
            stage_count: 1,
            l1_penalty: 0.0,
            hog: HogConfig::default(),
        };
        let cascade = train(&samples, &initial, &config, &LassoSolver::default()).unwrap();

        let wrong = Shape::new(vec![Point::new(10.0, 10.0)]);
        let err = cascade.refine(&samples[0].image, &wrong).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn rejects_invalid_configuration() {
        let (samples, initial) = offset_dataset(Point::new(1.0, 0.0), 2);
        let solver = LassoSolver::default();

        let zero_stages = TrainingConfig {
            stage_count: 0,
            ..TrainingConfig::default()
        };
        assert!(matches!(
            train(&samples, &initial, &zero_stages, &solver),
            Err(Error::Config(_))
        ));

        let negative_penalty = TrainingConfig {
            l1_penalty: -0.1,
            ..TrainingConfig::default()
        };
        assert!(matches!(
            train(&samples, &initial, &negative_penalty, &solver),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn rejects_empty_training_set() {
        let initial = Shape::new(vec![Point::new(8.0, 8.0)]);
        let samples: Vec<TrainingSample<GrayImage>> = Vec::new();
        let err = train(
            &samples,
            &initial,
            &TrainingConfig::default(),
            &LassoSolver::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_mismatched_landmark_counts() {
        let (mut samples, initial) = offset_dataset(Point::new(1.0, 0.0), 3);
        samples[1].landmarks = Shape::new(vec![Point::new(9.0, 9.0)]);

        let err = train(
            &samples,
            &initial,
            &TrainingConfig::default(),
            &LassoSolver::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn estimate_near_the_edge_surfaces_bounds_error() {
        let (samples, _) = offset_dataset(Point::new(1.0, 0.0), 3);
        let initial = Shape::new(vec![Point::new(1.0, 8.0), Point::new(12.0, 12.0)]);

        let err = train(
            &samples,
            &initial,
            &TrainingConfig::default(),
            &LassoSolver::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { .. }));
    }
}
