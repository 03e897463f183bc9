//! 9-point calibration.
//!
//! The caller walks a 3×3 target grid, collecting a dwell window of raw
//! gaze estimates per target; each committed target becomes one
//! `CalibrationPoint` from the mean of its samples. The run yields an
//! accuracy scalar and, when enough targets were valid, a polynomial
//! correction model (ridge regression) applied to raw estimates before
//! segmentation. Collection is caller-clocked and cancellable: aborting
//! discards all partial state for the in-progress target.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CalibrationConfig, ScreenDescriptor};
use crate::constants::CALIBRATION_TARGET_COUNT;
use crate::geometry::{centroid_2d, Point2D};
use crate::types::CalibrationPoint;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("no target collection in progress")]
    NoActiveTarget,
    #[error("target collection already in progress")]
    TargetInProgress,
    #[error("all {0} targets already collected")]
    RunComplete(usize),
    #[error("calibration run incomplete: {collected} of {expected} targets committed")]
    Incomplete { collected: usize, expected: usize },
    #[error("not enough valid calibration points: {got} < {required}")]
    NotEnoughPoints { got: usize, required: usize },
}

/// The 3×3 target grid in reading order, as normalized screen fractions.
pub fn target_grid(margin: f64) -> [Point2D; CALIBRATION_TARGET_COUNT] {
    let lo = margin;
    let hi = 1.0 - margin;
    [
        Point2D::new(lo, lo),
        Point2D::new(0.5, lo),
        Point2D::new(hi, lo),
        Point2D::new(lo, 0.5),
        Point2D::new(0.5, 0.5),
        Point2D::new(hi, 0.5),
        Point2D::new(lo, hi),
        Point2D::new(0.5, hi),
        Point2D::new(hi, hi),
    ]
}

/// Result of a completed run: the valid points, the accuracy scalar and
/// the correction model when trainable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationOutcome {
    pub points: Vec<CalibrationPoint>,
    /// 1.0 at zero average error, 0.0 at the configured pixel floor
    pub accuracy: f64,
    pub model: Option<CalibrationModel>,
}

/// State machine for one calibration run.
#[derive(Debug)]
pub struct CalibrationRun {
    config: CalibrationConfig,
    screen: ScreenDescriptor,
    targets: [Point2D; CALIBRATION_TARGET_COUNT],
    committed: Vec<CalibrationPoint>,
    next_target: usize,
    samples: Vec<Point2D>,
    collecting: bool,
}

impl CalibrationRun {
    pub fn new(screen: ScreenDescriptor, config: CalibrationConfig) -> Self {
        Self {
            targets: target_grid(config.grid_margin),
            config,
            screen,
            committed: Vec::new(),
            next_target: 0,
            samples: Vec::new(),
            collecting: false,
        }
    }

    pub fn targets(&self) -> &[Point2D; CALIBRATION_TARGET_COUNT] {
        &self.targets
    }

    /// Target the user should be looking at next, `None` once all nine are
    /// committed.
    pub fn current_target(&self) -> Option<Point2D> {
        self.targets.get(self.next_target).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.next_target >= self.targets.len()
    }

    /// Open the dwell window for the current target.
    pub fn begin_target(&mut self) -> Result<Point2D, CalibrationError> {
        if self.collecting {
            return Err(CalibrationError::TargetInProgress);
        }
        let target = self
            .current_target()
            .ok_or(CalibrationError::RunComplete(self.targets.len()))?;
        self.collecting = true;
        self.samples.clear();
        Ok(target)
    }

    /// Raw gaze estimate observed while the dwell window is open.
    pub fn push_sample(&mut self, raw_gaze: Point2D) -> Result<(), CalibrationError> {
        if !self.collecting {
            return Err(CalibrationError::NoActiveTarget);
        }
        self.samples.push(raw_gaze);
        Ok(())
    }

    /// Close the dwell window. A target that collected zero samples is
    /// invalid: it produces no calibration point and is excluded from the
    /// accuracy mean instead of propagating an undefined value.
    pub fn commit_target(
        &mut self,
        timestamp: f64,
    ) -> Result<Option<CalibrationPoint>, CalibrationError> {
        if !self.collecting {
            return Err(CalibrationError::NoActiveTarget);
        }
        let target = self
            .current_target()
            .ok_or(CalibrationError::RunComplete(self.targets.len()))?;

        self.collecting = false;
        let point = match centroid_2d(&self.samples) {
            Some(mean_gaze) => {
                let point = CalibrationPoint {
                    screen_x: target.x * self.screen.width_px as f64,
                    screen_y: target.y * self.screen.height_px as f64,
                    gaze_x: mean_gaze.x * self.screen.width_px as f64,
                    gaze_y: mean_gaze.y * self.screen.height_px as f64,
                    timestamp,
                };
                self.committed.push(point);
                Some(point)
            }
            None => {
                tracing::warn!(
                    target_index = self.next_target,
                    "calibration target collected zero samples, excluding from accuracy"
                );
                None
            }
        };
        self.samples.clear();
        self.next_target += 1;
        Ok(point)
    }

    /// Discard all partial state for the in-progress target. The target
    /// stays current and can be collected again.
    pub fn abort_target(&mut self) {
        self.collecting = false;
        self.samples.clear();
    }

    /// Finish the run: accuracy over the valid points plus the correction
    /// model when enough points were collected.
    pub fn finish(self) -> Result<CalibrationOutcome, CalibrationError> {
        if !self.is_complete() {
            return Err(CalibrationError::Incomplete {
                collected: self.next_target,
                expected: self.targets.len(),
            });
        }

        let accuracy = accuracy_score(&self.committed, self.config.error_floor_px);
        let model = match CalibrationModel::train(&self.committed, &self.screen, &self.config) {
            Ok(model) => Some(model),
            Err(CalibrationError::NotEnoughPoints { got, required }) => {
                tracing::warn!(got, required, "skipping correction model, too few valid points");
                None
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            valid_points = self.committed.len(),
            accuracy,
            has_model = model.is_some(),
            "calibration run finished"
        );

        Ok(CalibrationOutcome {
            points: self.committed,
            accuracy,
            model,
        })
    }
}

/// `clamp(1 − avg_error/floor, 0, 1)`, rounded to two decimals. Zero valid
/// points score 0.0.
pub fn accuracy_score(points: &[CalibrationPoint], error_floor_px: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }

    let total_error: f64 = points
        .iter()
        .map(|p| {
            let dx = p.screen_x - p.gaze_x;
            let dy = p.screen_y - p.gaze_y;
            (dx * dx + dy * dy).sqrt()
        })
        .sum();
    let avg_error = total_error / points.len() as f64;

    let accuracy = (1.0 - avg_error / error_floor_px).clamp(0.0, 1.0);
    (accuracy * 100.0).round() / 100.0
}

/// Per-axis polynomial correction fitted with ridge regression. Works in
/// normalized screen coordinates so it applies directly to raw estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationModel {
    coefficients_x: Vec<f64>,
    coefficients_y: Vec<f64>,
    order: u8,
}

impl CalibrationModel {
    pub fn train(
        points: &[CalibrationPoint],
        screen: &ScreenDescriptor,
        config: &CalibrationConfig,
    ) -> Result<Self, CalibrationError> {
        if points.len() < config.min_model_points {
            return Err(CalibrationError::NotEnoughPoints {
                got: points.len(),
                required: config.min_model_points,
            });
        }

        let width = screen.width_px as f64;
        let height = screen.height_px as f64;

        let features: Vec<Vec<f64>> = points
            .iter()
            .map(|p| polynomial_features(p.gaze_x / width, p.gaze_y / height, config.model_order))
            .collect();
        let targets_x: Vec<f64> = points.iter().map(|p| p.screen_x / width).collect();
        let targets_y: Vec<f64> = points.iter().map(|p| p.screen_y / height).collect();

        let coefficients_x = ridge_regression(&features, &targets_x, config.ridge_lambda);
        let coefficients_y = ridge_regression(&features, &targets_y, config.ridge_lambda);

        tracing::debug!(
            order = config.model_order,
            features = features[0].len(),
            points = points.len(),
            "calibration model trained"
        );

        Ok(Self {
            coefficients_x,
            coefficients_y,
            order: config.model_order,
        })
    }

    /// Correct a raw normalized gaze point, clamped to [0,1]².
    pub fn apply(&self, raw: Point2D) -> Point2D {
        let features = polynomial_features(raw.x, raw.y, self.order);
        let x: f64 = features
            .iter()
            .zip(&self.coefficients_x)
            .map(|(f, c)| f * c)
            .sum();
        let y: f64 = features
            .iter()
            .zip(&self.coefficients_y)
            .map(|(f, c)| f * c)
            .sum();
        Point2D::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0))
    }
}

/// Order 1: `[1, x, y]` (affine). Order 2 adds the quadratic terms.
fn polynomial_features(x: f64, y: f64, order: u8) -> Vec<f64> {
    if order <= 1 {
        vec![1.0, x, y]
    } else {
        vec![1.0, x, y, x * x, y * y, x * y]
    }
}

/// Solve `(XᵀX + λI) β = Xᵀy`.
fn ridge_regression(features: &[Vec<f64>], targets: &[f64], lambda: f64) -> Vec<f64> {
    let n = features.len();
    let m = features[0].len();

    let mut xtx = vec![vec![0.0; m]; m];
    for (i, row_i) in xtx.iter_mut().enumerate() {
        for (j, cell) in row_i.iter_mut().enumerate() {
            *cell = (0..n).map(|k| features[k][i] * features[k][j]).sum();
        }
        row_i[i] += lambda;
    }

    let mut xty = vec![0.0; m];
    for (i, cell) in xty.iter_mut().enumerate() {
        *cell = (0..n).map(|k| features[k][i] * targets[k]).sum();
    }

    gaussian_elimination(xtx, xty)
}

/// Gaussian elimination with partial pivoting. Singular pivots yield zero
/// coefficients instead of failing; regularization makes them rare.
fn gaussian_elimination(matrix: Vec<Vec<f64>>, rhs: Vec<f64>) -> Vec<f64> {
    let n = matrix.len();
    let mut augmented: Vec<Vec<f64>> = matrix
        .into_iter()
        .zip(rhs)
        .map(|(mut row, b)| {
            row.push(b);
            row
        })
        .collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| {
                augmented[a][col]
                    .abs()
                    .partial_cmp(&augmented[b][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        augmented.swap(col, pivot_row);

        if augmented[col][col].abs() < 1e-10 {
            continue;
        }

        for row in col + 1..n {
            let factor = augmented[row][col] / augmented[col][col];
            for j in col..=n {
                augmented[row][j] -= factor * augmented[col][j];
            }
        }
    }

    let mut solution = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = augmented[i][n];
        for j in i + 1..n {
            sum -= augmented[i][j] * solution[j];
        }
        solution[i] = if augmented[i][i].abs() < 1e-10 {
            0.0
        } else {
            sum / augmented[i][i]
        };
    }

    solution
}
