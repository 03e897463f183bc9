use serde::{Deserialize, Serialize};

use crate::constants::{
    CALIBRATION_DWELL_MS, CALIBRATION_ERROR_FLOOR_PX, DEFAULT_FIXATION_THRESHOLD,
    DEFAULT_MIN_FIXATION_DURATION_MS, DEFAULT_SCREEN_DPI, DEFAULT_VIEWING_DISTANCE_MM,
    IRIS_DEPTH_OFFSET, MIN_IRIS_LANDMARKS,
};

/// Immutable capability descriptor resolved once before a session starts.
/// Device probing (camera negotiation, quality tiering) happens outside the
/// pipeline; the result is passed in here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenDescriptor {
    pub width_px: u32,
    pub height_px: u32,
    pub viewing_distance_mm: f64,
    #[serde(default = "default_dpi")]
    pub dpi: f64,
}

fn default_dpi() -> f64 {
    DEFAULT_SCREEN_DPI
}

impl Default for ScreenDescriptor {
    fn default() -> Self {
        Self {
            width_px: 1920,
            height_px: 1080,
            viewing_distance_mm: DEFAULT_VIEWING_DISTANCE_MM,
            dpi: DEFAULT_SCREEN_DPI,
        }
    }
}

/// Camera capability negotiated by the capture layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureCapability {
    pub camera_width_px: u32,
    pub camera_height_px: u32,
    pub nominal_fps: f64,
}

impl Default for CaptureCapability {
    fn default() -> Self {
        Self {
            camera_width_px: 1280,
            camera_height_px: 720,
            nominal_fps: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatorConfig {
    /// Depth added to the eye-center z to place the iris center
    pub iris_depth_offset: f64,
    pub min_iris_landmarks: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            iris_depth_offset: IRIS_DEPTH_OFFSET,
            min_iris_landmarks: MIN_IRIS_LANDMARKS,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmenterConfig {
    /// Dispersion threshold as a fraction of the normalized screen
    pub fixation_threshold: f64,
    pub min_fixation_duration_ms: f64,
    /// Completed fixations/saccades kept in session buffers. `None` retains
    /// the full history; bounding is an explicit choice, never an implicit
    /// cap inside the algorithm.
    #[serde(default)]
    pub history_retention: Option<usize>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            fixation_threshold: DEFAULT_FIXATION_THRESHOLD,
            min_fixation_duration_ms: DEFAULT_MIN_FIXATION_DURATION_MS,
            history_retention: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    pub pupil_weight: f64,
    pub fixation_weight: f64,
    pub regression_weight: f64,
    pub blink_weight: f64,
    /// Gap between fixations counted as a blink (ms)
    pub blink_gap_ms: f64,
    pub normal_blink_rate_min: f64,
    pub normal_blink_rate_max: f64,
    /// Max |Δy| for two fixations to count as the same visual row
    pub regression_row_epsilon: f64,
    /// Regressions per 100 fixations at which the regression sub-score hits 0
    pub regression_rate_scale: f64,
    /// Pupil std-dev at which the pupil sub-score hits 0
    pub pupil_variability_scale: f64,
    pub optimal_fixation_min_ms: f64,
    pub optimal_fixation_max_ms: f64,
    #[serde(default = "default_focus_area_factor")]
    pub focus_area_duration_factor: f64,
}

fn default_focus_area_factor() -> f64 {
    1.5
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pupil_weight: 0.3,
            fixation_weight: 0.3,
            regression_weight: 0.2,
            blink_weight: 0.2,
            blink_gap_ms: crate::constants::BLINK_GAP_MS,
            normal_blink_rate_min: 15.0,
            normal_blink_rate_max: 30.0,
            regression_row_epsilon: 0.1,
            regression_rate_scale: 20.0,
            pupil_variability_scale: 2.0,
            optimal_fixation_min_ms: 200.0,
            optimal_fixation_max_ms: 300.0,
            focus_area_duration_factor: 1.5,
        }
    }
}

/// Thresholds for the comprehension-issue assessment over recorded line
/// transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensionConfig {
    pub regression_rate_threshold: f64,
    pub skip_rate_threshold: f64,
    pub deviation_rate_threshold: f64,
    pub min_transition_accuracy: f64,
    pub issue_flag_threshold: f64,
}

impl Default for ComprehensionConfig {
    fn default() -> Self {
        Self {
            regression_rate_threshold: 0.20,
            skip_rate_threshold: 0.15,
            deviation_rate_threshold: 0.10,
            min_transition_accuracy: 0.60,
            issue_flag_threshold: 0.30,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationConfig {
    /// Average pixel error at which accuracy bottoms out at 0.0
    pub error_floor_px: f64,
    /// Nominal dwell per target (ms); collection is caller-clocked
    pub dwell_ms: f64,
    /// Target grid margin from the screen edges (fraction)
    pub grid_margin: f64,
    /// Polynomial order of the correction model (1 = affine, 2 = quadratic)
    pub model_order: u8,
    /// L2 regularization strength for ridge regression
    pub ridge_lambda: f64,
    /// Valid calibration points required before a model can be trained
    #[serde(default = "default_min_model_points")]
    pub min_model_points: usize,
}

fn default_min_model_points() -> usize {
    5
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            error_floor_px: CALIBRATION_ERROR_FLOOR_PX,
            dwell_ms: CALIBRATION_DWELL_MS,
            grid_margin: 0.1,
            model_order: 2,
            ridge_lambda: 0.01,
            min_model_points: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GazeConfig {
    pub screen: ScreenDescriptor,
    #[serde(default)]
    pub capture: CaptureCapability,
    pub estimator: EstimatorConfig,
    pub segmenter: SegmenterConfig,
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub comprehension: ComprehensionConfig,
    pub calibration: CalibrationConfig,
}

impl GazeConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.screen.width_px == 0 || self.screen.height_px == 0 {
            return Err("screen dimensions must be > 0".to_string());
        }
        if self.screen.viewing_distance_mm <= 0.0 {
            return Err("screen.viewing_distance_mm must be > 0".to_string());
        }
        if self.screen.dpi <= 0.0 {
            return Err("screen.dpi must be > 0".to_string());
        }
        if self.capture.nominal_fps <= 0.0 {
            return Err("capture.nominal_fps must be > 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.segmenter.fixation_threshold)
            || self.segmenter.fixation_threshold == 0.0
        {
            return Err("segmenter.fixation_threshold must be in (0,1]".to_string());
        }
        if self.segmenter.min_fixation_duration_ms <= 0.0 {
            return Err("segmenter.min_fixation_duration_ms must be > 0".to_string());
        }
        if self.segmenter.history_retention == Some(0) {
            return Err("segmenter.history_retention must be > 0 when set".to_string());
        }

        if self.estimator.min_iris_landmarks == 0 {
            return Err("estimator.min_iris_landmarks must be > 0".to_string());
        }

        let s = &self.scoring;
        for (name, w) in [
            ("pupil_weight", s.pupil_weight),
            ("fixation_weight", s.fixation_weight),
            ("regression_weight", s.regression_weight),
            ("blink_weight", s.blink_weight),
        ] {
            if !(0.0..=1.0).contains(&w) {
                return Err(format!("scoring.{name} must be in [0,1]"));
            }
        }
        let weight_sum = s.pupil_weight + s.fixation_weight + s.regression_weight + s.blink_weight;
        if (weight_sum - 1.0).abs() > 0.01 {
            return Err(format!(
                "scoring weights should sum to ~1.0 (got {weight_sum:.3})"
            ));
        }
        if s.blink_gap_ms <= 0.0 {
            return Err("scoring.blink_gap_ms must be > 0".to_string());
        }
        if s.normal_blink_rate_min >= s.normal_blink_rate_max {
            return Err("scoring.normal_blink_rate_min must be < max".to_string());
        }
        if s.regression_rate_scale <= 0.0 || s.pupil_variability_scale <= 0.0 {
            return Err("scoring scales must be > 0".to_string());
        }
        if s.optimal_fixation_min_ms >= s.optimal_fixation_max_ms {
            return Err("scoring.optimal_fixation_min_ms must be < max".to_string());
        }
        if s.focus_area_duration_factor < 1.0 {
            return Err("scoring.focus_area_duration_factor must be >= 1".to_string());
        }

        let c = &self.comprehension;
        for (name, v) in [
            ("regression_rate_threshold", c.regression_rate_threshold),
            ("skip_rate_threshold", c.skip_rate_threshold),
            ("deviation_rate_threshold", c.deviation_rate_threshold),
            ("min_transition_accuracy", c.min_transition_accuracy),
            ("issue_flag_threshold", c.issue_flag_threshold),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(format!("comprehension.{name} must be in [0,1]"));
            }
        }

        if self.calibration.error_floor_px <= 0.0 {
            return Err("calibration.error_floor_px must be > 0".to_string());
        }
        if self.calibration.dwell_ms <= 0.0 {
            return Err("calibration.dwell_ms must be > 0".to_string());
        }
        if !(0.0..0.5).contains(&self.calibration.grid_margin) {
            return Err("calibration.grid_margin must be in [0,0.5)".to_string());
        }
        if !(1..=2).contains(&self.calibration.model_order) {
            return Err("calibration.model_order must be 1 or 2".to_string());
        }
        if self.calibration.ridge_lambda <= 0.0 {
            return Err("calibration.ridge_lambda must be > 0".to_string());
        }
        if self.calibration.min_model_points < 3 {
            return Err("calibration.min_model_points must be >= 3".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = GazeConfig::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = GazeConfig::default();
        cfg.segmenter.fixation_threshold = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = GazeConfig::default();
        cfg.scoring.pupil_weight = 0.9;
        assert!(cfg.validate().is_err());

        let mut cfg = GazeConfig::default();
        cfg.calibration.model_order = 3;
        assert!(cfg.validate().is_err());
    }
}
