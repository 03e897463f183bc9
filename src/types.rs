//! Record types exchanged with the landmark-detection, test-content and
//! storage collaborators. Timestamps in the frame stream are caller-supplied
//! milliseconds; they are not assumed strictly periodic.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONFIDENCE, DEFAULT_PUPIL_DIAMETER};
use crate::geometry::{Point2D, Point3D};

/// Per-frame observation from the landmark detector.
///
/// `face_landmarks` is the full face-mesh list indexed by the constants in
/// [`crate::constants`]; `left_iris`/`right_iris` carry at least five points
/// per eye when the detector found that iris. Optional fields default
/// instead of failing the frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameLandmarks {
    pub timestamp: f64,
    pub face_landmarks: Vec<Point3D>,
    pub left_iris: Vec<Point2D>,
    pub right_iris: Vec<Point2D>,
    pub pupil_diameter: Option<f64>,
    pub confidence: Option<f64>,
}

impl FrameLandmarks {
    pub fn pupil_diameter_or_default(&self) -> f64 {
        self.pupil_diameter.unwrap_or(DEFAULT_PUPIL_DIAMETER)
    }

    pub fn confidence_or_default(&self) -> f64 {
        self.confidence.unwrap_or(DEFAULT_CONFIDENCE)
    }
}

/// Calibrated, normalized screen-space gaze sample for one frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GazePoint {
    pub x: f64,
    pub y: f64,
    pub timestamp: f64,
    pub pupil_diameter: f64,
    pub confidence: f64,
}

/// A period where gaze dwelled within the dispersion threshold for at least
/// the minimum duration. Position is the centroid of the absorbed samples.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixationPoint {
    pub x: f64,
    pub y: f64,
    pub timestamp: f64,
    pub duration: f64,
    pub pupil_diameter: f64,
    pub confidence: f64,
}

/// Rapid movement connecting two completed fixations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Saccade {
    pub from: FixationPoint,
    pub to: FixationPoint,
    pub duration: f64,
    pub velocity: f64,
    pub amplitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineTransitionType {
    NormalLineBreak,
    Regression,
    Skip,
    Deviation,
}

/// Movement between text lines, recorded only when the line changed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineTransition {
    #[serde(rename = "type")]
    pub transition_type: LineTransitionType,
    pub from_line: u32,
    pub to_line: u32,
    pub lines_skipped: Option<u32>,
    pub timestamp: f64,
}

/// Session-scoped accumulator of everything the segmenter and classifier
/// emitted. Finalized read-only when the reading phase ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GazePath {
    pub fixations: Vec<FixationPoint>,
    pub saccades: Vec<Saccade>,
    pub line_transitions: Vec<LineTransition>,
    pub total_duration: f64,
    pub start_time: f64,
    pub end_time: f64,
}

/// Concentration metrics derived from a finalized gaze path.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcentrationMetrics {
    pub avg_pupil_diameter: f64,
    pub pupil_variability: f64,
    pub avg_fixation_duration: f64,
    pub fixation_stability: f64,
    /// Positional regressions (leftward move on the same visual row).
    /// Distinct from line-index regressions in the transition metrics.
    pub regression_count: u32,
    pub regression_rate: f64,
    pub blink_count: u32,
    pub blink_rate: f64,
    /// Composite score in [0, 100]
    pub concentration_score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRegion {
    pub start: Point2D,
    pub end: Point2D,
}

/// Reading-pattern analysis over a finalized session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPattern {
    pub words_per_minute: f64,
    pub comprehension_estimate: f64,
    pub difficulty_level: f64,
    pub focus_areas: Vec<FixationPoint>,
    pub skipped_regions: Vec<SkippedRegion>,
}

/// One calibration target paired with the mean measured gaze, both in
/// screen pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationPoint {
    pub screen_x: f64,
    pub screen_y: f64,
    pub gaze_x: f64,
    pub gaze_y: f64,
    pub timestamp: f64,
}
