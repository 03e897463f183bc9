//! Online fixation/saccade segmentation.
//!
//! Single-pass dispersion classifier: consecutive points closer than the
//! threshold are absorbed into a running centroid; a larger jump closes the
//! candidate, which is emitted as a fixation only if its dwell reached the
//! configured minimum. Saccades connect consecutive completed fixations.

use crate::config::SegmenterConfig;
use crate::geometry::Point2D;
use crate::types::{FixationPoint, GazePoint, Saccade};

/// What one pushed point produced. Both fields are set when a closing
/// fixation also completes a saccade from the previous one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentResult {
    pub fixation: Option<FixationPoint>,
    pub saccade: Option<Saccade>,
}

/// Running centroid accumulator for the current candidate fixation.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    start_timestamp: f64,
    sum_x: f64,
    sum_y: f64,
    count: u32,
}

impl Candidate {
    fn seed(point: &GazePoint) -> Self {
        Self {
            start_timestamp: point.timestamp,
            sum_x: point.x,
            sum_y: point.y,
            count: 1,
        }
    }

    fn absorb(&mut self, point: &GazePoint) {
        self.sum_x += point.x;
        self.sum_y += point.y;
        self.count += 1;
    }

    fn centroid(&self) -> (f64, f64) {
        (self.sum_x / self.count as f64, self.sum_y / self.count as f64)
    }

    fn close(&self, closing: &GazePoint) -> FixationPoint {
        let (x, y) = self.centroid();
        FixationPoint {
            x,
            y,
            timestamp: self.start_timestamp,
            duration: closing.timestamp - self.start_timestamp,
            pupil_diameter: closing.pupil_diameter,
            confidence: closing.confidence,
        }
    }
}

#[derive(Debug)]
pub struct FixationSegmenter {
    config: SegmenterConfig,
    last_point: Option<GazePoint>,
    candidate: Option<Candidate>,
    last_fixation: Option<FixationPoint>,
    current_fixation: Option<FixationPoint>,
}

impl FixationSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            last_point: None,
            candidate: None,
            last_fixation: None,
            current_fixation: None,
        }
    }

    /// Live estimate of the not-yet-closed fixation, for real-time display.
    /// Never part of the emitted history.
    pub fn current_fixation(&self) -> Option<&FixationPoint> {
        self.current_fixation.as_ref()
    }

    /// Feed the next gaze point. Frame loss is tolerated: timestamps only
    /// need to be monotonic, not periodic.
    pub fn push(&mut self, point: GazePoint) -> SegmentResult {
        let mut result = SegmentResult::default();

        let Some(last) = self.last_point else {
            self.last_point = Some(point);
            self.candidate = Some(Candidate::seed(&point));
            return result;
        };

        let distance = Point2D::new(point.x, point.y)
            .distance_to(&Point2D::new(last.x, last.y));

        if distance < self.config.fixation_threshold {
            match self.candidate.as_mut() {
                Some(candidate) => {
                    candidate.absorb(&point);
                    let duration = point.timestamp - candidate.start_timestamp;
                    if duration >= self.config.min_fixation_duration_ms {
                        self.current_fixation = Some(candidate.close(&point));
                    }
                }
                None => self.candidate = Some(Candidate::seed(&point)),
            }
        } else {
            if let Some(candidate) = self.candidate.take() {
                let duration = point.timestamp - candidate.start_timestamp;
                if duration >= self.config.min_fixation_duration_ms {
                    let completed = candidate.close(&point);
                    if let Some(previous) = self.last_fixation {
                        result.saccade = Some(Self::saccade_between(&previous, &completed));
                    }
                    self.last_fixation = Some(completed);
                    result.fixation = Some(completed);
                    tracing::debug!(
                        x = completed.x,
                        y = completed.y,
                        duration_ms = completed.duration,
                        "fixation completed"
                    );
                }
                // Candidates shorter than the minimum are discarded silently.
            }
            self.current_fixation = None;
            self.candidate = Some(Candidate::seed(&point));
        }

        self.last_point = Some(point);
        result
    }

    fn saccade_between(from: &FixationPoint, to: &FixationPoint) -> Saccade {
        let amplitude = Point2D::new(from.x, from.y).distance_to(&Point2D::new(to.x, to.y));
        let duration = to.timestamp - from.timestamp;
        let velocity = if duration > 0.0 {
            amplitude / duration
        } else {
            0.0
        };
        Saccade {
            from: *from,
            to: *to,
            duration,
            velocity,
            amplitude,
        }
    }

    pub fn reset(&mut self) {
        self.last_point = None;
        self.candidate = None;
        self.last_fixation = None;
        self.current_fixation = None;
    }
}
