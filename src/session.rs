//! Session orchestration.
//!
//! Streaming state lives in an explicit per-phase struct owned by an
//! id-keyed registry, so concurrent sessions never share mutable state and
//! lifetime is explicit: created at phase start, mutated per frame,
//! consumed into an immutable report at phase end. Processing is fully
//! synchronous; each frame runs projection → correction → segmentation →
//! line classification before the next is accepted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::calibration::{CalibrationModel, CalibrationOutcome};
use crate::config::GazeConfig;
use crate::estimator::GazeEstimator;
use crate::geometry::Point2D;
use crate::lines::{self, ComprehensionAssessment, LineTransitionMetrics, TextLayout};
use crate::scoring;
use crate::segmenter::FixationSegmenter;
use crate::types::{
    ConcentrationMetrics, FixationPoint, FrameLandmarks, GazePath, GazePoint, LineTransition,
    ReadingPattern, Saccade,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown session: {0}")]
    SessionNotFound(Uuid),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid text layout: {0}")]
    InvalidLayout(String),
}

/// Everything one frame produced. All fields empty means the frame carried
/// no usable estimate and was dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameOutcome {
    pub gaze: Option<GazePoint>,
    pub fixation: Option<FixationPoint>,
    pub saccade: Option<Saccade>,
    pub line_transition: Option<LineTransition>,
}

/// Immutable result of a finalized reading phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub gaze_path: GazePath,
    pub concentration: ConcentrationMetrics,
    pub reading_pattern: ReadingPattern,
    pub line_metrics: LineTransitionMetrics,
    pub comprehension: ComprehensionAssessment,
    pub calibration_accuracy: Option<f64>,
    pub frames_seen: u64,
    pub frames_dropped: u64,
}

/// Mutable state for one reading phase of a test session.
pub struct ReadingSession {
    id: Uuid,
    config: GazeConfig,
    started_at: DateTime<Utc>,
    estimator: GazeEstimator,
    segmenter: FixationSegmenter,
    correction: Option<CalibrationModel>,
    calibration_accuracy: Option<f64>,
    layout: TextLayout,
    path: GazePath,
    last_fixation: Option<FixationPoint>,
    frames_seen: u64,
    frames_dropped: u64,
}

impl ReadingSession {
    fn new(
        id: Uuid,
        config: GazeConfig,
        layout: TextLayout,
        calibration: Option<CalibrationOutcome>,
    ) -> Self {
        let estimator = GazeEstimator::new(&config.screen, config.estimator);
        let segmenter = FixationSegmenter::new(config.segmenter);
        let (correction, calibration_accuracy) = match calibration {
            Some(outcome) => (outcome.model, Some(outcome.accuracy)),
            None => (None, None),
        };

        Self {
            id,
            config,
            started_at: Utc::now(),
            estimator,
            segmenter,
            correction,
            calibration_accuracy,
            layout,
            path: GazePath::default(),
            last_fixation: None,
            frames_seen: 0,
            frames_dropped: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Live estimate of the open fixation, for real-time display only.
    pub fn current_fixation(&self) -> Option<&FixationPoint> {
        self.segmenter.current_fixation()
    }

    /// Process one frame synchronously. Degraded input drops the frame and
    /// degrades score quality; it never fails the session.
    pub fn process_frame(&mut self, frame: &FrameLandmarks) -> FrameOutcome {
        self.frames_seen += 1;

        let Some(mut gaze) = self.estimator.estimate(frame) else {
            self.frames_dropped += 1;
            return FrameOutcome::default();
        };

        if let Some(model) = &self.correction {
            let corrected = model.apply(Point2D::new(gaze.x, gaze.y));
            gaze.x = corrected.x;
            gaze.y = corrected.y;
        }

        let segmented = self.segmenter.push(gaze);
        let mut outcome = FrameOutcome {
            gaze: Some(gaze),
            fixation: segmented.fixation,
            saccade: segmented.saccade,
            line_transition: None,
        };

        if let Some(fixation) = segmented.fixation {
            if let Some(previous) = self.last_fixation {
                if let Some(transition) =
                    lines::transition_if_line_changed(&previous, &fixation, &self.layout)
                {
                    self.path.line_transitions.push(transition);
                    outcome.line_transition = Some(transition);
                }
            }
            self.last_fixation = Some(fixation);
            self.path.fixations.push(fixation);
            if let Some(saccade) = segmented.saccade {
                self.path.saccades.push(saccade);
            }
            self.apply_retention();
        }

        outcome
    }

    /// Drop-oldest once the configured retention window is exceeded. With
    /// no window configured the full history is kept.
    fn apply_retention(&mut self) {
        let Some(limit) = self.config.segmenter.history_retention else {
            return;
        };
        if self.path.fixations.len() > limit {
            let excess = self.path.fixations.len() - limit;
            self.path.fixations.drain(..excess);
        }
        if self.path.saccades.len() > limit {
            let excess = self.path.saccades.len() - limit;
            self.path.saccades.drain(..excess);
        }
    }

    fn finalize(mut self) -> SessionReport {
        if let (Some(first), Some(last)) = (
            self.path.fixations.first().copied(),
            self.path.fixations.last().copied(),
        ) {
            self.path.start_time = first.timestamp;
            self.path.end_time = last.timestamp + last.duration;
            self.path.total_duration = self.path.end_time - self.path.start_time;
        }

        let concentration = scoring::concentration_metrics(&self.path, &self.config.scoring);
        let reading_pattern =
            scoring::reading_pattern(&self.path, &self.layout, &self.config.scoring);
        let line_metrics = lines::transition_metrics(&self.path.line_transitions);
        let comprehension =
            lines::assess_comprehension(&self.path.line_transitions, &self.config.comprehension);

        tracing::info!(
            session_id = %self.id,
            fixations = self.path.fixations.len(),
            saccades = self.path.saccades.len(),
            transitions = self.path.line_transitions.len(),
            frames_seen = self.frames_seen,
            frames_dropped = self.frames_dropped,
            concentration = concentration.concentration_score,
            "session finalized"
        );

        SessionReport {
            session_id: self.id,
            started_at: self.started_at,
            gaze_path: self.path,
            concentration,
            reading_pattern,
            line_metrics,
            comprehension,
            calibration_accuracy: self.calibration_accuracy,
            frames_seen: self.frames_seen,
            frames_dropped: self.frames_dropped,
        }
    }
}

/// Registry of active sessions keyed by id. Each session owns its state;
/// nothing is shared across entries.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<Uuid, ReadingSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate inputs and open a new session for one reading phase.
    pub fn start_session(
        &mut self,
        config: GazeConfig,
        layout: TextLayout,
        calibration: Option<CalibrationOutcome>,
    ) -> Result<Uuid, SessionError> {
        config.validate().map_err(SessionError::InvalidConfig)?;
        layout.validate().map_err(SessionError::InvalidLayout)?;

        let id = Uuid::new_v4();
        let session = ReadingSession::new(id, config, layout, calibration);
        tracing::info!(
            session_id = %id,
            calibrated = session.correction.is_some(),
            "session started"
        );
        self.sessions.insert(id, session);
        Ok(id)
    }

    pub fn process_frame(
        &mut self,
        session_id: Uuid,
        frame: &FrameLandmarks,
    ) -> Result<FrameOutcome, SessionError> {
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionError::SessionNotFound(session_id))?;
        Ok(session.process_frame(frame))
    }

    pub fn current_fixation(
        &self,
        session_id: Uuid,
    ) -> Result<Option<FixationPoint>, SessionError> {
        let session = self
            .sessions
            .get(&session_id)
            .ok_or(SessionError::SessionNotFound(session_id))?;
        Ok(session.current_fixation().copied())
    }

    /// End the reading phase: the session is removed and consumed into its
    /// immutable report.
    pub fn finalize(&mut self, session_id: Uuid) -> Result<SessionReport, SessionError> {
        let session = self
            .sessions
            .remove(&session_id)
            .ok_or(SessionError::SessionNotFound(session_id))?;
        Ok(session.finalize())
    }

    /// Discard a session without producing a report (user abandoned the
    /// phase).
    pub fn discard(&mut self, session_id: Uuid) -> Result<(), SessionError> {
        self.sessions
            .remove(&session_id)
            .map(|_| ())
            .ok_or(SessionError::SessionNotFound(session_id))
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}
